//! # Configuration Tracking
//!
//! 설정 레코드의 생성, 변경(속성/위치), 삭제를 추적합니다.

mod admin;
mod manager;
mod source;
mod types;

pub use admin::{ConfigurationAdmin, ConfigurationListener, InMemoryConfigurationAdmin, ListenerId};
pub use manager::{ConfigurationCallback, ConfigurationTrackerManager};
pub use source::ConfigurationSource;
pub use types::{ConfigEventKind, Configuration, ConfigurationEvent, ConfigurationInfo, Properties};
