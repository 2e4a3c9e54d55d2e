//! # lifecycle-tracker
//!
//! lifecycle-core 위에 만든 두 가지 트래커:
//! - `bundle`: 모듈 프레임워크의 번들 시작/정지 (BundleTrackerManager)
//! - `configuration`: 설정 레코드 생성/변경/삭제 (ConfigurationTrackerManager)
//!
//! 각 모듈은 외부 서비스 계약(trait), 이를 EntitySource로 바꾸는 어댑터,
//! 그리고 임베더/테스트용 메모리 구현을 제공합니다.

pub mod bundle;
pub mod configuration;

pub use bundle::{
    Bundle, BundleCallback, BundleEvent, BundleEventKind, BundleId, BundleSource, BundleState,
    BundleTrackerManager, Framework, InMemoryFramework,
};
pub use configuration::{
    ConfigEventKind, Configuration, ConfigurationAdmin, ConfigurationCallback, ConfigurationEvent,
    ConfigurationInfo, ConfigurationSource, ConfigurationTrackerManager,
    InMemoryConfigurationAdmin, Properties,
};

pub use lifecycle_core::{Callback, CancellationToken, Filter, LifecycleTracker};
pub use lifecycle_foundation::{init_logging, Error, Result, TrackerConfig};
