//! Config - 설정 관리
//!
//! - `tracker.rs` - TrackerConfig / LogConfig

mod tracker;

pub use tracker::{LogConfig, TrackerConfig, TRACKER_CONFIG_FILE};
