//! # Bundle Tracking
//!
//! 모듈 프레임워크의 번들 시작/정지를 추적합니다.
//!
//! ```text
//! InMemoryFramework ──BundleEvent──▶ BundleSource ──RawEvent──▶ LifecycleTracker<Bundle>
//!                                                                   │
//!                                        BundleTrackerManager ──────┘
//! ```

mod framework;
mod manager;
mod source;
mod types;

pub use framework::{BundleListener, Framework, InMemoryFramework, ListenerId};
pub use manager::{BundleCallback, BundleTrackerManager};
pub use source::BundleSource;
pub use types::{Bundle, BundleEvent, BundleEventKind, BundleId, BundleState};
