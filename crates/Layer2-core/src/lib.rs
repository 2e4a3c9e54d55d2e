//! lifecycle-core: Core Runtime for lifecycle tracking
//!
//! Layer2 - 이벤트 디스패치 레이어
//!
//! # 주요 모듈
//!
//! - `tracker`: LifecycleTracker (원시 이벤트 → 콜백 호출)
//! - `state`: StateTable (현재 존재하는 엔티티)
//! - `registry`: ObserverRegistry (구독자 + 열린 엔티티 집합)
//! - `supervisor`: TaskSupervisor (비동기 콜백 실행/취소)
//! - `callback`: 동기/비동기 콜백, 필터
//!
//! # 사용 예시
//!
//! ```ignore
//! use lifecycle_core::{Callback, LifecycleTracker, Subscriber};
//!
//! let tracker = LifecycleTracker::new(TrackerConfig::load()?, source);
//! tracker.start()?;
//!
//! tracker.register(
//!     "indexer",
//!     Subscriber::new(
//!         Callback::sync(|e: &Module| { index(e); Ok(()) }),
//!         Callback::sync(|e: &Module| { unindex(e); Ok(()) }),
//!     )
//!     .with_filter(|e: &Module| e.name.starts_with("app.")),
//! )?;
//!
//! // 종료 시
//! tracker.shutdown().await;
//! ```

pub mod callback;
pub mod registry;
pub mod state;
pub mod subscriber;
pub mod supervisor;
pub mod tracker;

// Re-exports: Callback
pub use callback::{Callback, Filter, TaskFuture, Updated};

// Re-exports: State / Registry
pub use registry::{ObserverRegistry, Registration};
pub use state::StateTable;

// Re-exports: Dispatcher
pub use subscriber::Subscriber;
pub use supervisor::{PendingTask, TaskSupervisor};
pub use tracker::LifecycleTracker;

// Re-exports: Foundation
pub use lifecycle_foundation::{
    Direction, EntitySource, Error, RawEvent, RawEventListener, Result, SourceSubscription,
    SubscriberKey, TrackedEntity, TrackerConfig, UpdateKind,
};

// Re-exports: tokio-util
pub use tokio_util::sync::CancellationToken;
