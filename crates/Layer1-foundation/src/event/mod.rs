//! Event System - 원시 전이 이벤트
//!
//! EntitySource → Dispatcher로 흐르는 이벤트를 정의합니다.
//!
//! ```text
//! EntitySource ──RawEvent──▶ RawEventListener (LifecycleTracker)
//!                                 │
//!                                 ├── StateTable 갱신
//!                                 └── 구독자 콜백 (동기 / TaskSupervisor)
//! ```

pub mod types;

pub use types::RawEvent;
