//! # lifecycle-foundation
//!
//! Foundation layer for lifecycle tracking:
//! - Core: 추적 대상/소스 Trait 정의 (TrackedEntity, EntitySource, RawEventListener)
//! - Event: EntitySource가 발행하는 원시 전이 이벤트
//! - Config: TrackerConfig, LogConfig
//! - Storage: JsonStore (설정 파일)
//! - Logging: tracing 구독자 초기화
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  EntitySource (모듈 프레임워크, 설정 관리자)               │
//! │       │ enumerate_current()     │ subscribe()           │
//! │       ▼                         ▼                       │
//! │  LifecycleTracker ◀──── RawEvent (Appeared/Updated/     │
//! │       │                          Disappeared)           │
//! │       ├── StateTable + ObserverRegistry (단일 락)        │
//! │       └── TaskSupervisor (비동기 콜백, 취소)             │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod event;
pub mod logging;
pub mod storage;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Core (핵심 Trait 및 타입)
// ============================================================================
pub use core::{
    // Types (types.rs)
    Direction,
    SubscriberKey,
    UpdateKind,
    // Traits (traits.rs)
    EntitySource,
    RawEventListener,
    SourceSubscription,
    TrackedEntity,
};

// ============================================================================
// Event (원시 이벤트)
// ============================================================================
pub use event::RawEvent;

// ============================================================================
// Config (설정)
// ============================================================================
pub use config::{LogConfig, TrackerConfig, TRACKER_CONFIG_FILE};

// ============================================================================
// Storage / Logging
// ============================================================================
pub use logging::init_logging;
pub use storage::{JsonStore, Scope};
