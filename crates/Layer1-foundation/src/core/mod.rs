//! Core Module - 핵심 인터페이스 및 타입
//!
//! ## 타입 계층
//!
//! - `types.rs`: 키/전이 타입 (SubscriberKey, UpdateKind, Direction)
//! - `traits.rs`: 인터페이스 (TrackedEntity, EntitySource, RawEventListener)

pub mod traits;
pub mod types;

// ============================================================================
// Types - 데이터 타입 (types.rs)
// ============================================================================

pub use types::{Direction, SubscriberKey, UpdateKind};

// ============================================================================
// Traits - 인터페이스 (traits.rs)
// ============================================================================

pub use traits::{EntitySource, RawEventListener, SourceSubscription, TrackedEntity};
