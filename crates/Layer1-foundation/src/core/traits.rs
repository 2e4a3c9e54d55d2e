//! Core Traits - 핵심 인터페이스 정의
//!
//! Layer2 이상에서 구현/사용하는 추적 대상과 EntitySource 계약을 정의합니다.
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Layer3-Tracker                                             │
//! │  ├── BundleTrackerManager (모듈 시작/정지)                   │
//! │  └── ConfigurationTrackerManager (설정 생성/변경/삭제)       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Layer2-Core                                                │
//! │  ├── LifecycleTracker (Dispatcher)                          │
//! │  ├── StateTable + ObserverRegistry                          │
//! │  └── TaskSupervisor (비동기 콜백)                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Layer1-Foundation (이 레이어)                              │
//! │  ├── TrackedEntity / EntitySource / RawEventListener        │
//! │  └── Error, Config, Logging                                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use crate::event::RawEvent;
use crate::Result;
use parking_lot::Mutex;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

// ============================================================================
// TrackedEntity - 추적 대상
// ============================================================================

/// 외부에서 관리되는 추적 대상 (모듈, 설정 레코드 등)
///
/// 존재 여부는 StateTable 포함 여부로 표현되므로 엔티티 자체는 키와
/// 페이로드만 가집니다.
pub trait TrackedEntity: Clone + fmt::Debug + Send + Sync + 'static {
    /// 엔티티 키
    type Key: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static;

    /// 이 엔티티의 키
    fn key(&self) -> Self::Key;
}

// ============================================================================
// RawEventListener - 원시 이벤트 수신자
// ============================================================================

/// EntitySource가 원시 전이 이벤트를 전달하는 대상
///
/// 소스는 한 번에 하나의 이벤트만 전달해야 합니다.
pub trait RawEventListener<E: TrackedEntity>: Send + Sync {
    fn on_raw_event(&self, event: RawEvent<E>);
}

// ============================================================================
// EntitySource - 외부 협력자
// ============================================================================

/// 현재 엔티티 열거 + 원시 이벤트 스트림 제공자
///
/// 코어는 소스를 읽기만 하며 절대 변경하지 않습니다.
pub trait EntitySource<E: TrackedEntity>: Send + Sync {
    /// 소스 이름 (디버깅용)
    fn name(&self) -> &str;

    /// 현재 존재하는 엔티티 목록 (순서 유지)
    ///
    /// 실패 시 `Error::SourceEnumeration`을 반환합니다.
    fn enumerate_current(&self) -> Result<Vec<E>>;

    /// 원시 이벤트 구독
    fn subscribe(&self, listener: Arc<dyn RawEventListener<E>>) -> Result<SourceSubscription>;
}

// ============================================================================
// SourceSubscription - 구독 핸들
// ============================================================================

type CancelFn = Box<dyn FnOnce() + Send>;

/// EntitySource 구독 핸들
///
/// `cancel()` 또는 drop 시 구독이 해제됩니다. 해제 함수는 한 번만 실행됩니다.
pub struct SourceSubscription {
    source: String,
    on_cancel: Mutex<Option<CancelFn>>,
}

impl SourceSubscription {
    pub fn new(source: impl Into<String>, on_cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            source: source.into(),
            on_cancel: Mutex::new(Some(Box::new(on_cancel))),
        }
    }

    /// 해제할 것이 없는 구독 (정적 소스용)
    pub fn detached(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            on_cancel: Mutex::new(None),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// 구독 해제
    pub fn cancel(&self) {
        let on_cancel = self.on_cancel.lock().take();
        if let Some(on_cancel) = on_cancel {
            tracing::debug!(source = %self.source, "Source subscription cancelled");
            on_cancel();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.on_cancel.lock().is_none()
    }
}

impl fmt::Debug for SourceSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceSubscription")
            .field("source", &self.source)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

impl Drop for SourceSubscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_subscription_cancels_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let sub = SourceSubscription::new("test", move || {
            c.fetch_add(1, Ordering::SeqCst);
        });

        assert!(!sub.is_cancelled());
        sub.cancel();
        sub.cancel();
        assert!(sub.is_cancelled());
        drop(sub);

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_subscription_cancels_on_drop() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        {
            let _sub = SourceSubscription::new("test", move || {
                c.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
