//! Framework - 번들을 관리하는 외부 모듈 프레임워크
//!
//! `Framework` trait은 트래커가 프레임워크에 요구하는 최소 계약입니다.
//! `InMemoryFramework`는 임베더와 테스트용 구현입니다.

use super::types::{Bundle, BundleEvent, BundleEventKind, BundleId, BundleState};
use chrono::Utc;
use lifecycle_foundation::{Error, Result};
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// 리스너 등록 ID
pub type ListenerId = u64;

/// 번들 이벤트 수신자
pub trait BundleListener: Send + Sync {
    fn bundle_changed(&self, event: &BundleEvent);
}

/// 모듈 프레임워크 계약
pub trait Framework: Send + Sync {
    /// 설치된 모든 번들 (설치 순서)
    fn bundles(&self) -> Result<Vec<Bundle>>;

    fn add_bundle_listener(&self, listener: Arc<dyn BundleListener>) -> ListenerId;

    fn remove_bundle_listener(&self, id: ListenerId);

    /// 프레임워크 자체가 종료 중인지 여부
    fn is_stopping(&self) -> bool {
        false
    }
}

// ============================================================================
// InMemoryFramework
// ============================================================================

/// 메모리 내 모듈 프레임워크
///
/// 상태 변경 메서드는 실제 프레임워크와 같은 순서로 이벤트를 발행합니다.
/// 이벤트는 호출한 스레드에서 동기적으로 전달됩니다.
#[derive(Default)]
pub struct InMemoryFramework {
    bundles: RwLock<BTreeMap<BundleId, Bundle>>,
    listeners: RwLock<Vec<(ListenerId, Arc<dyn BundleListener>)>>,
    next_bundle: AtomicU64,
    next_listener: AtomicU64,
    unavailable: AtomicBool,
    stopping: AtomicBool,
    /// 이벤트 전달 직렬화
    delivery: Mutex<()>,
}

impl InMemoryFramework {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// 번들 설치 - `INSTALLED` 이벤트 발행
    pub fn install(&self, symbolic_name: impl Into<String>, version: impl Into<String>) -> BundleId {
        self.install_with_headers(symbolic_name, version, BTreeMap::new())
    }

    pub fn install_with_headers(
        &self,
        symbolic_name: impl Into<String>,
        version: impl Into<String>,
        headers: BTreeMap<String, String>,
    ) -> BundleId {
        let id = self.next_bundle.fetch_add(1, Ordering::SeqCst) + 1;
        let mut bundle = Bundle::new(id, symbolic_name, version);
        bundle.headers = headers;

        self.bundles.write().insert(id, bundle.clone());
        debug!(bundle = %bundle, "Bundle installed");
        self.fire(BundleEventKind::Installed, bundle);
        id
    }

    /// 번들 시작 - `RESOLVED`(필요 시), `STARTING`, `STARTED` 발행
    pub fn start(&self, id: BundleId) -> Result<()> {
        let current = self.require(id)?;
        match current.state {
            BundleState::Active => return Ok(()),
            BundleState::Uninstalled => {
                return Err(Error::Internal(format!("bundle {} is uninstalled", id)))
            }
            _ if self.stopping.load(Ordering::SeqCst) => {
                return Err(Error::Internal("framework is stopping".into()))
            }
            BundleState::Installed => {
                let resolved = self.transition(id, BundleState::Resolved)?;
                self.fire(BundleEventKind::Resolved, resolved);
            }
            _ => {}
        }

        let starting = self.transition(id, BundleState::Starting)?;
        self.fire(BundleEventKind::Starting, starting);
        let active = self.transition(id, BundleState::Active)?;
        self.fire(BundleEventKind::Started, active);
        Ok(())
    }

    /// 번들 정지 - `STOPPING`, `STOPPED` 발행
    pub fn stop(&self, id: BundleId) -> Result<()> {
        if !self.require(id)?.is_active() {
            return Ok(());
        }
        let stopping = self.transition(id, BundleState::Stopping)?;
        self.fire(BundleEventKind::Stopping, stopping);
        let resolved = self.transition(id, BundleState::Resolved)?;
        self.fire(BundleEventKind::Stopped, resolved);
        Ok(())
    }

    /// 번들 갱신 - 활성 번들은 정지 후 갱신하고 다시 시작
    pub fn update(&self, id: BundleId, version: impl Into<String>) -> Result<()> {
        let was_active = self.require(id)?.is_active();
        if was_active {
            self.stop(id)?;
        }

        let updated = {
            let mut bundles = self.bundles.write();
            let bundle = bundles
                .get_mut(&id)
                .ok_or_else(|| Error::Internal(format!("unknown bundle {}", id)))?;
            bundle.version = version.into();
            bundle.state = BundleState::Installed;
            bundle.last_modified = Utc::now();
            bundle.clone()
        };
        self.fire(BundleEventKind::Updated, updated);

        if was_active {
            self.start(id)?;
        }
        Ok(())
    }

    /// 번들 제거 - 활성 번들은 먼저 정지, 이후 `UNINSTALLED` 발행
    pub fn uninstall(&self, id: BundleId) -> Result<()> {
        self.stop(id)?;
        let mut bundle = self
            .bundles
            .write()
            .remove(&id)
            .ok_or_else(|| Error::Internal(format!("unknown bundle {}", id)))?;
        bundle.state = BundleState::Uninstalled;
        self.fire(BundleEventKind::Uninstalled, bundle);
        Ok(())
    }

    /// 프레임워크 종료 - 활성 번들을 시작 역순으로 정지
    ///
    /// 정지 이벤트는 평소처럼 발행되지만 `is_stopping()`이 참인 상태로 전달됩니다.
    /// 종료 후에는 번들을 다시 시작할 수 없습니다.
    pub fn stop_framework(&self) -> Result<()> {
        if self.stopping.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        debug!("Framework stopping");
        let active: Vec<BundleId> = self
            .bundles
            .read()
            .values()
            .filter(|b| b.is_active())
            .map(|b| b.id)
            .collect();
        for id in active.into_iter().rev() {
            self.stop(id)?;
        }
        Ok(())
    }

    pub fn bundle(&self, id: BundleId) -> Option<Bundle> {
        self.bundles.read().get(&id).cloned()
    }

    /// 번들 목록 조회 실패 시뮬레이션
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    fn require(&self, id: BundleId) -> Result<Bundle> {
        self.bundle(id)
            .ok_or_else(|| Error::Internal(format!("unknown bundle {}", id)))
    }

    fn transition(&self, id: BundleId, state: BundleState) -> Result<Bundle> {
        let mut bundles = self.bundles.write();
        let bundle = bundles
            .get_mut(&id)
            .ok_or_else(|| Error::Internal(format!("unknown bundle {}", id)))?;
        bundle.state = state;
        Ok(bundle.clone())
    }

    fn fire(&self, kind: BundleEventKind, bundle: Bundle) {
        let event = BundleEvent::new(kind, bundle);
        let listeners: Vec<_> = self.listeners.read().iter().map(|(_, l)| l.clone()).collect();

        let _serial = self.delivery.lock();
        for listener in listeners {
            listener.bundle_changed(&event);
        }
    }
}

impl Framework for InMemoryFramework {
    fn bundles(&self) -> Result<Vec<Bundle>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::SourceEnumeration("framework unavailable".into()));
        }
        Ok(self.bundles.read().values().cloned().collect())
    }

    fn add_bundle_listener(&self, listener: Arc<dyn BundleListener>) -> ListenerId {
        let id = self.next_listener.fetch_add(1, Ordering::SeqCst);
        self.listeners.write().push((id, listener));
        id
    }

    fn remove_bundle_listener(&self, id: ListenerId) {
        self.listeners.write().retain(|(lid, _)| *lid != id);
    }

    fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Log(Mutex<Vec<BundleEventKind>>);

    impl BundleListener for Log {
        fn bundle_changed(&self, event: &BundleEvent) {
            self.0.lock().push(event.kind);
        }
    }

    #[test]
    fn test_start_stop_event_order() {
        let framework = InMemoryFramework::new();
        let log = Arc::new(Log::default());
        framework.add_bundle_listener(log.clone());

        let id = framework.install("app.core", "1.0.0");
        framework.start(id).unwrap();
        framework.stop(id).unwrap();
        framework.uninstall(id).unwrap();

        use BundleEventKind::*;
        assert_eq!(
            *log.0.lock(),
            vec![Installed, Resolved, Starting, Started, Stopping, Stopped, Uninstalled]
        );
        assert!(framework.bundle(id).is_none());
    }

    #[test]
    fn test_update_restarts_active_bundle() {
        let framework = InMemoryFramework::new();
        let id = framework.install("app.core", "1.0.0");
        framework.start(id).unwrap();

        let log = Arc::new(Log::default());
        let lid = framework.add_bundle_listener(log.clone());
        framework.update(id, "1.1.0").unwrap();

        use BundleEventKind::*;
        assert_eq!(
            *log.0.lock(),
            vec![Stopping, Stopped, Updated, Resolved, Starting, Started]
        );
        assert_eq!(framework.bundle(id).unwrap().version, "1.1.0");

        framework.remove_bundle_listener(lid);
        assert_eq!(framework.listener_count(), 0);
    }

    #[derive(Default)]
    struct Names(Mutex<Vec<String>>);

    impl BundleListener for Names {
        fn bundle_changed(&self, event: &BundleEvent) {
            if event.kind == BundleEventKind::Stopped {
                self.0.lock().push(event.bundle.symbolic_name.clone());
            }
        }
    }

    #[test]
    fn test_stop_framework_stops_active_bundles_in_reverse() {
        let framework = InMemoryFramework::new();
        let a = framework.install("app.a", "1.0.0");
        let b = framework.install("app.b", "1.0.0");
        framework.install("app.idle", "1.0.0");
        framework.start(a).unwrap();
        framework.start(b).unwrap();

        let log = Arc::new(Log::default());
        let names = Arc::new(Names::default());
        framework.add_bundle_listener(log.clone());
        framework.add_bundle_listener(names.clone());
        assert!(!framework.is_stopping());

        framework.stop_framework().unwrap();
        assert!(framework.is_stopping());

        use BundleEventKind::*;
        assert_eq!(*log.0.lock(), vec![Stopping, Stopped, Stopping, Stopped]);
        assert_eq!(*names.0.lock(), vec!["app.b", "app.a"]);
        assert!(!framework.bundle(a).unwrap().is_active());
        assert!(framework.start(a).is_err());
    }

    #[test]
    fn test_unavailable_framework_fails_enumeration() {
        let framework = InMemoryFramework::new();
        framework.install("app.core", "1.0.0");
        framework.set_available(false);
        assert!(matches!(framework.bundles(), Err(Error::SourceEnumeration(_))));
    }
}
