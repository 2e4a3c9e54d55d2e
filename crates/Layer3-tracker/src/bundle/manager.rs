//! Bundle Tracker Manager - 번들 시작/정지 구독
//!
//! 등록 시 이미 활성인 번들마다 `on_start`가 호출되고, 이후 번들이 시작될
//! 때마다 호출됩니다. 해제 시에는 시작 콜백을 받은 번들마다 `on_stop`이
//! 호출됩니다.
//!
//! 프레임워크 자체가 종료 중(`Framework::is_stopping`)일 때는 두 콜백 모두
//! 호출되지 않습니다. 추적 상태는 평소대로 갱신됩니다.

use super::framework::Framework;
use super::source::BundleSource;
use super::types::Bundle;
use lifecycle_core::{Callback, CancellationToken, Filter, LifecycleTracker, Subscriber};
use lifecycle_foundation::{Result, SubscriberKey, TrackerConfig};
use std::future::Future;
use std::sync::Arc;
use tracing::info;

// ============================================================================
// BundleCallback
// ============================================================================

/// 번들 콜백 생성 헬퍼
pub struct BundleCallback;

impl BundleCallback {
    /// 전달 스레드에서 즉시 실행
    pub fn sync<F>(f: F) -> Callback<Bundle>
    where
        F: Fn(&Bundle) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Callback::sync(f)
    }

    /// tokio 태스크로 실행, 반대 이벤트가 오면 `token`이 취소됨
    pub fn spawn<F, Fut>(f: F) -> Callback<Bundle>
    where
        F: Fn(Bundle, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Callback::task(f)
    }

    /// 블로킹 작업을 `spawn_blocking`으로 실행
    ///
    /// 이미 시작된 블로킹 작업은 중단할 수 없으며, 취소되면 결과만 버려집니다.
    pub fn blocking<F>(f: F) -> Callback<Bundle>
    where
        F: Fn(&Bundle) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Callback::task(move |bundle: Bundle, token: CancellationToken| {
            let f = Arc::clone(&f);
            async move {
                if token.is_cancelled() {
                    return Ok(());
                }
                tokio::task::spawn_blocking(move || f(&bundle)).await?
            }
        })
    }
}

// ============================================================================
// BundleTrackerManager
// ============================================================================

/// 번들 라이프사이클 트래커
pub struct BundleTrackerManager {
    tracker: Arc<LifecycleTracker<Bundle>>,
    framework: Arc<dyn Framework>,
}

impl BundleTrackerManager {
    /// 프레임워크를 구독하고 활성 번들로 시작
    pub fn new(config: TrackerConfig, framework: Arc<dyn Framework>) -> Result<Self> {
        let source = Arc::new(BundleSource::new(Arc::clone(&framework)));
        let tracker = LifecycleTracker::new(config, source);
        tracker.start()?;
        info!(tracker = tracker.name(), "Bundle tracker ready");
        Ok(Self { tracker, framework })
    }

    /// 번들 콜백 등록
    ///
    /// 같은 키가 이미 등록되어 있으면 `DuplicateRegistration`.
    pub fn register_bundle_callback(
        &self,
        key: impl Into<SubscriberKey>,
        on_start: Callback<Bundle>,
        on_stop: Callback<Bundle>,
        filter: Filter<Bundle>,
    ) -> Result<()> {
        let subscriber = Subscriber::new(self.guard(on_start), self.guard(on_stop));
        self.tracker.register(key, subscriber.filter(filter))
    }

    /// 모든 번들에 대한 콜백 등록
    pub fn register_all_bundles_callback(
        &self,
        key: impl Into<SubscriberKey>,
        on_start: Callback<Bundle>,
        on_stop: Callback<Bundle>,
    ) -> Result<()> {
        self.register_bundle_callback(key, on_start, on_stop, Filter::all())
    }

    pub fn unregister_bundle_callback(&self, key: impl Into<SubscriberKey>) -> Result<()> {
        self.tracker.unregister(key)
    }

    /// 현재 활성 번들
    pub fn active_bundles(&self) -> Vec<Bundle> {
        self.tracker.snapshot()
    }

    pub fn tracker(&self) -> &Arc<LifecycleTracker<Bundle>> {
        &self.tracker
    }

    pub fn close(&self) {
        self.tracker.close();
    }

    /// 프레임워크 종료 중에는 콜백 생략
    fn guard(&self, callback: Callback<Bundle>) -> Callback<Bundle> {
        let framework = Arc::clone(&self.framework);
        callback.skip_when(move || framework.is_stopping())
    }

    pub async fn shutdown(&self) {
        self.tracker.shutdown().await;
    }
}
