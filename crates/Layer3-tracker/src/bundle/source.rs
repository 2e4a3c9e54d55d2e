//! BundleSource - Framework를 EntitySource로 변환
//!
//! | 프레임워크 이벤트 | 원시 이벤트 |
//! |-------------------|-------------|
//! | STARTED | Appeared |
//! | STOPPING, STOPPED, UNINSTALLED | Disappeared |
//! | 그 외 | 무시 |

use super::framework::{BundleListener, Framework};
use super::types::{Bundle, BundleEvent, BundleEventKind};
use lifecycle_foundation::{EntitySource, RawEvent, RawEventListener, Result, SourceSubscription};
use std::sync::{Arc, Weak};
use tracing::trace;

/// 활성 번들만 추적하는 EntitySource
pub struct BundleSource {
    framework: Arc<dyn Framework>,
}

impl BundleSource {
    pub fn new(framework: Arc<dyn Framework>) -> Self {
        Self { framework }
    }

    /// 프레임워크 이벤트 → 원시 이벤트
    pub fn translate(event: &BundleEvent) -> Option<RawEvent<Bundle>> {
        match event.kind {
            BundleEventKind::Started => Some(RawEvent::Appeared(event.bundle.clone())),
            BundleEventKind::Stopping | BundleEventKind::Stopped | BundleEventKind::Uninstalled => {
                Some(RawEvent::Disappeared(event.bundle.id))
            }
            _ => None,
        }
    }
}

impl EntitySource<Bundle> for BundleSource {
    fn name(&self) -> &str {
        "bundles"
    }

    fn enumerate_current(&self) -> Result<Vec<Bundle>> {
        Ok(self
            .framework
            .bundles()?
            .into_iter()
            .filter(Bundle::is_active)
            .collect())
    }

    fn subscribe(&self, listener: Arc<dyn RawEventListener<Bundle>>) -> Result<SourceSubscription> {
        let id = self
            .framework
            .add_bundle_listener(Arc::new(Bridge { listener }));
        let framework: Weak<dyn Framework> = Arc::downgrade(&self.framework);

        Ok(SourceSubscription::new("bundles", move || {
            if let Some(framework) = framework.upgrade() {
                framework.remove_bundle_listener(id);
            }
        }))
    }
}

struct Bridge {
    listener: Arc<dyn RawEventListener<Bundle>>,
}

impl BundleListener for Bridge {
    fn bundle_changed(&self, event: &BundleEvent) {
        match BundleSource::translate(event) {
            Some(raw) => self.listener.on_raw_event(raw),
            None => trace!(bundle = %event.bundle, event = event.kind.as_str(), "Bundle event ignored"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::InMemoryFramework;

    #[test]
    fn test_translate() {
        let bundle = Bundle::new(4, "app.core", "1.0.0");
        let started = BundleEvent::new(BundleEventKind::Started, bundle.clone());
        let stopping = BundleEvent::new(BundleEventKind::Stopping, bundle.clone());
        let resolved = BundleEvent::new(BundleEventKind::Resolved, bundle);

        assert!(matches!(BundleSource::translate(&started), Some(RawEvent::Appeared(b)) if b.id == 4));
        assert!(matches!(BundleSource::translate(&stopping), Some(RawEvent::Disappeared(4))));
        assert!(BundleSource::translate(&resolved).is_none());
    }

    #[test]
    fn test_enumerates_only_active_bundles() {
        let framework = InMemoryFramework::new();
        let a = framework.install("app.a", "1.0.0");
        framework.install("app.b", "1.0.0");
        framework.start(a).unwrap();

        let source = BundleSource::new(framework);
        let ids: Vec<_> = source.enumerate_current().unwrap().iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![a]);
    }

    #[test]
    fn test_subscription_removes_listener() {
        let framework = InMemoryFramework::new();
        let source = BundleSource::new(framework.clone());

        struct Ignore;
        impl RawEventListener<Bundle> for Ignore {
            fn on_raw_event(&self, _event: RawEvent<Bundle>) {}
        }

        let subscription = source.subscribe(Arc::new(Ignore)).unwrap();
        assert_eq!(framework.listener_count(), 1);
        drop(subscription);
        assert_eq!(framework.listener_count(), 0);
    }
}
