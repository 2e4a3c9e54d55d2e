//! ConfigurationSource - ConfigurationAdmin을 EntitySource로 변환
//!
//! 관리자 이벤트는 레코드를 포함하지 않으므로 CREATE/UPDATE/UPDATE_LOCATION은
//! 관리자에게 현재 레코드를 다시 조회합니다. 레코드가 없으면 경고 후
//! 이벤트를 버립니다.

use super::admin::{ConfigurationAdmin, ConfigurationListener};
use super::types::{ConfigEventKind, Configuration, ConfigurationEvent};
use lifecycle_foundation::{
    EntitySource, RawEvent, RawEventListener, Result, SourceSubscription, UpdateKind,
};
use std::sync::{Arc, Weak};
use tracing::warn;

/// 설정 레코드 EntitySource
pub struct ConfigurationSource {
    admin: Arc<dyn ConfigurationAdmin>,
}

impl ConfigurationSource {
    pub fn new(admin: Arc<dyn ConfigurationAdmin>) -> Self {
        Self { admin }
    }
}

impl EntitySource<Configuration> for ConfigurationSource {
    fn name(&self) -> &str {
        "configurations"
    }

    fn enumerate_current(&self) -> Result<Vec<Configuration>> {
        self.admin.list_configurations()
    }

    fn subscribe(
        &self,
        listener: Arc<dyn RawEventListener<Configuration>>,
    ) -> Result<SourceSubscription> {
        let bridge = Bridge {
            admin: Arc::downgrade(&self.admin),
            listener,
        };
        let id = self.admin.add_listener(Arc::new(bridge));
        let admin: Weak<dyn ConfigurationAdmin> = Arc::downgrade(&self.admin);

        Ok(SourceSubscription::new("configurations", move || {
            if let Some(admin) = admin.upgrade() {
                admin.remove_listener(id);
            }
        }))
    }
}

struct Bridge {
    admin: Weak<dyn ConfigurationAdmin>,
    listener: Arc<dyn RawEventListener<Configuration>>,
}

impl Bridge {
    fn translate(&self, event: &ConfigurationEvent) -> Option<RawEvent<Configuration>> {
        if event.kind == ConfigEventKind::Delete {
            return Some(RawEvent::Disappeared(event.pid.clone()));
        }

        let admin = self.admin.upgrade()?;
        let configuration = match admin.get_configuration(&event.pid) {
            Ok(Some(configuration)) => configuration,
            Ok(None) => {
                warn!(pid = %event.pid, kind = %event.kind, "Configuration not found, event dropped");
                return None;
            }
            Err(e) => {
                warn!(pid = %event.pid, kind = %event.kind, error = %e, "Configuration lookup failed, event dropped");
                return None;
            }
        };

        Some(match event.kind {
            ConfigEventKind::Create => RawEvent::Appeared(configuration),
            ConfigEventKind::Update => RawEvent::Updated(configuration, UpdateKind::Modified),
            ConfigEventKind::UpdateLocation => {
                RawEvent::Updated(configuration, UpdateKind::Relocated)
            }
            ConfigEventKind::Delete => RawEvent::Disappeared(event.pid.clone()),
        })
    }
}

impl ConfigurationListener for Bridge {
    fn configuration_event(&self, event: &ConfigurationEvent) {
        if let Some(raw) = self.translate(event) {
            self.listener.on_raw_event(raw);
        }
    }
}
