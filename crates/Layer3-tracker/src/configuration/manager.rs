//! Configuration Tracker Manager - 설정 생성/변경/삭제 구독
//!
//! 등록 시 이미 존재하는 설정마다 create 콜백이 호출됩니다. 이후
//! CREATE → create, UPDATE/UPDATE_LOCATION → update, DELETE → delete
//! 콜백으로 전달됩니다. delete 콜백은 마지막으로 알려진 속성을 받습니다.

use super::admin::ConfigurationAdmin;
use super::source::ConfigurationSource;
use super::types::{ConfigEventKind, Configuration, ConfigurationInfo};
use lifecycle_core::{Callback, Filter, LifecycleTracker, Subscriber, Updated};
use lifecycle_foundation::{Result, SubscriberKey, TrackerConfig};
use std::sync::Arc;
use tracing::info;

/// 설정 콜백
pub type ConfigurationCallback = Callback<ConfigurationInfo>;

/// 설정 라이프사이클 트래커
pub struct ConfigurationTrackerManager {
    tracker: Arc<LifecycleTracker<Configuration>>,
}

impl ConfigurationTrackerManager {
    pub fn new(config: TrackerConfig, admin: Arc<dyn ConfigurationAdmin>) -> Result<Self> {
        let source = Arc::new(ConfigurationSource::new(admin));
        let tracker = LifecycleTracker::new(config, source);
        tracker.start()?;
        info!(tracker = tracker.name(), "Configuration tracker ready");
        Ok(Self { tracker })
    }

    /// 설정 콜백 등록
    pub fn register_configuration_callback(
        &self,
        key: impl Into<SubscriberKey>,
        create: ConfigurationCallback,
        update: ConfigurationCallback,
        delete: ConfigurationCallback,
        filter: Filter<Configuration>,
    ) -> Result<()> {
        let on_appear = create.map_input(|c: &Configuration| {
            ConfigurationInfo::from_configuration(c, ConfigEventKind::Create)
        });
        let on_update = update.map_input(|u: &Updated<Configuration>| {
            ConfigurationInfo::from_configuration(&u.entity, u.kind.into())
        });
        let on_disappear = delete.map_input(|c: &Configuration| {
            ConfigurationInfo::from_configuration(c, ConfigEventKind::Delete)
        });

        let subscriber = Subscriber::new(on_appear, on_disappear)
            .with_update(on_update)
            .filter(filter);
        self.tracker.register(key, subscriber)
    }

    pub fn unregister_configuration_callback(&self, key: impl Into<SubscriberKey>) -> Result<()> {
        self.tracker.unregister(key)
    }

    /// 현재 알려진 설정
    pub fn configurations(&self) -> Vec<Configuration> {
        self.tracker.snapshot()
    }

    pub fn tracker(&self) -> &Arc<LifecycleTracker<Configuration>> {
        &self.tracker
    }

    pub fn close(&self) {
        self.tracker.close();
    }

    pub async fn shutdown(&self) {
        self.tracker.shutdown().await;
    }
}
