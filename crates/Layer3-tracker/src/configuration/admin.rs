//! Configuration Admin - 설정 레코드를 관리하는 외부 서비스
//!
//! 관리자 이벤트는 PID와 종류만 전달합니다. 레코드 내용이 필요하면
//! `get_configuration`으로 다시 조회해야 합니다.

use super::types::{ConfigEventKind, Configuration, ConfigurationEvent, Properties};
use lifecycle_foundation::{Error, Result};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

pub type ListenerId = u64;

/// 설정 이벤트 수신자
pub trait ConfigurationListener: Send + Sync {
    fn configuration_event(&self, event: &ConfigurationEvent);
}

/// 설정 관리자 계약
pub trait ConfigurationAdmin: Send + Sync {
    fn list_configurations(&self) -> Result<Vec<Configuration>>;

    fn get_configuration(&self, pid: &str) -> Result<Option<Configuration>>;

    fn add_listener(&self, listener: Arc<dyn ConfigurationListener>) -> ListenerId;

    fn remove_listener(&self, id: ListenerId);
}

// ============================================================================
// InMemoryConfigurationAdmin
// ============================================================================

/// 메모리 내 설정 관리자 (생성 순서 유지)
#[derive(Default)]
pub struct InMemoryConfigurationAdmin {
    records: RwLock<Vec<Configuration>>,
    listeners: RwLock<Vec<(ListenerId, Arc<dyn ConfigurationListener>)>>,
    next_listener: AtomicU64,
    unavailable: AtomicBool,
    delivery: Mutex<()>,
}

impl InMemoryConfigurationAdmin {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// 설정 생성 - `CREATE` 발행, 이미 있으면 에러
    pub fn create(&self, configuration: Configuration) -> Result<()> {
        let event = {
            let mut records = self.records.write();
            if records.iter().any(|c| c.pid == configuration.pid) {
                return Err(Error::Internal(format!(
                    "configuration {} already exists",
                    configuration.pid
                )));
            }
            let event = ConfigurationEvent::new(
                configuration.pid.clone(),
                configuration.factory_pid.clone(),
                ConfigEventKind::Create,
            );
            records.push(configuration);
            event
        };
        self.fire(event);
        Ok(())
    }

    /// 속성 교체 - `UPDATE` 발행
    pub fn update(&self, pid: &str, properties: Properties) -> Result<()> {
        let event = self.modify(pid, ConfigEventKind::Update, |c| c.properties = properties)?;
        self.fire(event);
        Ok(())
    }

    /// 번들 위치 변경 - `UPDATE_LOCATION` 발행
    pub fn set_location(&self, pid: &str, location: Option<String>) -> Result<()> {
        let event = self.modify(pid, ConfigEventKind::UpdateLocation, |c| {
            c.bundle_location = location
        })?;
        self.fire(event);
        Ok(())
    }

    /// 설정 삭제 - `DELETE` 발행
    pub fn delete(&self, pid: &str) -> Result<()> {
        let removed = {
            let mut records = self.records.write();
            let index = records
                .iter()
                .position(|c| c.pid == pid)
                .ok_or_else(|| Error::Internal(format!("unknown configuration {}", pid)))?;
            records.remove(index)
        };
        self.fire(ConfigurationEvent::new(
            removed.pid,
            removed.factory_pid,
            ConfigEventKind::Delete,
        ));
        Ok(())
    }

    /// 레코드 변경 없이 이벤트만 발행
    pub fn publish(&self, event: ConfigurationEvent) {
        self.fire(event);
    }

    /// 조회 실패 시뮬레이션
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    fn modify(
        &self,
        pid: &str,
        kind: ConfigEventKind,
        change: impl FnOnce(&mut Configuration),
    ) -> Result<ConfigurationEvent> {
        let mut records = self.records.write();
        let record = records
            .iter_mut()
            .find(|c| c.pid == pid)
            .ok_or_else(|| Error::Internal(format!("unknown configuration {}", pid)))?;
        change(record);
        Ok(ConfigurationEvent::new(
            record.pid.clone(),
            record.factory_pid.clone(),
            kind,
        ))
    }

    fn ensure_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::SourceEnumeration("configuration admin unavailable".into()));
        }
        Ok(())
    }

    fn fire(&self, event: ConfigurationEvent) {
        let listeners: Vec<_> = self.listeners.read().iter().map(|(_, l)| l.clone()).collect();
        debug!(pid = %event.pid, kind = %event.kind, listeners = listeners.len(), "Configuration event");

        let _serial = self.delivery.lock();
        for listener in listeners {
            listener.configuration_event(&event);
        }
    }
}

impl ConfigurationAdmin for InMemoryConfigurationAdmin {
    fn list_configurations(&self) -> Result<Vec<Configuration>> {
        self.ensure_available()?;
        Ok(self.records.read().clone())
    }

    fn get_configuration(&self, pid: &str) -> Result<Option<Configuration>> {
        self.ensure_available()?;
        Ok(self.records.read().iter().find(|c| c.pid == pid).cloned())
    }

    fn add_listener(&self, listener: Arc<dyn ConfigurationListener>) -> ListenerId {
        let id = self.next_listener.fetch_add(1, Ordering::SeqCst);
        self.listeners.write().push((id, listener));
        id
    }

    fn remove_listener(&self, id: ListenerId) {
        self.listeners.write().retain(|(lid, _)| *lid != id);
    }
}
