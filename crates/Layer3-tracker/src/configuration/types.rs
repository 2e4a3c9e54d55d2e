//! Configuration Types - 설정 레코드와 콜백 페이로드

use lifecycle_foundation::{TrackedEntity, UpdateKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 설정 속성
pub type Properties = BTreeMap<String, serde_json::Value>;

// ============================================================================
// Configuration - 설정 관리자가 보관하는 레코드
// ============================================================================

/// 설정 레코드
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    pub pid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factory_pid: Option<String>,
    #[serde(default)]
    pub properties: Properties,
    /// 설정이 바인딩된 번들 위치
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle_location: Option<String>,
}

impl Configuration {
    pub fn new(pid: impl Into<String>) -> Self {
        Self {
            pid: pid.into(),
            factory_pid: None,
            properties: Properties::new(),
            bundle_location: None,
        }
    }

    pub fn with_factory_pid(mut self, factory_pid: impl Into<String>) -> Self {
        self.factory_pid = Some(factory_pid.into());
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.bundle_location = Some(location.into());
        self
    }

    /// factory PID, 없으면 PID
    pub fn effective_factory_pid(&self) -> &str {
        self.factory_pid.as_deref().unwrap_or(&self.pid)
    }
}

impl TrackedEntity for Configuration {
    type Key = String;

    fn key(&self) -> String {
        self.pid.clone()
    }
}

// ============================================================================
// ConfigEventKind
// ============================================================================

/// 설정 이벤트 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfigEventKind {
    Create,
    Update,
    UpdateLocation,
    Delete,
}

impl ConfigEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::UpdateLocation => "UPDATE_LOCATION",
            Self::Delete => "DELETE",
        }
    }
}

impl From<UpdateKind> for ConfigEventKind {
    fn from(kind: UpdateKind) -> Self {
        match kind {
            UpdateKind::Modified => Self::Update,
            UpdateKind::Relocated => Self::UpdateLocation,
        }
    }
}

impl fmt::Display for ConfigEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ConfigurationInfo - 콜백 페이로드
// ============================================================================

/// 설정 콜백에 전달되는 정보
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationInfo {
    pub pid: String,
    /// factory PID가 없는 설정은 PID와 같음
    pub factory_pid: String,
    pub properties: Properties,
    pub kind: ConfigEventKind,
}

impl ConfigurationInfo {
    pub fn from_configuration(configuration: &Configuration, kind: ConfigEventKind) -> Self {
        Self {
            pid: configuration.pid.clone(),
            factory_pid: configuration.effective_factory_pid().to_string(),
            properties: configuration.properties.clone(),
            kind,
        }
    }

    pub fn property(&self, name: &str) -> Option<&serde_json::Value> {
        self.properties.get(name)
    }
}

// ============================================================================
// ConfigurationEvent - 설정 관리자가 발행하는 원시 이벤트
// ============================================================================

/// 설정 관리자 이벤트 (레코드 내용은 포함하지 않음)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationEvent {
    pub pid: String,
    pub factory_pid: Option<String>,
    pub kind: ConfigEventKind,
}

impl ConfigurationEvent {
    pub fn new(pid: impl Into<String>, factory_pid: Option<String>, kind: ConfigEventKind) -> Self {
        Self {
            pid: pid.into(),
            factory_pid,
            kind,
        }
    }
}
