//! Bundle Types - 모듈(번들) 정의와 프레임워크 이벤트

use chrono::{DateTime, Utc};
use lifecycle_foundation::TrackedEntity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 번들 ID
pub type BundleId = u64;

// ============================================================================
// BundleState
// ============================================================================

/// 번들 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BundleState {
    Installed,
    Resolved,
    Starting,
    Active,
    Stopping,
    Uninstalled,
}

impl BundleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Installed => "INSTALLED",
            Self::Resolved => "RESOLVED",
            Self::Starting => "STARTING",
            Self::Active => "ACTIVE",
            Self::Stopping => "STOPPING",
            Self::Uninstalled => "UNINSTALLED",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for BundleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Bundle
// ============================================================================

/// 프레임워크가 관리하는 모듈
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    pub id: BundleId,
    pub symbolic_name: String,
    pub version: String,
    pub state: BundleState,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    pub last_modified: DateTime<Utc>,
}

impl Bundle {
    pub fn new(id: BundleId, symbolic_name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id,
            symbolic_name: symbolic_name.into(),
            version: version.into(),
            state: BundleState::Installed,
            headers: BTreeMap::new(),
            last_modified: Utc::now(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_state(mut self, state: BundleState) -> Self {
        self.state = state;
        self
    }

    /// 매니페스트 헤더 조회
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }
}

impl TrackedEntity for Bundle {
    type Key = BundleId;

    fn key(&self) -> BundleId {
        self.id
    }
}

impl fmt::Display for Bundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} [{}]", self.symbolic_name, self.version, self.id)
    }
}

// ============================================================================
// BundleEvent
// ============================================================================

/// 프레임워크 번들 이벤트 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BundleEventKind {
    Installed,
    Resolved,
    Starting,
    Started,
    Stopping,
    Stopped,
    Updated,
    Uninstalled,
}

impl BundleEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Installed => "INSTALLED",
            Self::Resolved => "RESOLVED",
            Self::Starting => "STARTING",
            Self::Started => "STARTED",
            Self::Stopping => "STOPPING",
            Self::Stopped => "STOPPED",
            Self::Updated => "UPDATED",
            Self::Uninstalled => "UNINSTALLED",
        }
    }
}

/// 프레임워크 번들 이벤트
#[derive(Debug, Clone, PartialEq)]
pub struct BundleEvent {
    pub kind: BundleEventKind,
    pub bundle: Bundle,
}

impl BundleEvent {
    pub fn new(kind: BundleEventKind, bundle: Bundle) -> Self {
        Self { kind, bundle }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundle_builder() {
        let bundle = Bundle::new(3, "app.core", "1.2.0")
            .with_header("Bundle-Category", "app")
            .with_state(BundleState::Active);

        assert_eq!(bundle.key(), 3);
        assert_eq!(bundle.header("Bundle-Category"), Some("app"));
        assert!(bundle.is_active());
        assert_eq!(bundle.to_string(), "app.core:1.2.0 [3]");
    }

    #[test]
    fn test_bundle_serialization() {
        let bundle = Bundle::new(1, "app.web", "0.1.0");
        let json = serde_json::to_value(&bundle).unwrap();
        assert_eq!(json["symbolicName"], "app.web");
        assert_eq!(json["state"], "INSTALLED");
    }
}
