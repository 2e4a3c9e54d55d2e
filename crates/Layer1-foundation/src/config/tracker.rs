//! Tracker Config - 트래커 설정
//!
//! 글로벌(`~/.config/lifecycle/tracker.json`) + 프로젝트(`.lifecycle/tracker.json`)
//! 순으로 JSON 키 단위 병합됩니다.

use crate::storage::JsonStore;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::debug;

/// 설정 파일명
pub const TRACKER_CONFIG_FILE: &str = "tracker.json";

// ============================================================================
// Tracker Config
// ============================================================================

/// LifecycleTracker 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerConfig {
    /// 트래커 이름 (로그 구분용)
    #[serde(default = "default_name")]
    pub name: String,

    /// 동기 콜백의 panic을 잡아서 로깅할지 여부
    #[serde(default = "default_true")]
    pub isolate_panics: bool,

    /// 종료 시 비동기 태스크 대기 시간 (ms)
    #[serde(default = "default_drain_timeout_ms")]
    pub drain_timeout_ms: u64,

    /// `start()` 시 소스의 현재 엔티티로 StateTable을 채울지 여부
    #[serde(default = "default_true")]
    pub seed_on_start: bool,

    /// 로깅 설정
    #[serde(default)]
    pub log: LogConfig,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            isolate_panics: true,
            drain_timeout_ms: default_drain_timeout_ms(),
            seed_on_start: true,
            log: LogConfig::default(),
        }
    }
}

impl TrackerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Load / Save
    // ========================================================================

    /// 글로벌 + 프로젝트 병합 로드
    pub fn load() -> Result<Self> {
        Self::load_layered(&JsonStore::layered())
    }

    /// 주어진 저장소들을 순서대로 병합 (뒤가 우선)
    ///
    /// 파일에 실제로 적힌 키만 덮어씁니다. 기본값과 같은 값도 앞 단계를 덮어씁니다.
    pub fn load_layered(stores: &[JsonStore]) -> Result<Self> {
        let mut merged = Value::Object(Map::new());
        for store in stores {
            if let Some(layer) = store.load_optional::<Value>(TRACKER_CONFIG_FILE)? {
                debug!(dir = %store.dir().display(), scope = ?store.scope(), "Merging tracker config");
                merge_json(&mut merged, layer);
            }
        }
        serde_json::from_value(merged)
            .map_err(|e| Error::Config(format!("Invalid tracker config: {}", e)))
    }

    /// 특정 저장소에서 로드 (없으면 기본값)
    pub fn load_from(store: &JsonStore) -> Result<Self> {
        Ok(store
            .load_optional::<TrackerConfig>(TRACKER_CONFIG_FILE)?
            .unwrap_or_default())
    }

    /// 저장
    pub fn save_to(&self, store: &JsonStore) -> Result<()> {
        store.save(TRACKER_CONFIG_FILE, self)
    }

    /// 인라인 JSON에서 파싱
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(format!("Invalid tracker config: {}", e)))
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }

    // ========================================================================
    // Builder
    // ========================================================================

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn isolate_panics(mut self, isolate: bool) -> Self {
        self.isolate_panics = isolate;
        self
    }

    pub fn drain_timeout_ms(mut self, ms: u64) -> Self {
        self.drain_timeout_ms = ms;
        self
    }

    pub fn seed_on_start(mut self, seed: bool) -> Self {
        self.seed_on_start = seed;
        self
    }
}

// ============================================================================
// Log Config
// ============================================================================

/// 로깅 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogConfig {
    /// 기본 필터 (`RUST_LOG`가 있으면 무시됨)
    #[serde(default = "default_level")]
    pub level: String,

    /// 로그에 target 표시
    #[serde(default)]
    pub with_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            with_target: false,
        }
    }
}

/// 객체는 키 단위로 재귀 병합, 그 외 값은 통째로 교체
fn merge_json(base: &mut Value, layer: Value) {
    match (base, layer) {
        (Value::Object(base), Value::Object(layer)) => {
            for (key, value) in layer {
                match base.get_mut(&key) {
                    Some(slot) => merge_json(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

fn default_name() -> String {
    "lifecycle".to_string()
}

fn default_true() -> bool {
    true
}

fn default_drain_timeout_ms() -> u64 {
    5_000
}

fn default_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let config = TrackerConfig::from_json_str("{}").unwrap();
        assert_eq!(config.name, "lifecycle");
        assert!(config.isolate_panics);
        assert!(config.seed_on_start);
        assert_eq!(config.drain_timeout(), Duration::from_secs(5));
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_camel_case_fields() {
        let config = TrackerConfig::from_json_str(
            r#"{"name":"bundles","drainTimeoutMs":250,"isolatePanics":false,"log":{"level":"debug"}}"#,
        )
        .unwrap();
        assert_eq!(config.name, "bundles");
        assert_eq!(config.drain_timeout_ms, 250);
        assert!(!config.isolate_panics);
        assert_eq!(config.log.level, "debug");
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let err = TrackerConfig::from_json_str("{\"drainTimeoutMs\": \"soon\"}").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_merge_json_keeps_unset_keys() {
        let mut base = serde_json::json!({"name": "global", "drainTimeoutMs": 100, "log": {"level": "debug"}});
        merge_json(
            &mut base,
            serde_json::json!({"seedOnStart": false, "log": {"withTarget": true}}),
        );

        let config: TrackerConfig = serde_json::from_value(base).unwrap();
        assert_eq!(config.name, "global");
        assert_eq!(config.drain_timeout_ms, 100);
        assert!(!config.seed_on_start);
        assert_eq!(config.log.level, "debug");
        assert!(config.log.with_target);
    }

    #[test]
    fn test_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::project(dir.path());

        assert_eq!(TrackerConfig::load_from(&store).unwrap().name, "lifecycle");

        TrackerConfig::new().name("configs").save_to(&store).unwrap();
        assert_eq!(TrackerConfig::load_from(&store).unwrap().name, "configs");
    }

    #[test]
    fn test_layered_load_project_wins() {
        let global_dir = tempfile::tempdir().unwrap();
        let project_dir = tempfile::tempdir().unwrap();
        let global = JsonStore::new(global_dir.path());
        let project = JsonStore::project(project_dir.path());

        TrackerConfig::new()
            .name("global")
            .drain_timeout_ms(100)
            .save_to(&global)
            .unwrap();
        TrackerConfig::new().name("project").save_to(&project).unwrap();

        let config = TrackerConfig::load_layered(&[global, project]).unwrap();
        assert_eq!(config.name, "project");
        assert_eq!(config.drain_timeout_ms, 100);
    }

    #[test]
    fn test_layered_load_restores_default_value() {
        let global_dir = tempfile::tempdir().unwrap();
        let project_dir = tempfile::tempdir().unwrap();
        let global = JsonStore::new(global_dir.path());
        let project = JsonStore::project(project_dir.path());

        std::fs::write(
            global.file_path(TRACKER_CONFIG_FILE),
            r#"{"isolatePanics":false,"seedOnStart":false,"drainTimeoutMs":100}"#,
        )
        .unwrap();
        std::fs::create_dir_all(project.dir()).unwrap();
        std::fs::write(
            project.file_path(TRACKER_CONFIG_FILE),
            r#"{"isolatePanics":true,"drainTimeoutMs":5000}"#,
        )
        .unwrap();

        let config = TrackerConfig::load_layered(&[global, project]).unwrap();
        assert!(config.isolate_panics);
        assert!(!config.seed_on_start);
        assert_eq!(config.drain_timeout_ms, 5_000);
    }

    #[test]
    fn test_layered_load_rejects_bad_layer_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        std::fs::write(store.file_path(TRACKER_CONFIG_FILE), r#"{"drainTimeoutMs":"soon"}"#).unwrap();

        let err = TrackerConfig::load_layered(&[store]).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
