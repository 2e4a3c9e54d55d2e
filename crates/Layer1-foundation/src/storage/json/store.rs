//! JSON 파일 저장소 - 트래커 설정 파일 로드/저장
//!
//! 설정은 두 단계로 찾습니다. 나중 단계가 앞 단계를 덮어씁니다.
//!
//! | 단계 | 위치 |
//! |------|------|
//! | Global | `<config_dir>/lifecycle/` |
//! | Project | `<cwd>/.lifecycle/` |

use crate::{Error, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const GLOBAL_DIR: &str = "lifecycle";
const PROJECT_DIR: &str = ".lifecycle";

/// 설정 위치 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Global,
    Project,
}

/// JSON 설정 저장소 (디렉토리 하나)
#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
    scope: Scope,
}

impl JsonStore {
    /// 임의 디렉토리 (프로젝트 단계로 취급)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            scope: Scope::Project,
        }
    }

    pub fn global() -> Result<Self> {
        let base = dirs::config_dir()
            .ok_or_else(|| Error::Config("no platform config directory".into()))?;
        Ok(Self {
            dir: base.join(GLOBAL_DIR),
            scope: Scope::Global,
        })
    }

    /// `<root>/.lifecycle`
    pub fn project(root: impl AsRef<Path>) -> Self {
        Self::new(root.as_ref().join(PROJECT_DIR))
    }

    pub fn current_project() -> Result<Self> {
        Ok(Self::project(std::env::current_dir()?))
    }

    /// 찾을 수 있는 저장소 목록 (Global → Project 순)
    ///
    /// 찾을 수 없는 단계는 건너뜁니다.
    pub fn layered() -> Vec<Self> {
        [Self::global().ok(), Self::current_project().ok()]
            .into_iter()
            .flatten()
            .collect()
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn file_path(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }

    /// 파일이 없으면 `None`, 읽기/파싱 실패는 `Error::Config`
    pub fn load_optional<T: DeserializeOwned>(&self, filename: &str) -> Result<Option<T>> {
        let path = self.file_path(filename);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::Config(format!("{}: {}", path.display(), e))),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn load<T: DeserializeOwned>(&self, filename: &str) -> Result<T> {
        self.load_optional(filename)?.ok_or_else(|| {
            Error::Config(format!("{} not found", self.file_path(filename).display()))
        })
    }

    /// 디렉토리가 없으면 만든 뒤 저장
    pub fn save<T: Serialize>(&self, filename: &str, value: &T) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let mut json = serde_json::to_vec_pretty(value)?;
        json.push(b'\n');
        std::fs::write(self.file_path(filename), json)?;
        Ok(())
    }

    pub fn exists(&self, filename: &str) -> bool {
        self.file_path(filename).is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        count: u32,
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::project(dir.path());

        assert!(!store.exists("sample.json"));
        assert!(store.load_optional::<Sample>("sample.json").unwrap().is_none());
        assert!(matches!(store.load::<Sample>("sample.json"), Err(Error::Config(_))));

        let sample = Sample {
            name: "tracker".into(),
            count: 3,
        };
        store.save("sample.json", &sample).unwrap();

        assert!(store.exists("sample.json"));
        assert_eq!(store.load::<Sample>("sample.json").unwrap(), sample);
        assert!(store.dir().ends_with(".lifecycle"));
        assert_eq!(store.scope(), Scope::Project);
    }

    #[test]
    fn test_parse_error_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        std::fs::write(store.file_path("bad.json"), "{ not json").unwrap();

        let err = store.load::<Sample>("bad.json").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
