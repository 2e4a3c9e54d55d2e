//! Core Types - 공용 타입 정의
//!
//! 모든 레이어에서 공통으로 사용하는 키와 전이 타입들

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// SubscriberKey - 구독자 식별자
// ============================================================================

/// 구독자 식별자 (호출자가 선택하는 discriminator)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriberKey(String);

impl SubscriberKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubscriberKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SubscriberKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SubscriberKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&SubscriberKey> for SubscriberKey {
    fn from(k: &SubscriberKey) -> Self {
        k.clone()
    }
}

// ============================================================================
// UpdateKind - 업데이트 세부 종류
// ============================================================================

/// 버전 관리 엔티티(설정 등)의 업데이트 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateKind {
    /// 내용(속성) 변경
    Modified,
    /// 위치(바인딩) 변경
    Relocated,
}

impl UpdateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Modified => "modified",
            Self::Relocated => "relocated",
        }
    }
}

// ============================================================================
// Direction - 전이 방향
// ============================================================================

/// `(subscriber, entity)` 쌍에 대한 전이 방향
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Appear,
    Update,
    Disappear,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Appear => "appear",
            Self::Update => "update",
            Self::Disappear => "disappear",
        }
    }

    /// 반대 방향 전이인지 (appear/update ↔ disappear)
    pub fn opposes(&self, other: Direction) -> bool {
        matches!(
            (self, other),
            (Self::Disappear, Self::Appear | Self::Update)
                | (Self::Appear | Self::Update, Self::Disappear)
        )
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
