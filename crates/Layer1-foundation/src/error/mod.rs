//! Error types for lifecycle tracking
//!
//! 모든 에러를 중앙에서 관리

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Lifecycle 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 등록 관련
    // ========================================================================
    /// 이미 사용 중인 키로 구독자를 등록하려 함 (레지스트리는 변경되지 않음)
    #[error("Subscriber already registered: {key}")]
    DuplicateRegistration { key: String },

    #[error("Tracker is closed")]
    Closed,

    // ========================================================================
    // EntitySource 관련
    // ========================================================================
    /// 현재 엔티티 목록을 가져올 수 없음
    #[error("Source enumeration failed: {0}")]
    SourceEnumeration(String),

    #[error("Source subscription failed: {0}")]
    SourceSubscription(String),

    // ========================================================================
    // Callback 관련
    // ========================================================================
    /// 옵저버 콜백 실패 - 로깅 용도로만 생성되며 호출자에게 전파되지 않음
    #[error("Callback failed: subscriber={subscriber} entity={entity} - {message}")]
    Callback {
        subscriber: String,
        entity: String,
        message: String,
    },

    #[error("No async runtime available for task callback")]
    NoRuntime,

    // ========================================================================
    // 설정 관련
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // 외부 에러 변환
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ========================================================================
    // 기타
    // ========================================================================
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// 호출자에게 반환되어야 하는 에러인지 확인
    ///
    /// 런타임 전달 실패(콜백, 소스 열거)는 내부에서 로깅 후 흡수됩니다.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Error::DuplicateRegistration { .. }
                | Error::Closed
                | Error::SourceSubscription(_)
                | Error::Config(_)
        )
    }

    /// 중복 등록 에러 생성 헬퍼
    pub fn duplicate(key: impl std::fmt::Display) -> Self {
        Error::DuplicateRegistration {
            key: key.to_string(),
        }
    }

    /// 콜백 에러 생성 헬퍼
    pub fn callback(
        subscriber: impl std::fmt::Display,
        entity: impl std::fmt::Debug,
        message: impl Into<String>,
    ) -> Self {
        Error::Callback {
            subscriber: subscriber.to_string(),
            entity: format!("{:?}", entity),
            message: message.into(),
        }
    }
}
