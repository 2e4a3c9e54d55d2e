//! Logging - tracing 구독자 초기화
//!
//! `RUST_LOG` 환경변수가 있으면 우선하고, 없으면 `LogConfig::level`을 사용합니다.

use crate::config::LogConfig;
use crate::{Error, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 전역 tracing 구독자 설치
///
/// 이미 설치되어 있으면 `Error::Config`를 반환합니다.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    tracing_subscriber::registry()
        .with(build_filter(config))
        .with(tracing_subscriber::fmt::layer().with_target(config.with_target))
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to install tracing subscriber: {}", e)))
}

fn build_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails() {
        let config = LogConfig::default();
        // 다른 테스트가 먼저 설치했을 수 있으므로 첫 결과는 무시
        let _ = init_logging(&config);
        assert!(matches!(init_logging(&config), Err(Error::Config(_))));
    }
}
