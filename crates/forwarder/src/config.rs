//! 설정 관리 — scanrelay.toml 파싱 및 런타임 설정
//!
//! [`ScanRelayConfig`]는 전달 파이프라인의 모든 설정을 담는 최상위 구조체입니다.
//! 오케스트레이터는 전역 상태를 읽지 않으며, 검증된 [`ForwardConfig`]를
//! 생성 시점에 명시적으로 전달받습니다.
//!
//! # 설정 로딩 우선순위
//! 1. 환경변수 (`SCANRELAY_FORWARD_DOMAIN=abc.live.example.com` 형식)
//! 2. 설정 파일 (`scanrelay.toml`)
//! 3. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), scanrelay_forwarder::ForwardError> {
//! use scanrelay_forwarder::config::ScanRelayConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = ScanRelayConfig::load("scanrelay.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = ScanRelayConfig::parse("[forward]\ndomain = \"abc.example.com\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ForwardError;

/// ScanRelay 통합 설정
///
/// `scanrelay.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanRelayConfig {
    /// 일반 설정 (로깅)
    #[serde(default)]
    pub general: GeneralConfig,
    /// 전달 파이프라인 설정
    #[serde(default)]
    pub forward: ForwardConfig,
}

/// 일반 설정 — 로깅 레벨 및 출력 형식
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 출력 형식 ("json" 또는 "pretty")
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// 전달 파이프라인 설정
///
/// # 필드
///
/// - **secret_id**: 인증 토큰이 들어 있는 시크릿 식별자
/// - **secret_key_name**: 시크릿 값(JSON) 안에서 토큰을 선택하는 키 이름
/// - **domain**: 수집 엔드포인트 도메인 (스킴/경로 없음)
/// - **ingest_path**: 수집 경로. 쿼리 문자열을 포함할 수 있으며,
///   쿼리는 이벤트 분류용으로 이벤트 전송에만 사용됩니다.
///   원본 알림은 쿼리가 제거된 기본 경로로 전송됩니다.
/// - **http_timeout_secs**: 아웃바운드 HTTP 호출 타임아웃 (초)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForwardConfig {
    /// 시크릿 식별자
    pub secret_id: String,
    /// 시크릿 값 내 토큰 키 이름
    pub secret_key_name: String,
    /// 수집 엔드포인트 도메인
    pub domain: String,
    /// 수집 경로 (쿼리 포함 가능)
    pub ingest_path: String,
    /// HTTP 타임아웃 (초)
    pub http_timeout_secs: u64,
}

impl Default for ForwardConfig {
    fn default() -> Self {
        Self {
            secret_id: String::new(),
            secret_key_name: String::new(),
            domain: String::new(),
            ingest_path: String::new(),
            http_timeout_secs: 10,
        }
    }
}

/// 타임아웃 상한 (초)
const MAX_HTTP_TIMEOUT_SECS: u64 = 300;

impl ScanRelayConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ForwardError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 환경변수만으로 설정을 구성합니다 (설정 파일 없음).
    ///
    /// 트리거 처리 전에 필수 필드가 모두 채워졌는지 검증합니다.
    pub fn from_env() -> Result<Self, ForwardError> {
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ForwardError> {
        let path = path.as_ref();
        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| ForwardError::Config {
                    field: "config file".to_owned(),
                    reason: format!("{}: {e}", path.display()),
                })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, ForwardError> {
        toml::from_str(toml_str).map_err(|e| ForwardError::Config {
            field: "config file".to_owned(),
            reason: e.to_string(),
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `SCANRELAY_{SECTION}_{FIELD}`
    /// 예: `SCANRELAY_FORWARD_SECRET_ID=relay/ingest-token`
    pub fn apply_env_overrides(&mut self) {
        override_string(&mut self.general.log_level, "SCANRELAY_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "SCANRELAY_GENERAL_LOG_FORMAT");

        override_string(&mut self.forward.secret_id, "SCANRELAY_FORWARD_SECRET_ID");
        override_string(
            &mut self.forward.secret_key_name,
            "SCANRELAY_FORWARD_SECRET_KEY_NAME",
        );
        override_string(&mut self.forward.domain, "SCANRELAY_FORWARD_DOMAIN");
        override_string(&mut self.forward.ingest_path, "SCANRELAY_FORWARD_INGEST_PATH");
        override_u64(
            &mut self.forward.http_timeout_secs,
            "SCANRELAY_FORWARD_HTTP_TIMEOUT_SECS",
        );
    }

    /// 전체 설정의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ForwardError> {
        self.general.validate()?;
        self.forward.validate()?;
        Ok(())
    }
}

impl GeneralConfig {
    /// 로깅 설정을 검증합니다.
    pub fn validate(&self) -> Result<(), ForwardError> {
        if self.log_level.is_empty() {
            return Err(ForwardError::Config {
                field: "general.log_level".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }
        if self.log_format != "json" && self.log_format != "pretty" {
            return Err(ForwardError::Config {
                field: "general.log_format".to_owned(),
                reason: format!("unknown format '{}', expected 'json' or 'pretty'", self.log_format),
            });
        }
        Ok(())
    }
}

impl ForwardConfig {
    /// 전달 설정을 검증합니다.
    ///
    /// # 검증 규칙
    ///
    /// - `secret_id`, `secret_key_name`: 비어있으면 안 됨
    /// - `domain`: 비어있으면 안 되고 스킴(`://`)이나 경로(`/`)를 포함하지 않음
    /// - `ingest_path`: `/`로 시작해야 함
    /// - `http_timeout_secs`: 1-300
    pub fn validate(&self) -> Result<(), ForwardError> {
        if self.secret_id.is_empty() {
            return Err(ForwardError::Config {
                field: "forward.secret_id".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }
        if self.secret_key_name.is_empty() {
            return Err(ForwardError::Config {
                field: "forward.secret_key_name".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }
        if self.domain.is_empty() {
            return Err(ForwardError::Config {
                field: "forward.domain".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }
        if self.domain.contains("://") || self.domain.contains('/') {
            return Err(ForwardError::Config {
                field: "forward.domain".to_owned(),
                reason: "must be a bare host name without scheme or path".to_owned(),
            });
        }
        if !self.ingest_path.starts_with('/') {
            return Err(ForwardError::Config {
                field: "forward.ingest_path".to_owned(),
                reason: "must start with '/'".to_owned(),
            });
        }
        if self.http_timeout_secs == 0 || self.http_timeout_secs > MAX_HTTP_TIMEOUT_SECS {
            return Err(ForwardError::Config {
                field: "forward.http_timeout_secs".to_owned(),
                reason: format!("must be 1-{MAX_HTTP_TIMEOUT_SECS}"),
            });
        }
        Ok(())
    }

    /// 원본 알림 전송용 기본 경로를 반환합니다 (쿼리 문자열 제거).
    ///
    /// 이벤트 전송에는 쿼리가 포함된 `ingest_path` 전체를 사용합니다.
    pub fn base_ingest_path(&self) -> &str {
        match self.ingest_path.find('?') {
            Some(idx) => &self.ingest_path[..idx],
            None => &self.ingest_path,
        }
    }
}

/// 환경변수가 설정되어 있으면 문자열 필드를 오버라이드합니다.
fn override_string(field: &mut String, env_key: &str) {
    if let Ok(value) = std::env::var(env_key)
        && !value.is_empty()
    {
        *field = value;
    }
}

/// 환경변수가 설정되어 있으면 u64 필드를 오버라이드합니다.
fn override_u64(field: &mut u64, env_key: &str) {
    if let Ok(value) = std::env::var(env_key)
        && let Ok(parsed) = value.parse::<u64>()
    {
        *field = parsed;
    }
}
