//! 전달 파이프라인 에러 타입
//!
//! [`ForwardError`]는 한 번의 전달 호출 전체를 중단시키는 치명적 에러만 담습니다.
//! 개별 전송 실패(HTTP 거부, 네트워크 단절)는 에러가 아니라
//! [`DeliveryOutcome`](crate::sink::DeliveryOutcome) 값으로 표현되어
//! 오케스트레이터가 기록 후 계속 진행합니다.
//!
//! # 에러 카테고리
//!
//! - **트리거 검증**: `MalformedTrigger`
//! - **시크릿 조회**: `SecretUnavailable`, `SecretKeyMissing`
//! - **스캔 결과 조회**: `FindingsUnavailable`
//! - **페이지네이션**: `PaginationLoopDetected`
//! - **설정**: `Config`

/// 전달 파이프라인 치명적 에러
///
/// 이 타입의 모든 variant는 호출 전체의 실패를 의미합니다.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    /// 트리거 알림에 필수 필드 누락 또는 파싱 불가
    #[error("malformed trigger notification: {reason}")]
    MalformedTrigger {
        /// 누락되거나 잘못된 필드 설명
        reason: String,
    },

    /// 시크릿 저장소 접근 실패 또는 시크릿 식별자 없음
    #[error("secret unavailable: {secret_id}: {reason}")]
    SecretUnavailable {
        /// 시크릿 식별자
        secret_id: String,
        /// 실패 사유
        reason: String,
    },

    /// 시크릿 값에 요청한 키가 없음
    #[error("secret key missing: '{key}' not found in secret '{secret_id}'")]
    SecretKeyMissing {
        /// 시크릿 식별자
        secret_id: String,
        /// 요청한 키 이름
        key: String,
    },

    /// 스캔 결과 조회 실패 (스캔 미완료 또는 이미지/저장소 없음)
    #[error("findings unavailable: {repository}@{digest}: {reason}")]
    FindingsUnavailable {
        /// 저장소 이름
        repository: String,
        /// 이미지 다이제스트
        digest: String,
        /// 실패 사유
        reason: String,
    },

    /// 동일한 continuation token이 연속으로 반환됨
    #[error("pagination loop detected: token '{token}' repeated")]
    PaginationLoopDetected {
        /// 반복된 토큰
        token: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },
}

impl ForwardError {
    /// 구조화 로깅 및 메트릭 레이블용 에러 종류명을 반환합니다.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedTrigger { .. } => "malformed_trigger",
            Self::SecretUnavailable { .. } => "secret_unavailable",
            Self::SecretKeyMissing { .. } => "secret_key_missing",
            Self::FindingsUnavailable { .. } => "findings_unavailable",
            Self::PaginationLoopDetected { .. } => "pagination_loop_detected",
            Self::Config { .. } => "config",
        }
    }
}
