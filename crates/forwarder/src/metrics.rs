//! 메트릭 이름 상수 및 설명 등록
//!
//! 전달 파이프라인이 노출하는 메트릭 이름을 한곳에 모아 오타를 방지합니다.
//! 모든 메트릭은 `scanrelay_` 접두사를 사용합니다.
//!
//! # 레이블 규칙
//!
//! - `kind`: 전달 결과 또는 에러 종류 (`accepted`, `rejected`, `unreachable`,
//!   `secret_unavailable` 등)

/// 결과/에러 종류 레이블 키
pub const LABEL_KIND: &str = "kind";

/// 조회한 findings 페이지 수
pub const FORWARD_PAGES_FETCHED_TOTAL: &str = "scanrelay_forward_pages_fetched_total";

/// 전송 성공한 이벤트 수
pub const FORWARD_EVENTS_SENT_TOTAL: &str = "scanrelay_forward_events_sent_total";

/// 비치명적 전송 실패 수 (kind 레이블로 거부/단절 구분)
pub const FORWARD_DELIVERY_FAILURES_TOTAL: &str = "scanrelay_forward_delivery_failures_total";

/// 전송한 원본 트리거 알림 수
pub const FORWARD_NOTIFICATIONS_SENT_TOTAL: &str = "scanrelay_forward_notifications_sent_total";

/// 호출을 중단시킨 치명적 에러 수 (kind 레이블로 종류 구분)
pub const FORWARD_FATAL_ERRORS_TOTAL: &str = "scanrelay_forward_fatal_errors_total";

/// 모든 메트릭의 설명을 등록합니다.
///
/// 레코더 설치 직후 한 번 호출합니다.
pub fn describe_all() {
    metrics::describe_counter!(
        FORWARD_PAGES_FETCHED_TOTAL,
        "Number of findings pages fetched from the scan service"
    );
    metrics::describe_counter!(
        FORWARD_EVENTS_SENT_TOTAL,
        "Number of materialized events accepted by the ingestion endpoint"
    );
    metrics::describe_counter!(
        FORWARD_DELIVERY_FAILURES_TOTAL,
        "Number of non-fatal delivery failures, labeled by kind"
    );
    metrics::describe_counter!(
        FORWARD_NOTIFICATIONS_SENT_TOTAL,
        "Number of raw trigger notifications forwarded"
    );
    metrics::describe_counter!(
        FORWARD_FATAL_ERRORS_TOTAL,
        "Number of fatal errors aborting an invocation, labeled by kind"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_names_share_prefix() {
        let names = [
            FORWARD_PAGES_FETCHED_TOTAL,
            FORWARD_EVENTS_SENT_TOTAL,
            FORWARD_DELIVERY_FAILURES_TOTAL,
            FORWARD_NOTIFICATIONS_SENT_TOTAL,
            FORWARD_FATAL_ERRORS_TOTAL,
        ];
        for name in names {
            assert!(name.starts_with("scanrelay_"), "unexpected prefix: {name}");
            assert!(name.ends_with("_total"));
        }
    }

    #[test]
    fn describe_all_without_recorder_does_not_panic() {
        // 레코더 미설치 상태에서 describe는 no-op이어야 한다
        describe_all();
    }
}
