//! 전달 오케스트레이터 — 트리거 한 건을 끝까지 처리합니다.
//!
//! [`ScanForwarder`]는 호출당 한 번 생성되어 다음 순서로 동작합니다.
//!
//! 1. 트리거 알림 검증
//! 2. 인증 토큰 해석 (호출당 최대 한 번)
//! 3. 원본 알림을 기본 수집 경로로 전송
//! 4. 페이지 단위 루프: findings 조회 → 이벤트 확장 → 개별 전송
//!
//! # 실패 정책
//!
//! 준비 단계(검증, 토큰, findings 조회)와 페이지네이션 루프 감지는
//! [`ForwardError`]로 호출 전체를 중단합니다. 개별 전송 실패는
//! [`DeliveryOutcome`] 값으로 기록·집계 후 계속 진행하며, 모든 전송이
//! 실패해도 호출 자체는 성공으로 끝납니다.
//!
//! # 순서 보장
//!
//! 페이지 N의 이벤트 전송이 모두 끝난 뒤에만 페이지 N+1을 조회합니다.
//! 페이지 내 이벤트는 스캐너가 반환한 순서대로 전송됩니다.

use serde::Serialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::config::ForwardConfig;
use crate::error::ForwardError;
use crate::findings::FindingsFetcher;
use crate::materialize::expand;
use crate::metrics::{
    FORWARD_DELIVERY_FAILURES_TOTAL, FORWARD_EVENTS_SENT_TOTAL, FORWARD_FATAL_ERRORS_TOTAL,
    FORWARD_NOTIFICATIONS_SENT_TOTAL, FORWARD_PAGES_FETCHED_TOTAL, LABEL_KIND,
};
use crate::secret::SecretProvider;
use crate::sink::{DeliveryOutcome, PipelineSink};
use crate::trigger::TriggerNotification;

/// 호출 한 번의 처리 결과 요약
///
/// 비치명적 전송 실패 집계를 포함합니다. 실패가 있어도 호출은 성공입니다.
#[derive(Debug, Clone, Serialize)]
pub struct ForwardReport {
    /// 호출 식별자 (로그 상관관계용)
    pub invocation_id: String,
    /// 원본 알림 전송 성공 여부
    pub notification_delivered: bool,
    /// 조회한 페이지 수
    pub pages_fetched: u64,
    /// 페이지에서 확인한 finding 총 수
    pub findings_seen: u64,
    /// 수집 엔드포인트가 수락한 이벤트 수
    pub events_delivered: u64,
    /// HTTP 거부(상태 300 이상)로 실패한 전송 수
    pub deliveries_rejected: u64,
    /// 네트워크 단절로 실패한 전송 수
    pub deliveries_unreachable: u64,
}

impl ForwardReport {
    fn new(invocation_id: String) -> Self {
        Self {
            invocation_id,
            notification_delivered: false,
            pages_fetched: 0,
            findings_seen: 0,
            events_delivered: 0,
            deliveries_rejected: 0,
            deliveries_unreachable: 0,
        }
    }

    /// 비치명적 전송 실패의 총합을 반환합니다.
    pub fn delivery_failures(&self) -> u64 {
        self.deliveries_rejected + self.deliveries_unreachable
    }
}

/// 전달 오케스트레이터
///
/// 시크릿 저장소, findings 소스, 수집 싱크를 트레이트로 주입받아
/// 테스트에서는 모든 협력자를 목으로 대체할 수 있습니다.
pub struct ScanForwarder<P, F, S> {
    config: ForwardConfig,
    secrets: P,
    fetcher: F,
    sink: S,
}

impl<P, F, S> ScanForwarder<P, F, S>
where
    P: SecretProvider,
    F: FindingsFetcher,
    S: PipelineSink,
{
    /// 검증된 설정과 협력자들로 오케스트레이터를 생성합니다.
    ///
    /// # Errors
    ///
    /// 설정 검증 실패 시 `Config` 에러 반환
    pub fn new(config: ForwardConfig, secrets: P, fetcher: F, sink: S) -> Result<Self, ForwardError> {
        config.validate()?;
        Ok(Self {
            config,
            secrets,
            fetcher,
            sink,
        })
    }

    /// 시크릿 제공자에 대한 참조를 반환합니다.
    pub fn secrets(&self) -> &P {
        &self.secrets
    }

    /// findings fetcher에 대한 참조를 반환합니다.
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// 수집 싱크에 대한 참조를 반환합니다.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// 트리거 알림 한 건을 끝까지 처리합니다.
    ///
    /// # Errors
    ///
    /// 트리거 검증, 토큰 해석, findings 조회 실패 및 페이지네이션 루프는
    /// 치명적이며 즉시 반환됩니다. 개별 전송 실패는 에러가 아닙니다.
    pub async fn forward(
        &self,
        trigger: &TriggerNotification,
    ) -> Result<ForwardReport, ForwardError> {
        let mut report = ForwardReport::new(uuid::Uuid::new_v4().to_string());

        let result = self.run(trigger, &mut report).await;
        if let Err(err) = &result {
            metrics::counter!(FORWARD_FATAL_ERRORS_TOTAL, LABEL_KIND => err.kind()).increment(1);
            error!(
                invocation_id = %report.invocation_id,
                kind = err.kind(),
                error = %err,
                "forward invocation aborted"
            );
        }
        result.map(|()| report)
    }

    async fn run(
        &self,
        trigger: &TriggerNotification,
        report: &mut ForwardReport,
    ) -> Result<(), ForwardError> {
        trigger.validate()?;

        let repository = trigger.detail.repository_name.as_str();
        let digest = trigger.detail.image_digest.as_str();
        info!(
            invocation_id = %report.invocation_id,
            region = %trigger.region,
            repository,
            digest,
            "processing scan completion trigger"
        );

        // 토큰은 호출당 한 번만 해석하여 모든 전송에 재사용한다
        let token = self
            .secrets
            .resolve(&self.config.secret_id, &self.config.secret_key_name)
            .await?;

        // 원본 알림은 쿼리가 제거된 기본 경로로 전송한다
        let notification_payload = serde_json::to_value(trigger).map_err(|e| {
            ForwardError::MalformedTrigger {
                reason: format!("trigger not serializable: {e}"),
            }
        })?;
        let outcome = self
            .sink
            .send(&notification_payload, &token, self.config.base_ingest_path())
            .await;
        report.notification_delivered = outcome.is_accepted();
        if outcome.is_accepted() {
            metrics::counter!(FORWARD_NOTIFICATIONS_SENT_TOTAL).increment(1);
        } else {
            self.record_failure(report, &outcome, "notification");
        }

        let mut continuation: Option<String> = None;
        loop {
            let page = self
                .fetcher
                .fetch(digest, repository, continuation.as_deref())
                .await?;
            report.pages_fetched += 1;
            report.findings_seen += page.findings.len() as u64;
            metrics::counter!(FORWARD_PAGES_FETCHED_TOTAL).increment(1);

            info!(
                invocation_id = %report.invocation_id,
                page = report.pages_fetched,
                findings = page.findings.len(),
                has_next = page.next_token.is_some(),
                "fetched findings page"
            );

            // 페이지 N의 이벤트를 모두 전송한 뒤에만 N+1을 조회한다
            let events = expand(&page, &trigger.region, &trigger.detail.image_tags);
            for event in &events {
                let payload = json!([event]);
                let outcome = self
                    .sink
                    .send(&payload, &token, &self.config.ingest_path)
                    .await;
                if outcome.is_accepted() {
                    report.events_delivered += 1;
                    metrics::counter!(FORWARD_EVENTS_SENT_TOTAL).increment(1);
                } else {
                    self.record_failure(report, &outcome, "event");
                }
            }

            // 빈 문자열 토큰은 fetcher가 None으로 정규화한다
            let next = page.next_token;
            match next {
                Some(token) => {
                    if continuation.as_deref() == Some(token.as_str()) {
                        return Err(ForwardError::PaginationLoopDetected { token });
                    }
                    continuation = Some(token);
                }
                None => break,
            }
        }

        info!(
            invocation_id = %report.invocation_id,
            pages = report.pages_fetched,
            findings = report.findings_seen,
            delivered = report.events_delivered,
            failures = report.delivery_failures(),
            "forward invocation complete"
        );
        Ok(())
    }

    /// 비치명적 전송 실패를 집계하고 기록합니다.
    fn record_failure(&self, report: &mut ForwardReport, outcome: &DeliveryOutcome, payload: &str) {
        match outcome {
            DeliveryOutcome::Rejected { status } => {
                report.deliveries_rejected += 1;
                warn!(
                    invocation_id = %report.invocation_id,
                    payload,
                    status,
                    "delivery rejected, continuing"
                );
            }
            DeliveryOutcome::Unreachable { reason } => {
                report.deliveries_unreachable += 1;
                warn!(
                    invocation_id = %report.invocation_id,
                    payload,
                    reason = %reason,
                    "endpoint unreachable, continuing"
                );
            }
            DeliveryOutcome::Accepted { .. } => return,
        }
        metrics::counter!(FORWARD_DELIVERY_FAILURES_TOTAL, LABEL_KIND => outcome.kind().to_owned())
            .increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_sums_delivery_failures() {
        let mut report = ForwardReport::new("test".to_owned());
        report.deliveries_rejected = 2;
        report.deliveries_unreachable = 3;
        assert_eq!(report.delivery_failures(), 5);
    }

    #[test]
    fn report_serializes_counts() {
        let mut report = ForwardReport::new("abc-123".to_owned());
        report.pages_fetched = 2;
        report.events_delivered = 7;
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["invocation_id"], "abc-123");
        assert_eq!(value["pages_fetched"], 2);
        assert_eq!(value["events_delivered"], 7);
    }
}
