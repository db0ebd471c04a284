//! HTTPS ingestion sink abstraction.
//!
//! The [`PipelineSink`] trait abstracts the remote ingestion endpoint,
//! allowing production code to use [`HttpPipelineSink`] while tests use a
//! mock. Delivery failures are deliberately values, not errors: one bad
//! outbound call must not abort the remaining pipeline, so the orchestrator
//! inspects the returned [`DeliveryOutcome`], logs it and moves on.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};

use crate::error::ForwardError;
use crate::secret::AuthToken;

/// Outcome of one delivery attempt.
///
/// Any HTTP status in `[100, 299]` is accepted. A status of 300 or above is
/// rejected but never retried; transport-level failures (timeout, DNS, TLS)
/// surface as unreachable. Neither non-accepted outcome aborts the
/// invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Endpoint accepted the payload.
    Accepted {
        /// HTTP status code.
        status: u16,
    },
    /// Endpoint answered with a non-success status. Not retried.
    Rejected {
        /// HTTP status code.
        status: u16,
    },
    /// The endpoint could not be reached at the transport level.
    Unreachable {
        /// Transport error description.
        reason: String,
    },
}

impl DeliveryOutcome {
    /// Returns `true` when the payload was accepted.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    /// Outcome kind for structured logging and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Accepted { .. } => "accepted",
            Self::Rejected { .. } => "rejected",
            Self::Unreachable { .. } => "unreachable",
        }
    }
}

impl fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accepted { status } => write!(f, "accepted ({status})"),
            Self::Rejected { status } => write!(f, "rejected ({status})"),
            Self::Unreachable { reason } => write!(f, "unreachable: {reason}"),
        }
    }
}

/// Trait abstracting the ingestion endpoint.
pub trait PipelineSink: Send + Sync {
    /// Delivers one JSON payload to `path` on the configured domain.
    ///
    /// The payload is either the raw trigger notification (JSON object) or a
    /// singleton array carrying one materialized event.
    fn send(
        &self,
        payload: &serde_json::Value,
        token: &AuthToken,
        path: &str,
    ) -> impl Future<Output = DeliveryOutcome> + Send;
}

/// Production sink delivering over HTTPS with `Api-Token` authentication.
pub struct HttpPipelineSink {
    client: reqwest::Client,
    domain: String,
}

impl HttpPipelineSink {
    /// Builds a sink for the given domain with a bounded request timeout.
    pub fn new(domain: impl Into<String>, timeout: Duration) -> Result<Self, ForwardError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ForwardError::Config {
                field: "http client".to_owned(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            client,
            domain: domain.into(),
        })
    }

    /// Full endpoint URL for a given path.
    fn endpoint_url(&self, path: &str) -> String {
        format!("https://{}{}", self.domain, path)
    }
}

impl PipelineSink for HttpPipelineSink {
    async fn send(
        &self,
        payload: &serde_json::Value,
        token: &AuthToken,
        path: &str,
    ) -> DeliveryOutcome {
        let url = self.endpoint_url(path);
        let result = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("Api-Token {}", token.expose()))
            .header(CONTENT_TYPE, "application/json")
            .json(payload)
            .send()
            .await;

        match result {
            Ok(resp) => {
                let status = resp.status().as_u16();
                if (100..300).contains(&status) {
                    DeliveryOutcome::Accepted { status }
                } else {
                    DeliveryOutcome::Rejected { status }
                }
            }
            // reqwest 에러 메시지는 URL은 담지만 헤더(토큰)는 담지 않는다
            Err(e) => DeliveryOutcome::Unreachable {
                reason: e.to_string(),
            },
        }
    }
}
