//! Scan findings source abstraction.
//!
//! The [`FindingsFetcher`] trait abstracts the scan-findings service, allowing
//! production code to use [`EcrFindingsFetcher`] while tests use a mock.
//!
//! ```text
//! ┌────────────────┐
//! │  ScanForwarder │
//! └───────┬────────┘
//!         │
//!         ▼
//!  ┌───────────────┐
//!  │FindingsFetcher│ (trait)
//!  └───────────────┘
//!       │      │
//!       ▼      ▼
//!  ┌───────┐ ┌────┐
//!  │  ECR  │ │Mock│
//!  └───────┘ └────┘
//! ```
//!
//! # Pagination
//!
//! A page carries an optional continuation token. The caller passes the token
//! back verbatim on the next call; an absent token means the last page.
//! [`EcrFindingsFetcher`] normalizes an empty-string token to `None` so the
//! caller's termination check stays uniform.

use std::future::Future;

use aws_sdk_ecr::types::ImageIdentifier;
use aws_types::region::Region;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::ForwardError;

/// A single vulnerability/compliance result from the scanner.
///
/// The structure is scanner-defined and opaque to the pipeline: findings are
/// carried verbatim and never mutated, only cloned into outbound events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Finding(serde_json::Value);

impl Finding {
    /// Wraps a raw JSON value as an opaque finding.
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// Borrows the underlying JSON value.
    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

/// One page of scan results for an image.
///
/// Created by a [`FindingsFetcher`] and consumed immediately by the
/// materializer; not retained across pages.
#[derive(Debug, Clone)]
pub struct FindingsPage {
    /// Repository the image belongs to.
    pub repository_name: String,
    /// Content-addressed identity of the scanned image.
    pub image_digest: String,
    /// Scan status reported by the scanner, if any.
    pub scan_status: Option<String>,
    /// Scan completion time (epoch seconds), if reported.
    pub scan_completed_at: Option<String>,
    /// Findings on this page, in scanner order.
    pub findings: Vec<Finding>,
    /// Continuation token; `Some` means more pages exist.
    pub next_token: Option<String>,
}

/// Trait abstracting the scan-findings service.
///
/// # Errors
///
/// Implementations return [`ForwardError::FindingsUnavailable`] when the scan
/// is not yet complete or the image/repository does not exist. Fetch failures
/// are fatal for the invocation: without findings there is nothing to forward.
pub trait FindingsFetcher: Send + Sync {
    /// Fetches one page of findings for an image.
    ///
    /// `continuation` of `None` requests the first page; otherwise it must be
    /// the token returned verbatim by the previous page.
    fn fetch(
        &self,
        image_digest: &str,
        repository_name: &str,
        continuation: Option<&str>,
    ) -> impl Future<Output = Result<FindingsPage, ForwardError>> + Send;
}

/// Production fetcher backed by the ECR `DescribeImageScanFindings` API.
pub struct EcrFindingsFetcher {
    client: aws_sdk_ecr::Client,
}

impl EcrFindingsFetcher {
    /// Creates a fetcher over an existing ECR client.
    pub fn new(client: aws_sdk_ecr::Client) -> Self {
        Self { client }
    }

    /// Loads default AWS configuration for the given region and connects.
    pub async fn connect(region: impl Into<String>) -> Self {
        let conf = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(region.into()))
            .load()
            .await;
        Self::new(aws_sdk_ecr::Client::new(&conf))
    }
}

impl FindingsFetcher for EcrFindingsFetcher {
    async fn fetch(
        &self,
        image_digest: &str,
        repository_name: &str,
        continuation: Option<&str>,
    ) -> Result<FindingsPage, ForwardError> {
        let image_id = ImageIdentifier::builder()
            .image_digest(image_digest)
            .build();

        let resp = self
            .client
            .describe_image_scan_findings()
            .repository_name(repository_name)
            .image_id(image_id)
            .set_next_token(continuation.map(str::to_owned))
            .send()
            .await
            .map_err(|e| ForwardError::FindingsUnavailable {
                repository: repository_name.to_owned(),
                digest: image_digest.to_owned(),
                reason: e.to_string(),
            })?;

        let scan_status = resp
            .image_scan_status()
            .and_then(|s| s.status())
            .map(|s| s.as_str().to_owned());

        let (findings, scan_completed_at) = match resp.image_scan_findings() {
            Some(scan) => {
                let findings = scan.findings().iter().map(finding_to_json).collect();
                let completed = scan
                    .image_scan_completed_at()
                    .map(|dt| dt.secs().to_string());
                (findings, completed)
            }
            None => (Vec::new(), None),
        };

        // 일부 API는 마지막 페이지에서 빈 문자열 토큰을 반환한다
        let next_token = resp
            .next_token()
            .map(str::to_owned)
            .filter(|t| !t.is_empty());

        Ok(FindingsPage {
            repository_name: resp
                .repository_name()
                .unwrap_or(repository_name)
                .to_owned(),
            image_digest: image_digest.to_owned(),
            scan_status,
            scan_completed_at,
            findings,
            next_token,
        })
    }
}

/// Maps one SDK finding struct to an opaque JSON finding.
///
/// Non-string SDK values (severity enum, attribute pairs) are coerced to
/// strings to match the ingestion endpoint's schema tolerance.
fn finding_to_json(finding: &aws_sdk_ecr::types::ImageScanFinding) -> Finding {
    let attributes: Vec<serde_json::Value> = finding
        .attributes()
        .iter()
        .map(|attr| {
            json!({
                "key": attr.key(),
                "value": attr.value().unwrap_or_default(),
            })
        })
        .collect();

    Finding::new(json!({
        "name": finding.name().unwrap_or_default(),
        "description": finding.description().unwrap_or_default(),
        "uri": finding.uri().unwrap_or_default(),
        "severity": finding.severity().map(|s| s.as_str()).unwrap_or_default(),
        "attributes": attributes,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_ecr::types::{Attribute, FindingSeverity, ImageScanFinding};

    #[test]
    fn finding_serde_is_transparent() {
        let finding = Finding::new(json!({"name": "CVE-2024-0001", "severity": "HIGH"}));
        let serialized = serde_json::to_string(&finding).unwrap();
        assert_eq!(serialized, r#"{"name":"CVE-2024-0001","severity":"HIGH"}"#);

        let deserialized: Finding = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, finding);
    }

    #[test]
    fn finding_to_json_maps_core_fields() {
        let sdk_finding = ImageScanFinding::builder()
            .name("CVE-2024-0001")
            .description("buffer overflow in libfoo")
            .uri("https://cve.example.com/CVE-2024-0001")
            .severity(FindingSeverity::High)
            .attributes(
                Attribute::builder()
                    .key("package_name")
                    .value("libfoo")
                    .build()
                    .unwrap(),
            )
            .build();

        let finding = finding_to_json(&sdk_finding);
        let value = finding.as_value();
        assert_eq!(value["name"], "CVE-2024-0001");
        assert_eq!(value["severity"], "HIGH");
        assert_eq!(value["attributes"][0]["key"], "package_name");
        assert_eq!(value["attributes"][0]["value"], "libfoo");
    }

    #[test]
    fn finding_to_json_tolerates_missing_fields() {
        let sdk_finding = ImageScanFinding::builder().build();
        let finding = finding_to_json(&sdk_finding);
        let value = finding.as_value();
        assert_eq!(value["name"], "");
        assert_eq!(value["severity"], "");
        assert!(value["attributes"].as_array().unwrap().is_empty());
    }

    #[test]
    fn page_with_token_signals_more_pages() {
        let page = FindingsPage {
            repository_name: "app".to_owned(),
            image_digest: "sha256:abc".to_owned(),
            scan_status: Some("COMPLETE".to_owned()),
            scan_completed_at: None,
            findings: vec![],
            next_token: Some("p2".to_owned()),
        };
        assert!(page.next_token.is_some());
        assert!(page.findings.is_empty());
    }
}
