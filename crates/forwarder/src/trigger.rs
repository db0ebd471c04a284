//! 트리거 알림 — 이미지 스캔 완료 이벤트
//!
//! [`TriggerNotification`]은 전달 호출 한 번을 시작시키는 인바운드 이벤트입니다.
//! 수신 후 불변이며, 호출이 끝나면 폐기됩니다.
//!
//! 인바운드 JSON 형태:
//! ```json
//! {
//!   "region": "eu-west-1",
//!   "detail": {
//!     "image-digest": "sha256:abc...",
//!     "repository-name": "app",
//!     "image-tags": ["v1"]
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ForwardError;

/// 이미지 스캔 완료 알림
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerNotification {
    /// 스캔이 수행된 리전
    pub region: String,
    /// 이미지 상세 정보
    pub detail: TriggerDetail,
}

/// 트리거 알림의 이미지 상세 정보
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerDetail {
    /// 스캔된 이미지의 콘텐츠 주소 다이제스트
    #[serde(rename = "image-digest")]
    pub image_digest: String,
    /// 저장소 이름
    #[serde(rename = "repository-name")]
    pub repository_name: String,
    /// 이미지 태그 목록 (비어 있을 수 있음)
    #[serde(rename = "image-tags", default)]
    pub image_tags: Vec<String>,
}

impl TriggerNotification {
    /// JSON 문자열에서 트리거 알림을 파싱하고 검증합니다.
    ///
    /// # Errors
    ///
    /// 필수 필드 누락 또는 JSON 파싱 실패 시 `MalformedTrigger` 반환
    pub fn parse(raw: &str) -> Result<Self, ForwardError> {
        let trigger: Self =
            serde_json::from_str(raw).map_err(|e| ForwardError::MalformedTrigger {
                reason: e.to_string(),
            })?;
        trigger.validate()?;
        Ok(trigger)
    }

    /// `serde_json::Value`에서 트리거 알림을 파싱하고 검증합니다.
    pub fn from_json(value: serde_json::Value) -> Result<Self, ForwardError> {
        let trigger: Self =
            serde_json::from_value(value).map_err(|e| ForwardError::MalformedTrigger {
                reason: e.to_string(),
            })?;
        trigger.validate()?;
        Ok(trigger)
    }

    /// 필수 필드가 모두 채워져 있는지 검증합니다.
    ///
    /// `image-tags`는 비어 있어도 유효합니다.
    pub fn validate(&self) -> Result<(), ForwardError> {
        if self.region.is_empty() {
            return Err(ForwardError::MalformedTrigger {
                reason: "field 'region' is empty".to_owned(),
            });
        }
        if self.detail.image_digest.is_empty() {
            return Err(ForwardError::MalformedTrigger {
                reason: "field 'detail.image-digest' is empty".to_owned(),
            });
        }
        if self.detail.repository_name.is_empty() {
            return Err(ForwardError::MalformedTrigger {
                reason: "field 'detail.repository-name' is empty".to_owned(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "region": "eu-west-1",
        "detail": {
            "image-digest": "sha256:abc",
            "repository-name": "app",
            "image-tags": ["v1", "latest"]
        }
    }"#;

    #[test]
    fn parse_valid_trigger() {
        let trigger = TriggerNotification::parse(SAMPLE).unwrap();
        assert_eq!(trigger.region, "eu-west-1");
        assert_eq!(trigger.detail.image_digest, "sha256:abc");
        assert_eq!(trigger.detail.repository_name, "app");
        assert_eq!(trigger.detail.image_tags, vec!["v1", "latest"]);
    }

    #[test]
    fn parse_without_tags_defaults_to_empty() {
        let raw = r#"{
            "region": "eu-west-1",
            "detail": {
                "image-digest": "sha256:abc",
                "repository-name": "app"
            }
        }"#;
        let trigger = TriggerNotification::parse(raw).unwrap();
        assert!(trigger.detail.image_tags.is_empty());
    }

    #[test]
    fn parse_rejects_missing_digest() {
        let raw = r#"{
            "region": "eu-west-1",
            "detail": { "repository-name": "app" }
        }"#;
        let err = TriggerNotification::parse(raw).unwrap_err();
        assert!(matches!(err, ForwardError::MalformedTrigger { .. }));
    }

    #[test]
    fn parse_rejects_missing_detail() {
        let raw = r#"{ "region": "eu-west-1" }"#;
        assert!(TriggerNotification::parse(raw).is_err());
    }

    #[test]
    fn parse_rejects_invalid_json() {
        assert!(TriggerNotification::parse("{not json").is_err());
    }

    #[test]
    fn validate_rejects_empty_region() {
        let mut trigger = TriggerNotification::parse(SAMPLE).unwrap();
        trigger.region = String::new();
        let err = trigger.validate().unwrap_err();
        assert!(err.to_string().contains("region"));
    }

    #[test]
    fn validate_rejects_empty_repository_name() {
        let mut trigger = TriggerNotification::parse(SAMPLE).unwrap();
        trigger.detail.repository_name = String::new();
        assert!(trigger.validate().is_err());
    }

    #[test]
    fn from_json_accepts_value() {
        let value: serde_json::Value = serde_json::from_str(SAMPLE).unwrap();
        let trigger = TriggerNotification::from_json(value).unwrap();
        assert_eq!(trigger.detail.repository_name, "app");
    }

    #[test]
    fn serialize_preserves_dashed_keys() {
        let trigger = TriggerNotification::parse(SAMPLE).unwrap();
        let value = serde_json::to_value(&trigger).unwrap();
        assert!(value["detail"]["image-digest"].is_string());
        assert!(value["detail"]["repository-name"].is_string());
        assert!(value["detail"]["image-tags"].is_array());
    }
}
