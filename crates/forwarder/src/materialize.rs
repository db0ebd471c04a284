//! 이벤트 구체화 — 페이지 단위 스캔 결과를 개별 이벤트로 팬아웃합니다.
//!
//! [`expand`]는 I/O가 없는 순수 변환입니다. 페이지의 각 finding마다
//! [`MaterializedEvent`] 하나를 생성하며, 이벤트는 페이지 컨텍스트의 복사본에
//! finding 하나짜리 시퀀스와 트리거의 리전/태그를 담습니다.
//!
//! # 팬아웃 계약
//!
//! - finding k개 → 이벤트 k개, 입력 순서 유지
//! - 각 이벤트의 findings 시퀀스 길이는 정확히 1
//! - finding 0개인 페이지 → 빈 시퀀스 (에러 아님)
//!
//! 이벤트 간 구조 공유는 없습니다. 가변 필드(findings, region, imageTags)는
//! 값 복사로 채워지므로 한 이벤트를 변경해도 다른 이벤트에 영향이 없습니다.

use serde::{Deserialize, Serialize};

use crate::findings::{Finding, FindingsPage};

/// 다운스트림으로 전송되는 개별 이벤트
///
/// 페이지 컨텍스트에 트리거의 리전과 이미지 태그를 더한 자기완결 레코드이며,
/// findings 시퀀스는 항상 원소 하나를 담습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterializedEvent {
    /// 저장소 이름
    pub repository_name: String,
    /// 이미지 다이제스트
    pub image_digest: String,
    /// 스캔 상태 (스캐너가 보고한 경우)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_status: Option<String>,
    /// 스캔 완료 시각 (epoch 초 문자열)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_completed_at: Option<String>,
    /// 트리거 알림의 리전
    pub region: String,
    /// 트리거 알림의 이미지 태그 목록
    pub image_tags: Vec<String>,
    /// 단일 finding 시퀀스 (항상 길이 1)
    pub findings: Vec<Finding>,
}

impl MaterializedEvent {
    /// 페이지 컨텍스트와 finding 하나로 이벤트를 생성합니다.
    ///
    /// 가변 필드만 명시적으로 복사하며, finding 슬롯은 값 복제로 채워
    /// 이벤트 간 참조 공유가 발생하지 않습니다.
    fn from_page(page: &FindingsPage, finding: &Finding, region: &str, tags: &[String]) -> Self {
        Self {
            repository_name: page.repository_name.clone(),
            image_digest: page.image_digest.clone(),
            scan_status: page.scan_status.clone(),
            scan_completed_at: page.scan_completed_at.clone(),
            region: region.to_owned(),
            image_tags: tags.to_vec(),
            findings: vec![finding.clone()],
        }
    }
}

/// 페이지의 finding들을 개별 이벤트 시퀀스로 확장합니다.
///
/// 순수 변환이며 입력 순서를 유지합니다. finding이 없는 페이지는
/// 빈 시퀀스를 반환합니다.
pub fn expand(page: &FindingsPage, region: &str, image_tags: &[String]) -> Vec<MaterializedEvent> {
    page.findings
        .iter()
        .map(|finding| MaterializedEvent::from_page(page, finding, region, image_tags))
        .collect()
}
