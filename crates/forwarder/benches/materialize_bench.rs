//! 이벤트 구체화 벤치마크
//!
//! 페이지 → 이벤트 팬아웃과 이벤트 직렬화 성능을 측정합니다.

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use scanrelay_forwarder::findings::{Finding, FindingsPage};
use scanrelay_forwarder::materialize::expand;
use serde_json::json;

fn sample_page(finding_count: usize) -> FindingsPage {
    FindingsPage {
        repository_name: "payments-api".to_owned(),
        image_digest: "sha256:9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
            .to_owned(),
        scan_status: Some("COMPLETE".to_owned()),
        scan_completed_at: Some("1724457600".to_owned()),
        findings: (0..finding_count)
            .map(|i| {
                Finding::new(json!({
                    "name": format!("CVE-2024-{i:05}"),
                    "description": "heap buffer overflow in image decoding path",
                    "uri": format!("https://cve.example.com/CVE-2024-{i:05}"),
                    "severity": "HIGH",
                    "attributes": [
                        {"key": "package_name", "value": "libimage"},
                        {"key": "package_version", "value": "2.4.1"},
                    ],
                }))
            })
            .collect(),
        next_token: None,
    }
}

fn bench_expand(c: &mut Criterion) {
    let tags = vec!["v1".to_owned(), "latest".to_owned()];

    let mut group = c.benchmark_group("materialize_expand");
    for count in [10usize, 100, 1000] {
        let page = sample_page(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_function(format!("expand_{count}_findings"), |b| {
            b.iter(|| expand(black_box(&page), black_box("eu-west-1"), black_box(&tags)))
        });
    }
    group.finish();
}

fn bench_event_serialization(c: &mut Criterion) {
    let page = sample_page(100);
    let events = expand(&page, "eu-west-1", &["v1".to_owned()]);

    let mut group = c.benchmark_group("materialize_serialization");
    group.throughput(Throughput::Elements(1));

    group.bench_function("event_to_json", |b| {
        b.iter(|| serde_json::to_string(black_box(&events[0])).unwrap())
    });

    group.bench_function("singleton_array_payload", |b| {
        b.iter(|| serde_json::to_string(&json!([black_box(&events[0])])).unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_expand, bench_event_serialization);
criterion_main!(benches);
