// Wire-level coverage for the reqwest-backed store

use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pentest_findings::config::ApiConfig;
use pentest_findings::model::FindingDraft;
use pentest_findings::remote::{HttpRemoteStore, RemoteError, RemoteStore};

fn store_for(server: &MockServer) -> HttpRemoteStore {
    HttpRemoteStore::new(&ApiConfig {
        base_url: server.uri(),
        timeout_seconds: 5,
    })
    .unwrap()
}

fn finding_json(id: u64, report_id: u64) -> serde_json::Value {
    json!({
        "id": id,
        "report_id": report_id,
        "title": "Stored XSS",
        "description": "Comments render unescaped",
        "risk_level": "high",
    })
}

#[tokio::test]
async fn create_finding_posts_the_normalized_payload() {
    let server = MockServer::start().await;
    // Exact body match: empty optionals must be absent, not null or "".
    Mock::given(method("POST"))
        .and(path("/findings"))
        .and(body_json(json!({
            "report_id": 7,
            "title": "Stored XSS",
            "description": "Comments render unescaped",
            "risk_level": "high",
            "solution": "encode on output",
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(finding_json(42, 7)))
        .expect(1)
        .mount(&server)
        .await;

    let mut draft = FindingDraft::for_report(7);
    draft.title = "Stored XSS".to_string();
    draft.description = "Comments render unescaped".to_string();
    draft.risk_level = pentest_findings::model::RiskLevel::High;
    draft.solution = Some("encode on output".to_string());
    draft.affected_area = Some(String::new());

    let store = store_for(&server);
    let finding = store.create_finding(&draft.normalized()).await.unwrap();
    assert_eq!(finding.id, 42);
    assert_eq!(finding.report_id, 7);
}

#[tokio::test]
async fn missing_report_maps_to_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reports/999"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let report = store.get_report(999).await.unwrap();
    assert!(report.is_none());
}

#[tokio::test]
async fn missing_finding_maps_to_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/findings/999"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let finding = store.get_finding(999).await.unwrap();
    assert!(finding.is_none());
}

#[tokio::test]
async fn server_errors_surface_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reports/7"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let err = store.get_report(7).await.unwrap_err();
    match err {
        RemoteError::Http { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn image_upload_is_multipart_with_a_file_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/findings/42/poc-images"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 9,
            "original_filename": "poc.png",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server);
    let image = store
        .upload_finding_image(42, vec![0x89, 0x50, 0x4e, 0x47], "poc.png")
        .await
        .unwrap();
    assert_eq!(image.id, 9);
    assert_eq!(image.original_filename, "poc.png");

    let requests = server.received_requests().await.unwrap();
    let upload = &requests[0];
    let content_type = upload
        .headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(content_type.starts_with("multipart/form-data"));
    let body = String::from_utf8_lossy(&upload.body);
    assert!(body.contains("name=\"file\""));
    assert!(body.contains("filename=\"poc.png\""));
}

#[tokio::test]
async fn reorder_sends_the_complete_order_under_ordered_ids() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/findings/reorder"))
        .and(body_json(json!({
            "report_id": 7,
            "orderedIds": [2, 1, 3],
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server);
    store.reorder_findings(7, &[2, 1, 3]).await.unwrap();
}

#[tokio::test]
async fn promotion_posts_to_the_knowledge_base_route() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/findings/42/save-to-knowledge-base"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 5,
            "title": "Stored XSS",
            "risk_level": "high",
            "finding_id": 42,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server);
    let template = store.promote_to_template(42).await.unwrap();
    assert_eq!(template.id, 5);
    assert_eq!(template.finding_id, Some(42));
}

#[tokio::test]
async fn delete_routes_hit_finding_and_image_paths() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/findings/42"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/poc-images/9"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server);
    store.delete_finding(42).await.unwrap();
    store.delete_image(9).await.unwrap();
}
