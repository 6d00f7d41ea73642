//! HTTP transport tests against a mock document store.

use slotedit_transport::{HttpTransport, TransportError};
use slotedit_types::FieldMap;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fields(pairs: &[(&str, &str)]) -> FieldMap {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

#[tokio::test]
async fn fetch_document_parses_token_and_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/page/1"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token": "tok-1",
            "fields": { "head_html": "<meta a>", "tail_html": "" }
        })))
        .mount(&server)
        .await;

    let transport = HttpTransport::new().unwrap();
    let doc = transport
        .fetch_document(&format!("{}/admin/page/1", server.uri()))
        .await
        .unwrap();
    assert_eq!(doc.session_token, "tok-1");
    assert_eq!(doc.fields["head_html"], "<meta a>");
    assert_eq!(doc.fields["tail_html"], "");
}

#[tokio::test]
async fn fetch_document_rejects_missing_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "fields": {}
        })))
        .mount(&server)
        .await;

    let transport = HttpTransport::new().unwrap();
    let err = transport.fetch_document(&server.uri()).await.unwrap_err();
    assert!(matches!(err, TransportError::Malformed { .. }));
}

#[tokio::test]
async fn fetch_document_surfaces_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_string("login required"))
        .mount(&server)
        .await;

    let transport = HttpTransport::new().unwrap();
    let err = transport.fetch_document(&server.uri()).await.unwrap_err();
    match err {
        TransportError::Rejected { status, detail } => {
            assert_eq!(status, 401);
            assert_eq!(detail, "login required");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn post_document_sends_every_field_as_multipart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/save"))
        .and(body_string_contains("name=\"head_html\""))
        .and(body_string_contains("<meta a><extra>"))
        .and(body_string_contains("name=\"csrf_token\""))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpTransport::new().unwrap();
    let receipt = transport
        .post_document(
            &format!("{}/save", server.uri()),
            &fields(&[
                ("head_html", "<meta a><extra>"),
                ("tail_html", ""),
                ("csrf_token", "tok-1"),
            ]),
        )
        .await
        .unwrap();
    assert_eq!(receipt.status, 200);
}

#[tokio::test]
async fn post_document_treats_redirect_as_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/admin/page/1"))
        .mount(&server)
        .await;

    let transport = HttpTransport::new().unwrap();
    let receipt = transport
        .post_document(&server.uri(), &fields(&[("csrf_token", "t")]))
        .await
        .unwrap();
    assert_eq!(receipt.status, 302);
}

#[tokio::test]
async fn post_document_rejection_is_not_transient_for_forbidden() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_string("<h1>\n Forbidden \n</h1>"))
        .mount(&server)
        .await;

    let transport = HttpTransport::new().unwrap();
    let err = transport
        .post_document(&server.uri(), &fields(&[("csrf_token", "stale")]))
        .await
        .unwrap_err();
    assert!(!err.is_transient());
    assert!(matches!(
        err,
        TransportError::Rejected { status: 403, ref detail } if detail == "<h1> Forbidden </h1>"
    ));
}

#[tokio::test]
async fn post_document_unreachable_server() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let transport = HttpTransport::new().unwrap();
    let err = transport
        .post_document(&uri, &fields(&[("csrf_token", "t")]))
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Unreachable { .. }));
    assert!(err.is_transient());
}
