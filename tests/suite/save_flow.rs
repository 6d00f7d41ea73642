//! Mount, edit and save against a mock document store.

use slotedit_engine::slotedit_transport::TransportError;
use slotedit_engine::slotedit_types::ToastLevel;
use slotedit_engine::{InitialFetch, SaveError, SaveOutcome};
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{
    DOC_PATH, engine_for, form_field, mount_document, mount_save_redirect, posted_bodies,
};

#[tokio::test]
async fn edit_and_save_head_posts_full_document() {
    let server = MockServer::start().await;
    mount_document(&server, "csrf-1", "<meta a>", "<script>t</script>").await;
    mount_save_redirect(&server).await;
    let state = tempdir().expect("tempdir");
    let mut t = engine_for(&server, state.path());

    let fetch = t.engine.mount(1280).await;
    assert!(matches!(fetch, InitialFetch::Full));
    assert_eq!(t.engine.content("head"), Some("<meta a>"));

    t.buffers
        .borrow_mut()
        .insert("head".to_string(), "<meta a><extra>".to_string());
    let outcome = t.engine.save_slot("head").await.expect("save");

    assert_eq!(outcome, SaveOutcome::Saved);
    assert_eq!(t.engine.baseline("head"), Some("<meta a><extra>"));
    assert!(!t.engine.is_dirty("head"));

    let bodies = posted_bodies(&server).await;
    assert_eq!(bodies.len(), 1);
    let body = &bodies[0];
    assert_eq!(form_field(body, "page_head").as_deref(), Some("<meta a><extra>"));
    assert_eq!(
        form_field(body, "page_tail").as_deref(),
        Some("<script>t</script>")
    );
    assert_eq!(form_field(body, "csrf_token").as_deref(), Some("csrf-1"));
}

#[tokio::test]
async fn import_then_save_all() {
    let server = MockServer::start().await;
    mount_document(&server, "csrf-2", "", "").await;
    mount_save_redirect(&server).await;
    let state = tempdir().expect("tempdir");
    let mut t = engine_for(&server, state.path());
    t.engine.mount(1280).await;

    t.engine
        .import_file("tail", "tracking.html", b"<script src=\"/t.js\"></script>")
        .await
        .expect("import");
    assert!(t.engine.is_active("tail"));
    assert!(t.engine.has_unsaved_changes());

    let outcome = t.engine.save_all().await.expect("save all");

    assert_eq!(outcome, SaveOutcome::Saved);
    assert!(!t.engine.has_unsaved_changes());
    let bodies = posted_bodies(&server).await;
    assert_eq!(
        form_field(&bodies[0], "page_tail").as_deref(),
        Some("<script src=\"/t.js\"></script>")
    );
}

#[tokio::test]
async fn server_error_keeps_baseline_and_reports_transient() {
    let server = MockServer::start().await;
    mount_document(&server, "csrf-3", "<meta a>", "").await;
    Mock::given(method("POST"))
        .and(path(DOC_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;
    let state = tempdir().expect("tempdir");
    let mut t = engine_for(&server, state.path());
    t.engine.mount(1280).await;
    t.buffers
        .borrow_mut()
        .insert("head".to_string(), "<meta b>".to_string());

    let err = t.engine.save_slot("head").await.expect_err("503");

    let SaveError::Transport(transport) = &err else {
        panic!("expected transport error, got {err:?}");
    };
    assert!(matches!(transport, TransportError::Rejected { status: 503, .. }));
    assert!(transport.is_transient());
    assert_eq!(t.engine.baseline("head"), Some("<meta a>"));
    assert_eq!(t.engine.content("head"), Some("<meta b>"));
    assert!(t.engine.is_dirty("head"));
    assert_eq!(
        t.toasts.borrow().last().map(|(_, level)| *level),
        Some(ToastLevel::Error)
    );
}

#[tokio::test]
async fn forbidden_save_is_not_transient() {
    let server = MockServer::start().await;
    mount_document(&server, "stale", "", "").await;
    Mock::given(method("POST"))
        .and(path(DOC_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_string("CSRF token mismatch"))
        .mount(&server)
        .await;
    let state = tempdir().expect("tempdir");
    let mut t = engine_for(&server, state.path());
    t.engine.mount(1280).await;
    t.buffers
        .borrow_mut()
        .insert("head".to_string(), "x".to_string());

    let err = t.engine.save_slot("head").await.expect_err("403");

    assert!(matches!(
        err,
        SaveError::Transport(ref e) if !e.is_transient()
    ));
}

#[tokio::test]
async fn unreachable_server_on_mount_keeps_restored_state() {
    let server = MockServer::start().await;
    let settings = crate::common::settings_for(&server);
    drop(server);
    let state = tempdir().expect("tempdir");
    let mut t = crate::common::engine_with(settings, state.path());

    let fetch = t.engine.mount(1280).await;

    let InitialFetch::Failed(err) = fetch else {
        panic!("expected failed fetch");
    };
    assert!(matches!(err, TransportError::Unreachable { .. }));
    assert!(t.engine.session_token().is_none());
    assert_eq!(t.engine.active_slots().len(), 1);
}
