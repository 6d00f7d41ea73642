//! Unsaved edits survive a remount, and the server does not overwrite them.

use slotedit_engine::{InitialFetch, SaveOutcome};
use tempfile::tempdir;
use wiremock::MockServer;

use crate::common::{engine_for, form_field, mount_document, mount_save_redirect, posted_bodies};

#[tokio::test]
async fn dirty_state_blocks_reload_across_remount() {
    let server = MockServer::start().await;
    mount_document(&server, "csrf-a", "<meta server>", "").await;
    mount_save_redirect(&server).await;
    let state = tempdir().expect("tempdir");

    {
        let mut first = engine_for(&server, state.path());
        first.engine.mount(1280).await;
        first
            .buffers
            .borrow_mut()
            .insert("head".to_string(), "<meta local>".to_string());
        first.engine.unmount();
    }

    let mut second = engine_for(&server, state.path());
    let fetch = second.engine.mount(1280).await;

    assert!(matches!(fetch, InitialFetch::TokenOnly));
    assert_eq!(second.engine.content("head"), Some("<meta local>"));
    assert_eq!(second.engine.baseline("head"), Some("<meta server>"));
    assert_eq!(second.engine.session_token(), Some("csrf-a"));

    let outcome = second.engine.save_slot("head").await.expect("save");
    assert_eq!(outcome, SaveOutcome::Saved);
    let bodies = posted_bodies(&server).await;
    assert_eq!(form_field(&bodies[0], "page_head").as_deref(), Some("<meta local>"));
}

#[tokio::test]
async fn clean_state_is_refreshed_from_server() {
    let server = MockServer::start().await;
    mount_document(&server, "csrf-b", "<meta v2>", "<footer/>").await;
    let state = tempdir().expect("tempdir");

    {
        let mut first = engine_for(&server, state.path());
        first.engine.mount(1280).await;
        first.engine.toggle("tail", true);
        first.engine.unmount();
    }

    let mut second = engine_for(&server, state.path());
    let fetch = second.engine.mount(1280).await;

    assert!(matches!(fetch, InitialFetch::Full));
    assert_eq!(second.engine.content("tail"), Some("<footer/>"));
    assert_eq!(
        second
            .engine
            .active_slots()
            .iter()
            .map(|id| id.as_str())
            .collect::<Vec<_>>(),
        ["head", "tail"]
    );
}

#[tokio::test]
async fn discarding_everything_clears_stored_state() {
    let server = MockServer::start().await;
    mount_document(&server, "csrf-c", "h", "t").await;
    let state = tempdir().expect("tempdir");
    let mut t = engine_for(&server, state.path());
    t.engine.mount(1280).await;
    t.buffers
        .borrow_mut()
        .insert("head".to_string(), "changed".to_string());

    let now = std::time::Instant::now();
    let target = slotedit_engine::DiscardTarget::All;
    t.engine.request_discard(&target, now);
    t.engine.confirm_discard(&target, now);

    assert_eq!(t.engine.content("head"), Some("h"));
    let stored = std::fs::read_dir(state.path())
        .expect("state dir")
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().is_some_and(|x| x == "json"))
        .count();
    assert_eq!(stored, 0);
}
