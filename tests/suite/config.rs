//! Configuration file to running engine.

use slotedit_engine::slotedit_config::{EditorSettings, TomlConfig, slots_from_source};
use slotedit_engine::slotedit_types::EngineKind;
use slotedit_engine::{InitialFetch, ToggleOutcome};
use tempfile::tempdir;
use wiremock::MockServer;

use crate::common::{DOC_PATH, engine_with, mount_document};

#[tokio::test]
async fn toml_config_drives_engine() {
    let server = MockServer::start().await;
    mount_document(&server, "tok", "", "").await;
    let toml = format!(
        r#"
[server]
endpoint = "{}{DOC_PATH}"

[editor]
max_active_slots = 1
desktop_breakpoint = 900

[[slots]]
id = "head"
label = "Head HTML"
field = "page_head"

[[slots]]
id = "tail"
field = "page_tail"
"#,
        server.uri()
    );
    let config = TomlConfig::from_toml_str(&toml).expect("toml");
    let settings = EditorSettings::resolve(&config).expect("settings");
    let slots = slots_from_source(&config).expect("slots");

    assert_eq!(settings.kind, EngineKind::Fields);
    assert_eq!(slots.len(), 2);
    assert_eq!(slots[1].label(), "tail");

    let state = tempdir().expect("tempdir");
    let mut t = engine_with(settings, state.path());
    assert!(matches!(t.engine.mount(1000).await, InitialFetch::Full));

    assert_eq!(
        t.engine.toggle("tail", true),
        ToggleOutcome::Rejected { limit: 1 }
    );
}
