//! Shared test utilities and fixtures
//!
//! Engines here run against the real HTTP transport (pointed at a wiremock
//! document store) and real file storage in a temp dir. Only the widget and UI
//! are in-memory.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use slotedit_engine::slotedit_config::EditorSettings;
use slotedit_engine::slotedit_transport::HttpTransport;
use slotedit_engine::slotedit_types::{
    EngineKind, SlotId, SlotSpec, SlotView, ToastLevel, ViewMode,
};
use slotedit_engine::{
    ChangeNotifier, DiscardTarget, Disposable, Engine, FieldMappedHooks, FileStorage, Ui, Widget,
    WidgetFactory,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const DOC_PATH: &str = "/admin/pages/7/edit";

/// Live widget values keyed by slot id, shared with the test body.
pub type Buffers = Rc<RefCell<HashMap<String, String>>>;
pub type Toasts = Rc<RefCell<Vec<(String, ToastLevel)>>>;

struct SharedWidget {
    slot: String,
    buffers: Buffers,
}

impl Widget for SharedWidget {
    fn value(&self) -> String {
        self.buffers
            .borrow()
            .get(&self.slot)
            .cloned()
            .unwrap_or_default()
    }

    fn set_value(&mut self, value: &str) {
        self.buffers
            .borrow_mut()
            .insert(self.slot.clone(), value.to_string());
    }

    fn on_change(&mut self, _notifier: ChangeNotifier) -> Box<dyn Disposable> {
        Box::new(Noop)
    }

    fn dispose(self: Box<Self>) {
        self.buffers.borrow_mut().remove(&self.slot);
    }
}

struct Noop;

impl Disposable for Noop {
    fn dispose(self: Box<Self>) {}
}

struct SharedWidgets(Buffers);

impl WidgetFactory for SharedWidgets {
    fn create(&self, slot: &SlotSpec, initial: &str) -> Box<dyn Widget> {
        self.0
            .borrow_mut()
            .insert(slot.id().to_string(), initial.to_string());
        Box::new(SharedWidget {
            slot: slot.id().to_string(),
            buffers: Rc::clone(&self.0),
        })
    }
}

struct RecordingUi(Toasts);

impl Ui for RecordingUi {
    fn toast(&self, message: &str, level: ToastLevel) {
        self.0.borrow_mut().push((message.to_string(), level));
    }
    fn disable_save_controls(&self, _busy_label: &str) {}
    fn restore_save_controls(&self) {}
    fn render_slots(&self, _slots: &[SlotView]) {}
    fn refresh_toggles(&self, _slots: &[SlotView]) {}
    fn rebuild_activation_ui(&self, _mode: ViewMode, _slots: &[SlotView]) {}
    fn arm_inline_confirmation(&self, _target: &DiscardTarget) {}
    fn show_no_changes(&self, _target: &DiscardTarget) {}
}

pub struct TestEngine {
    pub engine: Engine,
    pub buffers: Buffers,
    pub toasts: Toasts,
}

/// `head` -> `page_head`, `tail` -> `page_tail`.
pub fn page_slots() -> Vec<SlotSpec> {
    vec![
        SlotSpec::new(SlotId::new("head").expect("id"), "Head HTML", "page_head"),
        SlotSpec::new(SlotId::new("tail").expect("id"), "Tail HTML", "page_tail"),
    ]
}

pub fn settings_for(server: &MockServer) -> EditorSettings {
    EditorSettings {
        endpoint: Some(format!("{}{DOC_PATH}", server.uri())),
        kind: EngineKind::Fields,
        format_on_save: false,
        widget_settle: Duration::ZERO,
        ..EditorSettings::default()
    }
}

pub fn engine_for(server: &MockServer, state_dir: &Path) -> TestEngine {
    engine_with(settings_for(server), state_dir)
}

pub fn engine_with(settings: EditorSettings, state_dir: &Path) -> TestEngine {
    let buffers = Buffers::default();
    let toasts = Toasts::default();
    let slots = page_slots();
    let engine = Engine::builder(settings, slots.clone())
        .widgets(SharedWidgets(Rc::clone(&buffers)))
        .transport(HttpTransport::new().expect("http client"))
        .storage(FileStorage::new(state_dir))
        .ui(RecordingUi(Rc::clone(&toasts)))
        .hooks(FieldMappedHooks::new(slots))
        .build()
        .expect("engine");
    TestEngine {
        engine,
        buffers,
        toasts,
    }
}

/// Serve the document for GET requests.
pub async fn mount_document(server: &MockServer, token: &str, head: &str, tail: &str) {
    Mock::given(method("GET"))
        .and(path(DOC_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token": token,
            "fields": { "page_head": head, "page_tail": tail, "title": "Home" }
        })))
        .mount(server)
        .await;
}

/// Accept form posts with the CMS-style redirect back to the edit page.
pub async fn mount_save_redirect(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(DOC_PATH))
        .respond_with(ResponseTemplate::new(302).insert_header("location", DOC_PATH))
        .mount(server)
        .await;
}

/// Bodies of every POST the server received, decoded lossily.
pub async fn posted_bodies(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.method.as_str() == "POST")
        .map(|r| String::from_utf8_lossy(&r.body).into_owned())
        .collect()
}

/// Multipart text of one named part, if present.
pub fn form_field(body: &str, name: &str) -> Option<String> {
    let marker = format!("name=\"{name}\"");
    let start = body.find(&marker)? + marker.len();
    let rest = &body[start..];
    let value_start = rest.find("\r\n\r\n")? + 4;
    let value = &rest[value_start..];
    let end = value.find("\r\n--")?;
    Some(value[..end].to_string())
}
