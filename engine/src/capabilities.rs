//! Capabilities the engine consumes and the hooks the host must provide.
//!
//! Every external collaborator is an explicit trait injected at construction, so
//! each one can be replaced by a test double. The engine runs on a single
//! cooperative event loop: nothing here is required to be `Send`.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use serde_json::Value;
use slotedit_transport::{FetchedDocument, HttpTransport, PostReceipt, TransportError};
use slotedit_types::{FieldMap, SlotId, SlotSpec, SlotView, ToastLevel, ViewMode};
use tokio::sync::mpsc::UnboundedSender;

use crate::discard::DiscardTarget;
use crate::error::{FormatError, HookError, StorageError};

/// Future returned by capability methods. Local to the event loop thread.
pub type LocalFut<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Slot id -> text, one entry per configured slot.
pub type DocumentDraft = BTreeMap<SlotId, String>;

// ============================================================================
// Widget
// ============================================================================

/// A live text-editing widget bound to one slot.
pub trait Widget {
    fn value(&self) -> String;
    fn set_value(&mut self, value: &str);
    /// Register for edit notifications. Dropping interest is done by disposing
    /// the returned subscription.
    fn on_change(&mut self, notifier: ChangeNotifier) -> Box<dyn Disposable>;
    fn dispose(self: Box<Self>);
}

pub trait WidgetFactory {
    fn create(&self, slot: &SlotSpec, initial: &str) -> Box<dyn Widget>;
}

pub trait Disposable {
    fn dispose(self: Box<Self>);
}

/// Handle a widget uses to report that its value changed.
///
/// Notifications are queued; the engine picks them up in
/// [`Engine::process_changes`](crate::Engine::process_changes).
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    slot: SlotId,
    tx: UnboundedSender<SlotId>,
}

impl ChangeNotifier {
    pub(crate) fn new(slot: SlotId, tx: UnboundedSender<SlotId>) -> Self {
        Self { slot, tx }
    }

    #[must_use]
    pub fn slot(&self) -> &SlotId {
        &self.slot
    }

    pub fn notify(&self) {
        // The receiver lives as long as the engine; after unmount there is nobody to tell.
        let _ = self.tx.send(self.slot.clone());
    }
}

// ============================================================================
// Formatter
// ============================================================================

pub trait Formatter {
    fn is_ready(&self) -> bool;
    fn format<'a>(&'a self, text: &'a str) -> LocalFut<'a, Result<String, FormatError>>;
}

// ============================================================================
// Transport
// ============================================================================

pub trait Transport {
    fn fetch_document<'a>(
        &'a self,
        endpoint: &'a str,
    ) -> LocalFut<'a, Result<FetchedDocument, TransportError>>;

    fn post_document<'a>(
        &'a self,
        endpoint: &'a str,
        fields: &'a FieldMap,
    ) -> LocalFut<'a, Result<PostReceipt, TransportError>>;
}

impl Transport for HttpTransport {
    fn fetch_document<'a>(
        &'a self,
        endpoint: &'a str,
    ) -> LocalFut<'a, Result<FetchedDocument, TransportError>> {
        Box::pin(HttpTransport::fetch_document(self, endpoint))
    }

    fn post_document<'a>(
        &'a self,
        endpoint: &'a str,
        fields: &'a FieldMap,
    ) -> LocalFut<'a, Result<PostReceipt, TransportError>> {
        Box::pin(HttpTransport::post_document(self, endpoint, fields))
    }
}

// ============================================================================
// Storage
// ============================================================================

/// Opaque per-application JSON blobs.
pub trait Storage {
    fn get_app_state(&self, app_id: &str) -> Result<Option<Value>, StorageError>;
    fn set_app_state(&self, app_id: &str, blob: &Value) -> Result<(), StorageError>;
    fn clear_app_state(&self, app_id: &str) -> Result<(), StorageError>;
}

// ============================================================================
// UI
// ============================================================================

pub trait Ui {
    fn toast(&self, message: &str, level: ToastLevel);

    /// Disable every save/discard control, showing `busy_label` on them.
    fn disable_save_controls(&self, busy_label: &str);
    /// Re-enable the controls and restore their original labels.
    fn restore_save_controls(&self);

    fn render_slots(&self, slots: &[SlotView]);
    fn refresh_toggles(&self, slots: &[SlotView]);
    /// Switch between the desktop button row and the mobile dropdown.
    fn rebuild_activation_ui(&self, mode: ViewMode, slots: &[SlotView]);

    fn arm_inline_confirmation(&self, target: &DiscardTarget);
    fn show_no_changes(&self, target: &DiscardTarget);
}

// ============================================================================
// Host hooks
// ============================================================================

/// Extension points the host application implements.
pub trait HostHooks {
    /// Full-document payload for a single-slot save. `document` already holds the
    /// text being saved for `slot` and the baseline for every other slot.
    fn build_payload_for_slot(
        &self,
        slot: &SlotId,
        document: &DocumentDraft,
    ) -> Result<FieldMap, HookError>;

    /// Full-document payload for a save-all; `document` holds every slot's current text.
    fn build_payload_for_all(&self, document: &DocumentDraft) -> Result<FieldMap, HookError>;

    /// Map fetched server fields back to slot text.
    fn slot_contents(&self, fields: &FieldMap) -> DocumentDraft;

    /// Called after a slot's content changed (typing, format, discard, import).
    fn on_content_changed(&self, _slot: &SlotId, _content: &str) {}
}
