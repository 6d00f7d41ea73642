//! Shared editor-state engine for multi-slot text editing.
//!
//! One [`Engine`] owns every slot of one mounted editor session: the slot
//! contents, the server baseline per slot, the live widgets, and the injected
//! capabilities. It is constructed fresh per mount and torn down with
//! [`Engine::unmount`]; nothing is shared between instances.
//!
//! # Architecture
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`activation`] | plain-click / modified-click slot toggling under the active ceiling |
//! | [`view_mode`] | desktop vs. mobile layout, single-active rule in mobile |
//! | [`save`] | content sync, format-on-save, full-document payload, reconcile |
//! | [`format`] | per-slot and all-active formatting with change reporting |
//! | [`discard`] | two-phase revert of one slot or all slots |
//! | [`persistence`] | state snapshots, checkpoint-protected mount fetch |
//! | [`keyboard`] | physical-key shortcut dispatch |
//! | [`import`] | validated file import and export |
//!
//! # Concurrency
//!
//! Single-threaded and cooperative. Formatter calls, the network round trip and
//! the widget settle delay are the only suspension points. Every mutating
//! operation takes `&mut self`, so two saves on one engine can never overlap;
//! widgets, however, live outside the engine and may change while a save is
//! suspended, which is why the save pipeline re-reads them before reconciling.

pub mod activation;
pub mod capabilities;
pub mod discard;
pub mod error;
pub mod format;
pub mod hooks;
pub mod import;
pub mod keyboard;
pub mod persistence;
mod registry;
pub mod save;
pub mod storage;
pub mod view_mode;


use std::collections::{BTreeSet, HashMap, HashSet};

use slotedit_config::EditorSettings;
use slotedit_types::{EngineKind, SlotId, SlotSpec, SlotView, ToastLevel, ViewMode};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

pub use activation::ToggleOutcome;
pub use capabilities::{
    ChangeNotifier, Disposable, DocumentDraft, Formatter, HostHooks, LocalFut, Storage, Transport,
    Ui, Widget, WidgetFactory,
};
pub use discard::{DiscardStep, DiscardTarget};
pub use error::{EngineError, FormatError, HookError, ImportError, SaveError, StorageError};
pub use format::FormatOutcome;
pub use hooks::FieldMappedHooks;
pub use import::ExportedFile;
pub use keyboard::KeyDisposition;
pub use persistence::{EngineSnapshot, InitialFetch};
pub use save::SaveOutcome;
pub use storage::FileStorage;

pub use slotedit_config;
pub use slotedit_transport;
pub use slotedit_types;

use crate::discard::DiscardConfirmations;
use crate::registry::{MountedWidget, SlotRegistry};

pub struct Engine {
    settings: EditorSettings,
    endpoint: String,
    registry: SlotRegistry,
    /// Slot last known to hold keyboard focus.
    active_editor: Option<SlotId>,
    /// `None` until the first width measurement.
    view_mode: Option<ViewMode>,
    session_token: Option<String>,
    confirmations: DiscardConfirmations,
    changes_tx: UnboundedSender<SlotId>,
    changes_rx: UnboundedReceiver<SlotId>,
    widgets: Box<dyn WidgetFactory>,
    formatter: Option<Box<dyn Formatter>>,
    transport: Box<dyn Transport>,
    storage: Box<dyn Storage>,
    ui: Box<dyn Ui>,
    hooks: Box<dyn HostHooks>,
}

/// Collects the engine's collaborators; every capability except the formatter
/// is required.
pub struct EngineBuilder {
    settings: EditorSettings,
    slots: Vec<SlotSpec>,
    widgets: Option<Box<dyn WidgetFactory>>,
    formatter: Option<Box<dyn Formatter>>,
    transport: Option<Box<dyn Transport>>,
    storage: Option<Box<dyn Storage>>,
    ui: Option<Box<dyn Ui>>,
    hooks: Option<Box<dyn HostHooks>>,
}

impl EngineBuilder {
    #[must_use]
    pub fn new(settings: EditorSettings, slots: Vec<SlotSpec>) -> Self {
        Self {
            settings,
            slots,
            widgets: None,
            formatter: None,
            transport: None,
            storage: None,
            ui: None,
            hooks: None,
        }
    }

    #[must_use]
    pub fn widgets(mut self, factory: impl WidgetFactory + 'static) -> Self {
        self.widgets = Some(Box::new(factory));
        self
    }

    #[must_use]
    pub fn formatter(mut self, formatter: impl Formatter + 'static) -> Self {
        self.formatter = Some(Box::new(formatter));
        self
    }

    #[must_use]
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    #[must_use]
    pub fn storage(mut self, storage: impl Storage + 'static) -> Self {
        self.storage = Some(Box::new(storage));
        self
    }

    #[must_use]
    pub fn ui(mut self, ui: impl Ui + 'static) -> Self {
        self.ui = Some(Box::new(ui));
        self
    }

    #[must_use]
    pub fn hooks(mut self, hooks: impl HostHooks + 'static) -> Self {
        self.hooks = Some(Box::new(hooks));
        self
    }

    pub fn build(self) -> Result<Engine, EngineError> {
        if self.slots.is_empty() {
            return Err(EngineError::NoSlots);
        }
        let mut seen = HashSet::new();
        let mut fields = HashSet::new();
        for spec in &self.slots {
            if !seen.insert(spec.id().clone()) {
                return Err(EngineError::DuplicateSlot(spec.id().clone()));
            }
            if spec.field() == self.settings.csrf_field {
                return Err(EngineError::ReservedField(spec.field().to_string()));
            }
            if !fields.insert(spec.field()) {
                return Err(EngineError::DuplicateField(spec.field().to_string()));
            }
        }
        if self.settings.max_active_slots == 0 {
            return Err(EngineError::InvalidMaxActive);
        }
        let endpoint = self
            .settings
            .endpoint
            .clone()
            .filter(|e| !e.trim().is_empty())
            .ok_or(EngineError::MissingEndpoint)?;

        let widgets = self
            .widgets
            .ok_or(EngineError::MissingCapability("widgets"))?;
        let transport = self
            .transport
            .ok_or(EngineError::MissingCapability("transport"))?;
        let storage = self
            .storage
            .ok_or(EngineError::MissingCapability("storage"))?;
        let ui = self.ui.ok_or(EngineError::MissingCapability("ui"))?;
        let hooks = self.hooks.ok_or(EngineError::MissingCapability("hooks"))?;

        let (changes_tx, changes_rx) = mpsc::unbounded_channel();
        let confirmations = DiscardConfirmations::new(self.settings.confirm_timeout);

        tracing::debug!(
            kind = %self.settings.kind,
            slots = self.slots.len(),
            max_active = self.settings.max_active_slots,
            "Engine constructed"
        );

        Ok(Engine {
            endpoint,
            registry: SlotRegistry::new(self.slots),
            settings: self.settings,
            active_editor: None,
            view_mode: None,
            session_token: None,
            confirmations,
            changes_tx,
            changes_rx,
            widgets,
            formatter: self.formatter,
            transport,
            storage,
            ui,
            hooks,
        })
    }
}

impl Engine {
    #[must_use]
    pub fn builder(settings: EditorSettings, slots: Vec<SlotSpec>) -> EngineBuilder {
        EngineBuilder::new(settings, slots)
    }

    // ------------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------------

    #[must_use]
    pub fn kind(&self) -> EngineKind {
        self.settings.kind
    }

    #[must_use]
    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    /// Per-slot view in configuration order.
    #[must_use]
    pub fn slot_views(&self) -> Vec<SlotView> {
        self.registry.views()
    }

    #[must_use]
    pub fn content(&self, id: &str) -> Option<&str> {
        self.registry.get(id).map(|s| s.content.as_str())
    }

    #[must_use]
    pub fn baseline(&self, id: &str) -> Option<&str> {
        self.registry
            .contains(id)
            .then(|| self.registry.baseline(id))
    }

    /// The cached dirty flag (a hint, see [`Engine::is_modified`]).
    #[must_use]
    pub fn is_dirty(&self, id: &str) -> bool {
        self.registry.get(id).is_some_and(|s| s.dirty)
    }

    /// Whether the slot has unsaved changes by either measure.
    #[must_use]
    pub fn is_modified(&self, id: &str) -> bool {
        self.registry.is_modified(id)
    }

    #[must_use]
    pub fn has_unsaved_changes(&self) -> bool {
        self.registry.any_dirty()
    }

    #[must_use]
    pub fn is_active(&self, id: &str) -> bool {
        self.registry.get(id).is_some_and(|s| s.is_active())
    }

    /// Active slot ids in configuration order.
    #[must_use]
    pub fn active_slots(&self) -> Vec<SlotId> {
        self.registry.active_ids()
    }

    #[must_use]
    pub fn view_mode(&self) -> Option<ViewMode> {
        self.view_mode
    }

    #[must_use]
    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }

    #[must_use]
    pub fn focused_slot(&self) -> Option<&SlotId> {
        self.active_editor.as_ref()
    }

    #[must_use]
    pub fn formatter_ready(&self) -> bool {
        self.formatter.as_ref().is_some_and(|f| f.is_ready())
    }

    // ------------------------------------------------------------------------
    // Focus and widget change intake
    // ------------------------------------------------------------------------

    /// Record that a slot's widget gained keyboard focus. Ignored for inactive slots.
    pub fn focus(&mut self, id: &str) {
        if let Some(slot_id) = self.registry.resolve(id)
            && self.is_active(id)
        {
            self.active_editor = Some(slot_id);
        }
    }

    pub fn blur(&mut self, id: &str) {
        if self.active_editor.as_deref() == Some(id) {
            self.active_editor = None;
        }
    }

    /// Apply queued widget change notifications.
    ///
    /// Each changed slot is synced from its widget and its dirty flag recomputed
    /// against the baseline; state is persisted once. Returns the number of
    /// distinct slots that changed.
    pub fn process_changes(&mut self) -> usize {
        let mut pending = BTreeSet::new();
        while let Ok(id) = self.changes_rx.try_recv() {
            pending.insert(id);
        }

        let mut changed = 0;
        for id in pending {
            let Some(slot) = self.registry.get_mut(&id) else {
                continue;
            };
            if !slot.sync_from_widget() {
                continue;
            }
            self.registry.refresh_dirty(&id);
            self.notify_content_changed(&id);
            changed += 1;
        }

        if changed > 0 {
            self.refresh_views();
            self.persist();
        }
        changed
    }

    /// Tear down every widget. State is synced and persisted first so the next
    /// mount can restore it; in-flight requests are not awaited.
    pub fn unmount(mut self) {
        let ids = self.registry.ids().to_vec();
        for id in &ids {
            if let Some(slot) = self.registry.get_mut(id)
                && slot.sync_from_widget()
            {
                self.registry.refresh_dirty(id);
            }
        }
        self.persist();
        for id in &ids {
            if let Some(mounted) = self.registry.get_mut(id).and_then(|s| s.widget.take()) {
                mounted.dispose();
            }
        }
        tracing::debug!("Engine unmounted");
    }

    // ------------------------------------------------------------------------
    // Shared internals
    // ------------------------------------------------------------------------

    /// Effective ceiling on active slots for the current view.
    pub(crate) fn active_ceiling(&self) -> usize {
        if self.view_mode.is_some_and(ViewMode::is_mobile) {
            1
        } else {
            self.settings.max_active_slots
        }
    }

    pub(crate) fn activate_slot(&mut self, id: &SlotId) {
        let tx = self.changes_tx.clone();
        let Some(slot) = self.registry.get_mut(id) else {
            return;
        };
        if slot.is_active() {
            return;
        }
        let mut widget = self.widgets.create(&slot.spec, &slot.content);
        let subscription = widget.on_change(ChangeNotifier::new(id.clone(), tx));
        slot.widget = Some(MountedWidget {
            widget,
            subscription,
        });
        tracing::debug!(slot = %id, "Slot activated");
    }

    pub(crate) fn deactivate_slot(&mut self, id: &SlotId) {
        let Some(slot) = self.registry.get_mut(id) else {
            return;
        };
        let edited = slot.sync_from_widget();
        let Some(mounted) = slot.widget.take() else {
            return;
        };
        mounted.dispose();
        if edited {
            self.registry.refresh_dirty(id);
        }
        if self.active_editor.as_ref() == Some(id) {
            self.active_editor = None;
        }
        tracing::debug!(slot = %id, "Slot deactivated");
    }

    /// Make `keep` the only active slot.
    pub(crate) fn activate_exclusive(&mut self, keep: &SlotId) {
        for other in self.registry.active_ids() {
            if &other != keep {
                self.deactivate_slot(&other);
            }
        }
        self.activate_slot(keep);
    }

    /// Sync every active widget into slot content.
    pub(crate) fn sync_all_widgets(&mut self) {
        for id in self.registry.ids().to_vec() {
            if let Some(slot) = self.registry.get_mut(&id)
                && slot.sync_from_widget()
            {
                self.registry.refresh_dirty(&id);
            }
        }
    }

    pub(crate) fn notify_content_changed(&self, id: &SlotId) {
        if let Some(slot) = self.registry.get(id) {
            self.hooks.on_content_changed(id, &slot.content);
        }
    }

    pub(crate) fn refresh_views(&self) {
        let views = self.registry.views();
        self.ui.render_slots(&views);
        self.ui.refresh_toggles(&views);
    }

    pub(crate) fn toast(&self, message: &str, level: ToastLevel) {
        self.ui.toast(message, level);
    }

    /// Label lookup for notices.
    pub(crate) fn label(&self, id: &str) -> String {
        self.registry.label(id)
    }

    /// Cached dirty flag per slot.
    #[must_use]
    pub fn dirty_map(&self) -> HashMap<SlotId, bool> {
        self.registry
            .ids()
            .iter()
            .map(|id| (id.clone(), self.is_dirty(id)))
            .collect()
    }
}
