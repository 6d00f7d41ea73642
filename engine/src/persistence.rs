//! Engine state snapshots and the mount-time server fetch.
//!
//! # Blob format
//!
//! ```json
//! {
//!   "activeFields": ["head"],
//!   "content":  { "head": "...", "tail": "..." },
//!   "dirty":    { "head": true,  "tail": false },
//!   "original": { "head": "...", "tail": "..." }
//! }
//! ```
//!
//! The active-id key is `activeRoles` or `activeFields` depending on the
//! engine kind; everything else is shared. `original` is the baseline map.
//!
//! # Checkpoint protection
//!
//! If any slot is dirty after restoring, the mount fetch only refreshes the
//! session token. Overwriting content or baselines with server values would
//! silently drop unsaved local edits.

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;
use serde_json::{Map, Value, json};
use slotedit_transport::{FetchedDocument, TransportError};
use slotedit_types::{EngineKind, SlotId, ToastLevel};

use crate::Engine;

/// Self-contained copy of everything needed to resume an editing session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineSnapshot {
    /// `None` when the blob carried no active-id list.
    pub active: Option<Vec<SlotId>>,
    pub content: BTreeMap<SlotId, String>,
    pub dirty: BTreeMap<SlotId, bool>,
    pub original: BTreeMap<SlotId, String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawSnapshot {
    content: BTreeMap<String, String>,
    dirty: BTreeMap<String, bool>,
    original: BTreeMap<String, String>,
}

impl EngineSnapshot {
    #[must_use]
    pub fn to_blob(&self, kind: EngineKind) -> Value {
        let mut blob = Map::new();
        if let Some(active) = &self.active {
            blob.insert(kind.active_key().to_string(), json!(active));
        }
        blob.insert("content".to_string(), json!(self.content));
        blob.insert("dirty".to_string(), json!(self.dirty));
        blob.insert("original".to_string(), json!(self.original));
        Value::Object(blob)
    }

    /// Parse a stored blob. Entries with blank ids are dropped.
    pub fn from_blob(kind: EngineKind, blob: &Value) -> Result<Self, serde_json::Error> {
        let raw = RawSnapshot::deserialize(blob)?;
        let active = match blob.get(kind.active_key()) {
            Some(ids) => Some(
                Vec::<String>::deserialize(ids)?
                    .into_iter()
                    .filter_map(|id| SlotId::new(id).ok())
                    .collect(),
            ),
            None => None,
        };
        Ok(Self {
            active,
            content: keyed(raw.content),
            dirty: keyed(raw.dirty),
            original: keyed(raw.original),
        })
    }
}

fn keyed<V>(map: BTreeMap<String, V>) -> BTreeMap<SlotId, V> {
    map.into_iter()
        .filter_map(|(id, value)| SlotId::new(id).ok().map(|id| (id, value)))
        .collect()
}

/// What the mount-time fetch did.
#[derive(Debug)]
pub enum InitialFetch {
    /// Content and baselines were replaced with server values.
    Full,
    /// Dirty state was restored; only the session token was refreshed.
    TokenOnly,
    /// The server could not be reached or refused; restored state is kept.
    Failed(TransportError),
}

impl Engine {
    /// Capture the current engine state.
    #[must_use]
    pub fn snapshot(&self) -> EngineSnapshot {
        let mut snapshot = EngineSnapshot {
            active: Some(self.registry.active_ids()),
            ..EngineSnapshot::default()
        };
        for id in self.registry.ids() {
            let Some(slot) = self.registry.get(id) else {
                continue;
            };
            snapshot.content.insert(id.clone(), slot.content.clone());
            snapshot.dirty.insert(id.clone(), slot.dirty);
            snapshot
                .original
                .insert(id.clone(), self.registry.baseline(id).to_string());
        }
        snapshot
    }

    /// Apply a stored blob. Returns `false` for `None` or an unparseable blob.
    ///
    /// Ids not in the slot configuration are skipped. The restored active set
    /// is clamped to the current ceiling in configuration order.
    pub fn restore(&mut self, blob: Option<&Value>) -> bool {
        let Some(blob) = blob.filter(|b| !b.is_null()) else {
            return false;
        };
        match EngineSnapshot::from_blob(self.kind(), blob) {
            Ok(snapshot) => {
                self.apply_snapshot(snapshot);
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "Ignoring unreadable stored editor state");
                false
            }
        }
    }

    pub fn apply_snapshot(&mut self, snapshot: EngineSnapshot) {
        for (id, text) in snapshot.original {
            if let Some(id) = self.registry.resolve(&id) {
                self.registry.set_baseline(&id, text);
            }
        }
        for (id, text) in snapshot.content {
            if let Some(slot) = self.registry.get_mut(&id) {
                slot.replace_content(text);
            }
        }
        for (id, dirty) in snapshot.dirty {
            if let Some(slot) = self.registry.get_mut(&id) {
                slot.dirty = dirty;
            }
        }

        if let Some(active) = snapshot.active {
            let wanted: BTreeSet<SlotId> = active.into_iter().collect();
            let ceiling = self.active_ceiling();
            let keep: Vec<SlotId> = self
                .registry
                .ids()
                .iter()
                .filter(|id| wanted.contains(*id))
                .take(ceiling)
                .cloned()
                .collect();
            for id in self.registry.active_ids() {
                if !keep.contains(&id) {
                    self.deactivate_slot(&id);
                }
            }
            for id in &keep {
                self.activate_slot(id);
            }
        }
        tracing::debug!(active = self.registry.active_count(), "Editor state restored");
    }

    /// Write the snapshot to storage. Failures are logged, never raised.
    pub(crate) fn persist(&self) {
        let blob = self.snapshot().to_blob(self.kind());
        if let Err(err) = self.storage.set_app_state(&self.settings.app_id, &blob) {
            tracing::warn!(error = %err, "Failed to persist editor state");
        }
    }

    pub(crate) fn clear_persisted(&self) {
        if let Err(err) = self.storage.clear_app_state(&self.settings.app_id) {
            tracing::warn!(error = %err, "Failed to clear persisted editor state");
        }
    }

    /// Read and apply the stored blob for this application.
    pub fn restore_from_storage(&mut self) -> bool {
        match self.storage.get_app_state(&self.settings.app_id) {
            Ok(blob) => self.restore(blob.as_ref()),
            Err(err) => {
                tracing::warn!(error = %err, "Failed to read persisted editor state");
                false
            }
        }
    }

    /// Bring the engine up for a container of the given width.
    ///
    /// Restores stored state, settles the view mode, guarantees one open
    /// slot, then fetches from the server under checkpoint protection.
    pub async fn mount(&mut self, container_width: u32) -> InitialFetch {
        let restored = self.restore_from_storage();
        self.on_resize(container_width);
        if self.registry.active_count() == 0
            && let Some(first) = self.registry.ids().first().cloned()
        {
            self.activate_slot(&first);
        }

        let protect = self.registry.any_dirty();
        let fetched = self.transport.fetch_document(&self.endpoint).await;
        let outcome = match fetched {
            Ok(document) if protect => {
                self.session_token = Some(document.session_token);
                tracing::info!("Unsaved changes restored; skipped server reload");
                self.toast(
                    "Restored your unsaved changes. Server content was not reloaded.",
                    ToastLevel::Info,
                );
                InitialFetch::TokenOnly
            }
            Ok(document) => {
                self.apply_server_document(document);
                InitialFetch::Full
            }
            Err(err) => {
                tracing::warn!(error = %err, "Initial document fetch failed");
                self.toast(&err.user_message(), ToastLevel::Error);
                InitialFetch::Failed(err)
            }
        };

        tracing::debug!(restored, ?outcome, "Engine mounted");
        self.refresh_views();
        self.persist();
        outcome
    }

    /// Fetch a fresh session token without touching slot content.
    pub async fn refresh_session_token(&mut self) -> Result<(), TransportError> {
        let document = self.transport.fetch_document(&self.endpoint).await?;
        self.session_token = Some(document.session_token);
        Ok(())
    }

    /// Replace every slot with server values.
    ///
    /// Refused while any slot has unsaved changes; returns `Ok(false)` then.
    pub async fn reload_from_server(&mut self) -> Result<bool, TransportError> {
        self.sync_all_widgets();
        if self.registry.any_dirty() {
            self.toast(
                "Save or discard your changes before reloading.",
                ToastLevel::Warning,
            );
            return Ok(false);
        }

        let document = match self.transport.fetch_document(&self.endpoint).await {
            Ok(document) => document,
            Err(err) => {
                self.toast(&err.user_message(), ToastLevel::Error);
                return Err(err);
            }
        };
        self.apply_server_document(document);
        self.refresh_views();
        self.persist();
        self.toast("Reloaded from server.", ToastLevel::Info);
        Ok(true)
    }

    /// Slots the hooks do not map are reset to empty text.
    fn apply_server_document(&mut self, document: FetchedDocument) {
        self.session_token = Some(document.session_token);
        let mut contents = self.hooks.slot_contents(&document.fields);
        for id in self.registry.ids().to_vec() {
            let text = contents.remove(&id).unwrap_or_default();
            self.registry.set_baseline(&id, text.clone());
            if let Some(slot) = self.registry.get_mut(&id) {
                slot.replace_content(text);
                slot.dirty = false;
            }
            self.notify_content_changed(&id);
        }
        tracing::info!(slots = self.registry.ids().len(), "Loaded document from server");
    }
}
