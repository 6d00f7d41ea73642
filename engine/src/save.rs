//! Save pipeline.
//!
//! Every write resends the complete document. Per slot the order is fixed:
//! sync from widget, capture `had_changes`, format-on-save, build payload,
//! transmit, reconcile.
//!
//! `had_changes` is captured before formatting. A formatter may turn a real
//! edit back into text identical to the baseline; recomputing afterwards would
//! drop that edit as a no-op.
//!
//! Reconciliation re-reads the widget. Edits made while the request was in
//! flight are newer than what was sent, so such a slot stays dirty and keeps
//! the widget's latest value.

use slotedit_types::{SlotId, ToastLevel, is_blank};

use crate::Engine;
use crate::error::SaveError;

const SAVING_LABEL: &str = "Saving…";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The server accepted the document.
    Saved,
    /// Nothing differed from the baseline; no request was made.
    NoChanges,
}

impl Engine {
    /// Save one slot. The payload carries this slot's text and every other
    /// slot's baseline.
    pub async fn save_slot(&mut self, id: &str) -> Result<SaveOutcome, SaveError> {
        let Some(slot_id) = self.registry.resolve(id) else {
            let err = SaveError::UnknownSlot(id.to_string());
            tracing::error!(slot = id, "Save requested for unknown slot");
            self.toast(&err.user_message(), ToastLevel::Error);
            return Err(err);
        };

        self.ui.disable_save_controls(SAVING_LABEL);
        let result = self.run_slot_save(&slot_id).await;
        self.ui.restore_save_controls();

        let label = self.label(&slot_id);
        self.finish_save(&result, &format!("Saved {label}."));
        result
    }

    /// Save every slot in one request.
    pub async fn save_all(&mut self) -> Result<SaveOutcome, SaveError> {
        self.ui.disable_save_controls(SAVING_LABEL);
        let result = self.run_save_all().await;
        self.ui.restore_save_controls();

        self.finish_save(&result, "Saved all editors.");
        result
    }

    async fn run_slot_save(&mut self, id: &SlotId) -> Result<SaveOutcome, SaveError> {
        let had_changes = self.capture_changes(id);
        self.format_before_save(id).await;

        if !had_changes {
            return Ok(SaveOutcome::NoChanges);
        }

        let outcome = self.transmit_slot(id).await;
        if outcome.is_err() {
            self.mark_dirty(id);
        }
        outcome
    }

    async fn transmit_slot(&mut self, id: &SlotId) -> Result<SaveOutcome, SaveError> {
        let token = self.require_token()?;
        let sent = self
            .registry
            .get(id)
            .map(|s| s.content.clone())
            .unwrap_or_default();

        let mut document = self.registry.baseline_document();
        document.insert(id.clone(), sent.clone());
        let mut fields = self.hooks.build_payload_for_slot(id, &document)?;
        fields.insert(self.settings.csrf_field.clone(), token);

        let receipt = self.transport.post_document(&self.endpoint, &fields).await?;
        tracing::info!(slot = %id, status = receipt.status, "Slot saved");

        self.reconcile(id, sent);
        Ok(SaveOutcome::Saved)
    }

    async fn run_save_all(&mut self) -> Result<SaveOutcome, SaveError> {
        let ids = self.registry.ids().to_vec();
        let mut changed = Vec::new();
        for id in &ids {
            if self.capture_changes(id) {
                changed.push(id.clone());
            }
            self.format_before_save(id).await;
        }

        if changed.is_empty() {
            return Ok(SaveOutcome::NoChanges);
        }

        let outcome = self.transmit_all().await;
        if outcome.is_err() {
            for id in &changed {
                self.mark_dirty(id);
            }
        }
        outcome
    }

    async fn transmit_all(&mut self) -> Result<SaveOutcome, SaveError> {
        let token = self.require_token()?;
        let document = self.registry.content_document();
        let mut fields = self.hooks.build_payload_for_all(&document)?;
        fields.insert(self.settings.csrf_field.clone(), token);

        let receipt = self.transport.post_document(&self.endpoint, &fields).await?;
        tracing::info!(slots = document.len(), status = receipt.status, "Document saved");

        for (id, sent) in document {
            self.reconcile(&id, sent);
        }
        Ok(SaveOutcome::Saved)
    }

    // ------------------------------------------------------------------------
    // Steps
    // ------------------------------------------------------------------------

    /// Sync the widget into content and report whether the slot has changes
    /// by either measure. Must run before any formatting.
    fn capture_changes(&mut self, id: &SlotId) -> bool {
        if let Some(slot) = self.registry.get_mut(id) {
            slot.sync_from_widget();
        }
        self.registry.is_modified(id)
    }

    /// Formatter failures are logged; the unformatted text is saved.
    async fn format_before_save(&mut self, id: &SlotId) {
        if !self.settings.format_on_save {
            return;
        }
        let Some(formatter) = self.formatter.as_deref() else {
            return;
        };
        if !formatter.is_ready() {
            return;
        }
        let Some(text) = self.registry.get(id).map(|s| s.content.clone()) else {
            return;
        };
        if is_blank(&text) {
            return;
        }

        match formatter.format(&text).await {
            Ok(formatted) if formatted != text => {
                if let Some(slot) = self.registry.get_mut(id) {
                    slot.replace_content(formatted);
                }
                self.notify_content_changed(id);
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(slot = %id, error = %err, "Format-on-save failed; saving unformatted text");
            }
        }
    }

    fn require_token(&self) -> Result<String, SaveError> {
        self.session_token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or(SaveError::NoSessionToken)
    }

    /// Commit `sent` as the baseline, then compare against the widget's
    /// current value.
    fn reconcile(&mut self, id: &SlotId, sent: String) {
        self.registry.set_baseline(id, sent.clone());
        let Some(slot) = self.registry.get_mut(id) else {
            return;
        };
        let live = slot.widget.as_ref().map(|m| m.widget.value());
        match live {
            Some(current) if current != sent => {
                tracing::debug!(slot = %id, "Slot edited during save; keeping it dirty");
                slot.content = current;
                slot.dirty = true;
            }
            _ => {
                slot.content = sent;
                slot.dirty = false;
            }
        }
    }

    fn mark_dirty(&mut self, id: &SlotId) {
        if let Some(slot) = self.registry.get_mut(id) {
            slot.dirty = true;
        }
    }

    fn finish_save(&self, result: &Result<SaveOutcome, SaveError>, saved_message: &str) {
        self.persist();
        self.refresh_views();
        match result {
            Ok(SaveOutcome::Saved) => self.toast(saved_message, ToastLevel::Success),
            Ok(SaveOutcome::NoChanges) => self.toast("No changes to save.", ToastLevel::Info),
            Err(err @ SaveError::Hook(_)) => {
                tracing::error!(error = %err, "Payload hook failed");
                self.toast(&err.user_message(), ToastLevel::Error);
            }
            Err(err) => {
                tracing::warn!(error = %err, "Save failed");
                self.toast(&err.user_message(), ToastLevel::Error);
            }
        }
    }
}
