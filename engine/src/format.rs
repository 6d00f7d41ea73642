//! On-demand formatting of one slot or every active slot.

use slotedit_types::{SlotId, ToastLevel, is_blank};

use crate::Engine;

/// Result of formatting one slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOutcome {
    pub slot: SlotId,
    /// Formatted text differs from the text before formatting.
    pub changed: bool,
}

impl Engine {
    /// Format one active slot.
    ///
    /// Returns `None` without side effects when the formatter is not ready, the
    /// slot is unknown or inactive, or its live content is blank. Formatter
    /// failures are reported and also yield `None`.
    pub async fn format_slot(&mut self, id: &str, silent: bool) -> Option<FormatOutcome> {
        if !self.formatter_ready() {
            return None;
        }
        let slot_id = self.registry.resolve(id)?;
        let before = self.registry.get(&slot_id)?.widget.as_ref()?.widget.value();
        if is_blank(&before) {
            return None;
        }
        if let Some(slot) = self.registry.get_mut(&slot_id)
            && slot.sync_from_widget()
        {
            self.registry.refresh_dirty(&slot_id);
        }

        let formatter = self.formatter.as_deref()?;
        let formatted = match formatter.format(&before).await {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(slot = %slot_id, error = %err, "Formatting failed");
                if !silent {
                    let label = self.label(&slot_id);
                    self.toast(&format!("Could not format {label}."), ToastLevel::Error);
                }
                return None;
            }
        };

        let changed = formatted != before;
        if let Some(slot) = self.registry.get_mut(&slot_id) {
            slot.replace_content(formatted);
        }
        self.registry.refresh_dirty(&slot_id);
        if changed {
            self.notify_content_changed(&slot_id);
        }
        self.persist();
        self.refresh_views();

        if !silent {
            let label = self.label(&slot_id);
            if changed {
                self.toast(&format!("Formatted {label}."), ToastLevel::Success);
            } else {
                self.toast(&format!("{label} is already formatted."), ToastLevel::Info);
            }
        }
        Some(FormatOutcome {
            slot: slot_id,
            changed,
        })
    }

    /// Format every active slot silently and report once.
    pub async fn format_all_active(&mut self) -> Vec<FormatOutcome> {
        if !self.formatter_ready() {
            return Vec::new();
        }
        let mut outcomes = Vec::new();
        for id in self.registry.active_ids() {
            if let Some(outcome) = self.format_slot(&id, true).await {
                outcomes.push(outcome);
            }
        }

        let changed: Vec<&FormatOutcome> = outcomes.iter().filter(|o| o.changed).collect();
        match changed.as_slice() {
            [] => self.toast("All editors are already formatted.", ToastLevel::Info),
            [only] => {
                let label = self.label(&only.slot);
                self.toast(&format!("Formatted {label}."), ToastLevel::Success);
            }
            many => self.toast(
                &format!("Formatted {} editors.", many.len()),
                ToastLevel::Success,
            ),
        }
        outcomes
    }
}
