//! Which slots are open.
//!
//! A plain click opens one slot exclusively; a modified click (Ctrl/Cmd) toggles
//! membership without touching the others, up to the configured ceiling.

use slotedit_types::ToastLevel;

use crate::Engine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Unknown slot, or a plain click on the only open slot.
    Unchanged,
    /// Plain click: this slot is now the only active one.
    Exclusive,
    Activated,
    Deactivated,
    /// Modified click would exceed the ceiling; nothing changed.
    Rejected { limit: usize },
}

impl Engine {
    pub fn toggle(&mut self, id: &str, modifier_pressed: bool) -> ToggleOutcome {
        let Some(slot_id) = self.registry.resolve(id) else {
            return ToggleOutcome::Unchanged;
        };

        let outcome = if modifier_pressed {
            if self.is_active(id) {
                self.deactivate_slot(&slot_id);
                ToggleOutcome::Deactivated
            } else {
                let limit = self.active_ceiling();
                if self.registry.active_count() >= limit {
                    self.toast(
                        &format!("You can open at most {limit} editors at once."),
                        ToastLevel::Warning,
                    );
                    return ToggleOutcome::Rejected { limit };
                }
                self.activate_slot(&slot_id);
                ToggleOutcome::Activated
            }
        } else {
            let active = self.registry.active_ids();
            if active.len() == 1 && active[0] == slot_id {
                return ToggleOutcome::Unchanged;
            }
            self.activate_exclusive(&slot_id);
            ToggleOutcome::Exclusive
        };

        self.refresh_views();
        self.persist();
        outcome
    }
}
