//! Two-phase revert to baseline.
//!
//! The first request on a control either reports that there is nothing to
//! discard or arms an inline confirmation. A confirm within the timeout
//! reverts; once the timeout passes the control is idle again.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use slotedit_types::{ConfirmMachine, SlotId, ToastLevel};

use crate::Engine;

/// What a discard control reverts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DiscardTarget {
    All,
    Slot(SlotId),
}

impl fmt::Display for DiscardTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscardTarget::All => f.write_str("all"),
            DiscardTarget::Slot(id) => write!(f, "slot:{id}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardStep {
    /// Target was clean; a transient notice was shown.
    NothingToDiscard,
    /// Inline confirmation is now armed.
    Armed,
    /// Reverted this many slots.
    Reverted(usize),
    /// Confirm arrived while the control was idle (never armed, or timed out).
    NotArmed,
    /// Target names an unknown slot.
    Ignored,
}

/// One confirmation state machine per discard control.
pub(crate) struct DiscardConfirmations {
    timeout: Duration,
    machines: HashMap<DiscardTarget, ConfirmMachine>,
}

impl DiscardConfirmations {
    pub(crate) fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            machines: HashMap::new(),
        }
    }

    fn machine(&mut self, target: &DiscardTarget) -> &mut ConfirmMachine {
        let timeout = self.timeout;
        self.machines
            .entry(target.clone())
            .or_insert_with(|| ConfirmMachine::new(timeout))
    }

    pub(crate) fn is_armed(&self, target: &DiscardTarget, now: Instant) -> bool {
        self.machines.get(target).is_some_and(|m| m.is_armed(now))
    }
}

impl Engine {
    /// First interaction with a discard control. A repeat while armed confirms.
    pub fn request_discard(&mut self, target: &DiscardTarget, now: Instant) -> DiscardStep {
        if !self.target_exists(target) {
            return DiscardStep::Ignored;
        }
        if self.confirmations.is_armed(target, now) {
            return self.confirm_discard(target, now);
        }

        self.sync_all_widgets();
        if self.discardable(target).is_empty() {
            self.ui.show_no_changes(target);
            return DiscardStep::NothingToDiscard;
        }

        self.confirmations.machine(target).arm(now);
        self.ui.arm_inline_confirmation(target);
        tracing::debug!(%target, "Discard armed");
        DiscardStep::Armed
    }

    /// Confirming interaction. Reverts only if the control is still armed.
    pub fn confirm_discard(&mut self, target: &DiscardTarget, now: Instant) -> DiscardStep {
        if !self.target_exists(target) {
            return DiscardStep::Ignored;
        }
        if !self.confirmations.machine(target).confirm(now) {
            return DiscardStep::NotArmed;
        }

        self.sync_all_widgets();
        let reverted = self.discardable(target);
        for id in &reverted {
            let baseline = self.registry.baseline(id).to_string();
            if let Some(slot) = self.registry.get_mut(id) {
                slot.replace_content(baseline);
                slot.dirty = false;
            }
            self.notify_content_changed(id);
        }
        tracing::info!(%target, slots = reverted.len(), "Discarded changes");

        if self.registry.any_dirty() {
            self.persist();
        } else {
            self.clear_persisted();
        }
        self.refresh_views();

        let message = match target {
            DiscardTarget::All => "Discarded all unsaved changes.".to_string(),
            DiscardTarget::Slot(id) => format!("Reverted {}.", self.label(id)),
        };
        self.toast(&message, ToastLevel::Info);
        DiscardStep::Reverted(reverted.len())
    }

    fn target_exists(&self, target: &DiscardTarget) -> bool {
        match target {
            DiscardTarget::All => true,
            DiscardTarget::Slot(id) => self.registry.contains(id),
        }
    }

    fn discardable(&self, target: &DiscardTarget) -> Vec<SlotId> {
        match target {
            DiscardTarget::All => self
                .registry
                .ids()
                .iter()
                .filter(|id| self.registry.is_modified(id))
                .cloned()
                .collect(),
            DiscardTarget::Slot(id) if self.registry.is_modified(id) => vec![id.clone()],
            DiscardTarget::Slot(_) => Vec::new(),
        }
    }
}
