//! Per-slot state and the server baseline.
//!
//! A slot is active exactly when it holds a [`MountedWidget`]; there is no
//! separate `active` flag that could drift from the widget's existence.

use std::collections::HashMap;

use slotedit_types::{SlotId, SlotSpec, SlotView};

use crate::capabilities::{Disposable, DocumentDraft, Widget};

pub(crate) struct MountedWidget {
    pub(crate) widget: Box<dyn Widget>,
    pub(crate) subscription: Box<dyn Disposable>,
}

impl MountedWidget {
    pub(crate) fn dispose(self) {
        self.subscription.dispose();
        self.widget.dispose();
    }
}

pub(crate) struct SlotState {
    pub(crate) spec: SlotSpec,
    pub(crate) content: String,
    /// Cached hint; content vs. baseline is authoritative.
    pub(crate) dirty: bool,
    pub(crate) widget: Option<MountedWidget>,
}

impl SlotState {
    fn new(spec: SlotSpec) -> Self {
        Self {
            spec,
            content: String::new(),
            dirty: false,
            widget: None,
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.widget.is_some()
    }

    /// Pull the widget's live value into `content`. Returns `true` if it changed.
    pub(crate) fn sync_from_widget(&mut self) -> bool {
        let Some(mounted) = &self.widget else {
            return false;
        };
        let live = mounted.widget.value();
        if live == self.content {
            return false;
        }
        self.content = live;
        true
    }

    /// Replace content and push it into the widget, if any.
    pub(crate) fn replace_content(&mut self, text: String) {
        if let Some(mounted) = &mut self.widget
            && mounted.widget.value() != text
        {
            mounted.widget.set_value(&text);
        }
        self.content = text;
    }
}

/// Fixed set of slots in configuration order, plus the baseline map.
pub(crate) struct SlotRegistry {
    order: Vec<SlotId>,
    slots: HashMap<SlotId, SlotState>,
    baseline: HashMap<SlotId, String>,
}

impl SlotRegistry {
    /// Callers guarantee `specs` is non-empty with unique ids.
    pub(crate) fn new(specs: Vec<SlotSpec>) -> Self {
        let order = specs.iter().map(|s| s.id().clone()).collect();
        let slots = specs
            .into_iter()
            .map(|spec| (spec.id().clone(), SlotState::new(spec)))
            .collect();
        Self {
            order,
            slots,
            baseline: HashMap::new(),
        }
    }

    /// Look up a configured id by string.
    pub(crate) fn resolve(&self, id: &str) -> Option<SlotId> {
        self.slots.get_key_value(id).map(|(k, _)| k.clone())
    }

    pub(crate) fn contains(&self, id: &str) -> bool {
        self.slots.contains_key(id)
    }

    pub(crate) fn get(&self, id: &str) -> Option<&SlotState> {
        self.slots.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut SlotState> {
        self.slots.get_mut(id)
    }

    /// Ids in configuration order.
    pub(crate) fn ids(&self) -> &[SlotId] {
        &self.order
    }

    pub(crate) fn active_ids(&self) -> Vec<SlotId> {
        self.order
            .iter()
            .filter(|id| self.slots.get(*id).is_some_and(SlotState::is_active))
            .cloned()
            .collect()
    }

    pub(crate) fn active_count(&self) -> usize {
        self.slots.values().filter(|s| s.is_active()).count()
    }

    pub(crate) fn baseline(&self, id: &str) -> &str {
        self.baseline.get(id).map_or("", String::as_str)
    }

    pub(crate) fn set_baseline(&mut self, id: &SlotId, text: String) {
        self.baseline.insert(id.clone(), text);
    }

    /// Content differs from the baseline, or the cached flag says so.
    pub(crate) fn is_modified(&self, id: &str) -> bool {
        self.slots
            .get(id)
            .is_some_and(|slot| slot.dirty || slot.content != self.baseline(id))
    }

    pub(crate) fn any_dirty(&self) -> bool {
        self.order.iter().any(|id| self.is_modified(id))
    }

    /// Recompute the cached flag from content vs. baseline.
    pub(crate) fn refresh_dirty(&mut self, id: &str) {
        let differs = self
            .slots
            .get(id)
            .is_some_and(|slot| slot.content != self.baseline(id));
        if let Some(slot) = self.slots.get_mut(id) {
            slot.dirty = differs;
        }
    }

    pub(crate) fn baseline_document(&self) -> DocumentDraft {
        self.order
            .iter()
            .map(|id| (id.clone(), self.baseline(id).to_string()))
            .collect()
    }

    pub(crate) fn content_document(&self) -> DocumentDraft {
        self.order
            .iter()
            .filter_map(|id| self.slots.get(id).map(|s| (id.clone(), s.content.clone())))
            .collect()
    }

    pub(crate) fn views(&self) -> Vec<SlotView> {
        self.order
            .iter()
            .filter_map(|id| {
                self.slots.get(id).map(|slot| SlotView {
                    id: id.clone(),
                    label: slot.spec.label().to_string(),
                    active: slot.is_active(),
                    dirty: self.is_modified(id),
                })
            })
            .collect()
    }

    pub(crate) fn label(&self, id: &str) -> String {
        self.slots
            .get(id)
            .map_or_else(|| id.to_string(), |s| s.spec.label().to_string())
    }
}
