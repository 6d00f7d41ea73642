//! Desktop vs. mobile layout.
//!
//! In mobile view the activation UI becomes a single-select dropdown and at most
//! one slot may be open.

use slotedit_types::ViewMode;

use crate::Engine;

impl Engine {
    /// Recompute the layout bucket for a container width.
    ///
    /// Returns `true` if the mode changed (the activation UI was rebuilt).
    /// Repeated calls within the same bucket do nothing.
    pub fn recompute_view_mode(&mut self, container_width: u32, desktop_breakpoint: u32) -> bool {
        let mode = ViewMode::from_width(container_width, desktop_breakpoint);
        if self.view_mode == Some(mode) {
            return false;
        }
        let previous = self.view_mode.replace(mode);
        tracing::debug!(?previous, ?mode, container_width, "View mode changed");

        let active = self.registry.active_ids();
        let trimmed = mode.is_mobile() && active.len() > 1;
        if trimmed {
            for extra in &active[1..] {
                self.deactivate_slot(extra);
            }
        }

        let views = self.registry.views();
        self.ui.rebuild_activation_ui(mode, &views);
        self.refresh_views();
        if trimmed {
            self.persist();
        }
        true
    }

    /// [`Engine::recompute_view_mode`] with the configured breakpoint.
    pub fn on_resize(&mut self, container_width: u32) -> bool {
        let breakpoint = self.settings.desktop_breakpoint;
        self.recompute_view_mode(container_width, breakpoint)
    }

    /// Mobile dropdown selection. Returns `true` if the active set changed.
    pub fn select_slot(&mut self, id: &str) -> bool {
        let Some(slot_id) = self.registry.resolve(id) else {
            return false;
        };
        let active = self.registry.active_ids();
        if active.len() == 1 && active[0] == slot_id {
            return false;
        }
        self.activate_exclusive(&slot_id);
        self.refresh_views();
        self.persist();
        true
    }
}
