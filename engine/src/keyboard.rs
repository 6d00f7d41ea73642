//! Keyboard shortcut dispatch.
//!
//! Chords are matched on physical key codes so the bindings are identical on
//! every keyboard layout. A match asks the host to prevent the default action;
//! propagation is never stopped.

use slotedit_types::{KeyChord, Shortcut, ToastLevel};

use crate::Engine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyDisposition {
    pub prevent_default: bool,
}

impl KeyDisposition {
    const IGNORED: Self = Self {
        prevent_default: false,
    };
    const HANDLED: Self = Self {
        prevent_default: true,
    };
}

impl Engine {
    /// Dispatch one key-down event.
    ///
    /// Save failures are already reported through the UI; they are not
    /// surfaced again here.
    pub async fn handle_key(&mut self, chord: &KeyChord) -> KeyDisposition {
        let Some(shortcut) = chord.shortcut() else {
            return KeyDisposition::IGNORED;
        };
        tracing::debug!(?shortcut, "Shortcut matched");

        match shortcut {
            Shortcut::SaveAll => {
                let _ = self.save_all().await;
            }
            Shortcut::SaveFocused => match self.active_editor.clone() {
                Some(id) => {
                    let _ = self.save_slot(&id).await;
                }
                None => self.toast("No editor focused.", ToastLevel::Info),
            },
            Shortcut::FormatAll => {
                // Stay quiet when the formatter never loaded.
                if self.formatter_ready() {
                    self.format_all_active().await;
                }
            }
        }
        KeyDisposition::HANDLED
    }
}
