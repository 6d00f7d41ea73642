//! Loading a local file into a slot, and the reverse.

use std::path::Path;

use slotedit_types::{SlotId, ToastLevel, is_blank};

use crate::Engine;
use crate::error::ImportError;

/// Slot content packaged for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub file_name: String,
    pub content: String,
}

impl Engine {
    /// Replace a slot's content with an uploaded file.
    ///
    /// The file is validated before anything changes: the slot must exist,
    /// the extension must match the engine kind, the size must be within
    /// `import.max_bytes` and the body must be non-blank UTF-8. An inactive slot
    /// is opened first (exclusively if the ceiling is reached) and given the
    /// widget settle delay before its content is replaced.
    pub async fn import_file(
        &mut self,
        id: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<(), ImportError> {
        let (slot_id, text) = match self.validate_import(id, file_name, bytes) {
            Ok(valid) => valid,
            Err(err) => {
                tracing::warn!(slot = id, file = file_name, error = %err, "Import rejected");
                self.toast(&err.to_string(), ToastLevel::Error);
                return Err(err);
            }
        };

        if !self.is_active(&slot_id) {
            if self.registry.active_count() < self.active_ceiling() {
                self.activate_slot(&slot_id);
            } else {
                self.activate_exclusive(&slot_id);
            }
            self.refresh_views();
            let settle = self.settings.widget_settle;
            if !settle.is_zero() {
                tokio::time::sleep(settle).await;
            }
        }

        if let Some(slot) = self.registry.get_mut(&slot_id) {
            slot.replace_content(text);
        }
        self.registry.refresh_dirty(&slot_id);
        self.notify_content_changed(&slot_id);
        self.persist();
        self.refresh_views();

        let label = self.label(&slot_id);
        tracing::info!(slot = %slot_id, file = file_name, bytes = bytes.len(), "File imported");
        self.toast(
            &format!("Imported {file_name} into {label}."),
            ToastLevel::Success,
        );
        Ok(())
    }

    fn validate_import(
        &self,
        id: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<(SlotId, String), ImportError> {
        let slot_id = self
            .registry
            .resolve(id)
            .ok_or_else(|| ImportError::UnknownSlot(id.to_string()))?;

        let allowed = self.kind().file_extensions();
        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        if !extension.is_some_and(|e| allowed.contains(&e.as_str())) {
            return Err(ImportError::UnsupportedType {
                file_name: file_name.to_string(),
                expected: allowed
                    .iter()
                    .map(|e| format!(".{e}"))
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }

        let limit = self.settings.max_import_bytes;
        if bytes.len() > limit {
            return Err(ImportError::TooLarge {
                file_name: file_name.to_string(),
                size: bytes.len(),
                limit,
            });
        }
        if bytes.is_empty() {
            return Err(ImportError::Empty {
                file_name: file_name.to_string(),
            });
        }
        let text = String::from_utf8(bytes.to_vec()).map_err(|_| ImportError::NotUtf8 {
            file_name: file_name.to_string(),
        })?;
        if is_blank(&text) {
            return Err(ImportError::Empty {
                file_name: file_name.to_string(),
            });
        }
        Ok((slot_id, text))
    }

    /// Current content of a slot as a downloadable file.
    ///
    /// The live widget value is used for active slots.
    #[must_use]
    pub fn export_slot(&self, id: &str) -> Option<ExportedFile> {
        let slot = self.registry.get(id)?;
        let content = slot
            .widget
            .as_ref()
            .map_or_else(|| slot.content.clone(), |m| m.widget.value());
        let extension = self.kind().file_extensions().first().copied().unwrap_or("txt");
        let stem: String = slot
            .spec
            .id()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        Some(ExportedFile {
            file_name: format!("{stem}.{extension}"),
            content,
        })
    }
}
