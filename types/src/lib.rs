//! Core domain types for slotedit.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory
#![allow(clippy::missing_panics_doc)] // Panics are documented in assertions

mod confirm;
mod keys;
mod text;

pub use confirm::{ConfirmMachine, ConfirmState};
pub use keys::{KeyChord, PhysicalKey, Shortcut};
pub use text::{excerpt, is_blank};

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

// ============================================================================
// Slot identity
// ============================================================================

/// Stable key of one editable slot (a role's CSS or a field's HTML).
///
/// Invariant: non-empty after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SlotId(String);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("slot id must not be empty")]
pub struct EmptySlotIdError;

impl SlotId {
    pub fn new(value: impl Into<String>) -> Result<Self, EmptySlotIdError> {
        let value = value.into();
        if value.trim().is_empty() {
            Err(EmptySlotIdError)
        } else {
            Ok(Self(value))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SlotId {
    type Error = EmptySlotIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for SlotId {
    type Error = EmptySlotIdError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SlotId> for String {
    fn from(value: SlotId) -> Self {
        value.0
    }
}

impl std::ops::Deref for SlotId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl AsRef<str> for SlotId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SlotId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Static configuration of one slot.
///
/// `field` is the form field name the host writes this slot's text under when
/// it builds the full-document payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSpec {
    id: SlotId,
    label: String,
    field: String,
}

impl SlotSpec {
    #[must_use]
    pub fn new(id: SlotId, label: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            field: field.into(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &SlotId {
        &self.id
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }
}

// ============================================================================
// Engine flavour
// ============================================================================

/// Which concrete editor is built on the shared engine.
///
/// The two flavours differ only in naming: the persisted "active ids" key and
/// the file extensions accepted for import/export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Permission-role CSS sheets.
    Roles,
    /// Page-HTML head/tail fields.
    #[default]
    Fields,
}

impl EngineKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EngineKind::Roles => "roles",
            EngineKind::Fields => "fields",
        }
    }

    /// Key under which the persisted blob stores the active slot ids.
    #[must_use]
    pub fn active_key(self) -> &'static str {
        match self {
            EngineKind::Roles => "activeRoles",
            EngineKind::Fields => "activeFields",
        }
    }

    /// Accepted file extensions for import, lowercase without the dot.
    /// The first entry is used for export.
    #[must_use]
    pub fn file_extensions(self) -> &'static [&'static str] {
        match self {
            EngineKind::Roles => &["css"],
            EngineKind::Fields => &["html", "htm"],
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "roles" | "role" | "css" => Some(EngineKind::Roles),
            "fields" | "field" | "html" => Some(EngineKind::Fields),
            _ => None,
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Layout and notices
// ============================================================================

/// Layout bucket derived from the container width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewMode {
    /// Button row, several slots may be open.
    Desktop,
    /// Single-select dropdown, exactly one slot open.
    Mobile,
}

impl ViewMode {
    #[must_use]
    pub fn from_width(container_width: u32, desktop_breakpoint: u32) -> Self {
        if container_width < desktop_breakpoint {
            ViewMode::Mobile
        } else {
            ViewMode::Desktop
        }
    }

    #[must_use]
    pub fn is_mobile(self) -> bool {
        matches!(self, ViewMode::Mobile)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToastLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl ToastLevel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ToastLevel::Info => "info",
            ToastLevel::Success => "success",
            ToastLevel::Warning => "warning",
            ToastLevel::Error => "error",
        }
    }
}

/// Form field name -> text. Ordered so payloads are deterministic.
pub type FieldMap = BTreeMap<String, String>;

/// Read-only view of one slot for rendering the grid and toggle row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotView {
    pub id: SlotId,
    pub label: String,
    pub active: bool,
    pub dirty: bool,
}
