//! Resolved editor settings.
//!
//! Existence of an [`EditorSettings`] value is the proof that every setting
//! parsed and passed validation; raw lookups never leak past this module.

use std::collections::HashSet;
use std::time::Duration;

use serde::Deserialize;
use slotedit_types::{EngineKind, SlotId, SlotSpec};

use crate::{ConfigError, ConfigSource};

pub const DEFAULT_APP_ID: &str = "slotedit";
pub const DEFAULT_CSRF_FIELD: &str = "csrf_token";
pub const DEFAULT_DESKTOP_BREAKPOINT: u32 = 1024;
pub const DEFAULT_MAX_ACTIVE_SLOTS: usize = 3;
pub const DEFAULT_CONFIRM_TIMEOUT_MS: u64 = 3000;
pub const DEFAULT_WIDGET_SETTLE_MS: u64 = 50;
pub const DEFAULT_MAX_IMPORT_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone, PartialEq)]
pub struct EditorSettings {
    /// Document endpoint; fetched for the session token and posted for saves.
    pub endpoint: Option<String>,
    /// Storage key for the persisted engine-state blob.
    pub app_id: String,
    /// Name of the anti-forgery field added to every write.
    pub csrf_field: String,
    pub kind: EngineKind,
    pub desktop_breakpoint: u32,
    /// Ceiling on simultaneously open slots in desktop view (always >= 1).
    pub max_active_slots: usize,
    pub format_on_save: bool,
    pub confirm_timeout: Duration,
    /// Pause between activating a widget and importing content into it.
    pub widget_settle: Duration,
    pub max_import_bytes: usize,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            app_id: DEFAULT_APP_ID.to_string(),
            csrf_field: DEFAULT_CSRF_FIELD.to_string(),
            kind: EngineKind::default(),
            desktop_breakpoint: DEFAULT_DESKTOP_BREAKPOINT,
            max_active_slots: DEFAULT_MAX_ACTIVE_SLOTS,
            format_on_save: true,
            confirm_timeout: Duration::from_millis(DEFAULT_CONFIRM_TIMEOUT_MS),
            widget_settle: Duration::from_millis(DEFAULT_WIDGET_SETTLE_MS),
            max_import_bytes: DEFAULT_MAX_IMPORT_BYTES,
        }
    }
}

impl EditorSettings {
    pub fn resolve(source: &dyn ConfigSource) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let endpoint = get_string(source, "server.endpoint")?.filter(|s| !s.trim().is_empty());
        let app_id = get_string(source, "server.app_id")?.unwrap_or(defaults.app_id);
        if app_id.trim().is_empty() {
            return Err(ConfigError::invalid("server.app_id", "must not be empty"));
        }
        let csrf_field = get_string(source, "server.csrf_field")?.unwrap_or(defaults.csrf_field);
        if csrf_field.trim().is_empty() {
            return Err(ConfigError::invalid("server.csrf_field", "must not be empty"));
        }

        let kind = match get_string(source, "editor.kind")? {
            Some(raw) => EngineKind::parse(&raw).ok_or_else(|| {
                ConfigError::invalid("editor.kind", format!("expected \"roles\" or \"fields\", got {raw:?}"))
            })?,
            None => defaults.kind,
        };

        let desktop_breakpoint = match get_u64(source, "editor.desktop_breakpoint")? {
            Some(raw) => u32::try_from(raw)
                .map_err(|_| ConfigError::invalid("editor.desktop_breakpoint", "out of range"))?,
            None => defaults.desktop_breakpoint,
        };

        let max_active_slots = match get_u64(source, "editor.max_active_slots")? {
            Some(0) => {
                return Err(ConfigError::invalid(
                    "editor.max_active_slots",
                    "must be at least 1",
                ));
            }
            Some(raw) => usize::try_from(raw)
                .map_err(|_| ConfigError::invalid("editor.max_active_slots", "out of range"))?,
            None => defaults.max_active_slots,
        };

        let format_on_save =
            get_bool(source, "editor.format_on_save")?.unwrap_or(defaults.format_on_save);

        let confirm_timeout = get_u64(source, "editor.confirm_timeout_ms")?
            .map_or(defaults.confirm_timeout, Duration::from_millis);
        let widget_settle = get_u64(source, "editor.widget_settle_ms")?
            .map_or(defaults.widget_settle, Duration::from_millis);

        let max_import_bytes = match get_u64(source, "import.max_bytes")? {
            Some(0) => return Err(ConfigError::invalid("import.max_bytes", "must be at least 1")),
            Some(raw) => usize::try_from(raw)
                .map_err(|_| ConfigError::invalid("import.max_bytes", "out of range"))?,
            None => defaults.max_import_bytes,
        };

        Ok(Self {
            endpoint,
            app_id,
            csrf_field,
            kind,
            desktop_breakpoint,
            max_active_slots,
            format_on_save,
            confirm_timeout,
            widget_settle,
            max_import_bytes,
        })
    }
}

#[derive(Deserialize)]
struct RawSlot {
    id: String,
    label: Option<String>,
    field: Option<String>,
}

/// Read the static slot list from the `slots` array of tables.
///
/// Label defaults to the id, field name defaults to the id. Field names must be
/// unique and must not collide with `server.csrf_field`: every write carries
/// all of them as one form.
pub fn slots_from_source(source: &dyn ConfigSource) -> Result<Vec<SlotSpec>, ConfigError> {
    let Some(value) = source.get("slots") else {
        return Err(ConfigError::invalid("slots", "at least one slot must be configured"));
    };
    let toml::Value::Array(items) = value else {
        return Err(ConfigError::invalid("slots", "expected an array of tables"));
    };

    let csrf_field =
        get_string(source, "server.csrf_field")?.unwrap_or_else(|| DEFAULT_CSRF_FIELD.to_string());
    let mut seen = HashSet::new();
    let mut fields = HashSet::new();
    let mut slots = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let raw: RawSlot = item
            .try_into()
            .map_err(|e| ConfigError::invalid(&format!("slots[{index}]"), e.to_string()))?;
        let id = SlotId::new(raw.id)
            .map_err(|e| ConfigError::invalid(&format!("slots[{index}].id"), e.to_string()))?;
        if !seen.insert(id.clone()) {
            return Err(ConfigError::invalid(
                &format!("slots[{index}].id"),
                format!("duplicate slot id {id:?}"),
            ));
        }
        let label = raw.label.unwrap_or_else(|| id.to_string());
        let field = raw.field.unwrap_or_else(|| id.to_string());
        if field == csrf_field {
            return Err(ConfigError::invalid(
                &format!("slots[{index}].field"),
                format!("{field:?} is reserved for the anti-forgery token"),
            ));
        }
        if !fields.insert(field.clone()) {
            return Err(ConfigError::invalid(
                &format!("slots[{index}].field"),
                format!("duplicate field {field:?}"),
            ));
        }
        slots.push(SlotSpec::new(id, label, field));
    }

    if slots.is_empty() {
        return Err(ConfigError::invalid("slots", "at least one slot must be configured"));
    }
    Ok(slots)
}

fn get_string(source: &dyn ConfigSource, key: &str) -> Result<Option<String>, ConfigError> {
    match source.get(key) {
        None => Ok(None),
        Some(toml::Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(ConfigError::invalid(
            key,
            format!("expected a string, got {}", other.type_str()),
        )),
    }
}

fn get_u64(source: &dyn ConfigSource, key: &str) -> Result<Option<u64>, ConfigError> {
    match source.get(key) {
        None => Ok(None),
        Some(toml::Value::Integer(n)) => u64::try_from(n)
            .map(Some)
            .map_err(|_| ConfigError::invalid(key, "must not be negative")),
        Some(other) => Err(ConfigError::invalid(
            key,
            format!("expected an integer, got {}", other.type_str()),
        )),
    }
}

fn get_bool(source: &dyn ConfigSource, key: &str) -> Result<Option<bool>, ConfigError> {
    match source.get(key) {
        None => Ok(None),
        Some(toml::Value::Boolean(b)) => Ok(Some(b)),
        Some(other) => Err(ConfigError::invalid(
            key,
            format!("expected a boolean, got {}", other.type_str()),
        )),
    }
}
