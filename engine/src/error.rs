//! Error taxonomy.
//!
//! - Configuration errors ([`EngineError`], [`HookError`]) indicate a host
//!   integration bug and are surfaced loudly.
//! - Transient operation errors ([`SaveError::Transport`], [`FormatError`]) abort
//!   the operation, leave baselines untouched and can simply be retried.
//! - Validation errors ([`ImportError`]) are raised before any state mutation.

use slotedit_transport::TransportError;
use slotedit_types::SlotId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("missing required capability: {0}")]
    MissingCapability(&'static str),
    #[error("no document endpoint configured (server.endpoint)")]
    MissingEndpoint,
    #[error("at least one slot must be configured")]
    NoSlots,
    #[error("duplicate slot id: {0}")]
    DuplicateSlot(SlotId),
    #[error("form field {0:?} is mapped to more than one slot")]
    DuplicateField(String),
    #[error("form field {0:?} is reserved for the anti-forgery token")]
    ReservedField(String),
    #[error("max_active_slots must be at least 1")]
    InvalidMaxActive,
}

/// A required host hook could not produce its result.
#[derive(Debug, Error)]
#[error("host hook `{hook}` failed: {message}")]
pub struct HookError {
    pub hook: &'static str,
    pub message: String,
}

impl HookError {
    #[must_use]
    pub fn new(hook: &'static str, message: impl Into<String>) -> Self {
        Self {
            hook,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("unknown slot: {0}")]
    UnknownSlot(String),
    #[error("no session token; reload the editor")]
    NoSessionToken,
    #[error(transparent)]
    Hook(#[from] HookError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl SaveError {
    /// Notice shown to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            SaveError::UnknownSlot(id) => format!("Cannot save unknown editor \"{id}\"."),
            SaveError::NoSessionToken => {
                "Your editing session has no security token. Reload the page and try again."
                    .to_string()
            }
            SaveError::Hook(err) => format!("Save is not wired up correctly: {err}"),
            SaveError::Transport(err) => err.user_message(),
        }
    }
}

#[derive(Debug, Error)]
#[error("formatter failed: {message}")]
pub struct FormatError {
    pub message: String,
}

impl FormatError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored state is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImportError {
    #[error("unknown slot: {0}")]
    UnknownSlot(String),
    #[error("\"{file_name}\" is not a supported file type (expected {expected})")]
    UnsupportedType { file_name: String, expected: String },
    #[error("\"{file_name}\" is too large ({size} bytes, limit {limit} bytes)")]
    TooLarge {
        file_name: String,
        size: usize,
        limit: usize,
    },
    #[error("\"{file_name}\" is empty")]
    Empty { file_name: String },
    #[error("\"{file_name}\" is not valid UTF-8 text")]
    NotUtf8 { file_name: String },
}
