//! Keyboard chord model.
//!
//! Matching uses the physical key position (`KeyboardEvent.code` style names such
//! as `"KeyS"`), never the produced character, so shortcuts behave the same on
//! every keyboard layout.

/// Physical key position relevant to editor shortcuts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PhysicalKey {
    S,
    F,
    Other(String),
}

impl PhysicalKey {
    /// Parse a physical key code (`"KeyS"`, `"KeyF"`, `"Digit1"`, ...).
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code {
            "KeyS" => PhysicalKey::S,
            "KeyF" => PhysicalKey::F,
            other => PhysicalKey::Other(other.to_string()),
        }
    }
}

/// One key-down event: the physical key plus modifier state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyChord {
    pub key: PhysicalKey,
    pub ctrl: bool,
    /// Cmd on macOS.
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
}

impl KeyChord {
    #[must_use]
    pub fn new(key: PhysicalKey) -> Self {
        Self {
            key,
            ctrl: false,
            meta: false,
            shift: false,
            alt: false,
        }
    }

    #[must_use]
    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    #[must_use]
    pub fn meta(mut self) -> Self {
        self.meta = true;
        self
    }

    #[must_use]
    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    #[must_use]
    pub fn alt(mut self) -> Self {
        self.alt = true;
        self
    }

    /// Resolve the chord to an editor shortcut.
    ///
    /// Priority: save-all, then save-focused, then format-all.
    #[must_use]
    pub fn shortcut(&self) -> Option<Shortcut> {
        let command = self.ctrl || self.meta;
        if !command {
            return None;
        }
        match (&self.key, self.shift) {
            (PhysicalKey::S, true) => Some(Shortcut::SaveAll),
            (PhysicalKey::S, false) => Some(Shortcut::SaveFocused),
            (PhysicalKey::F, true) => Some(Shortcut::FormatAll),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shortcut {
    /// (Ctrl|Cmd)+Shift+S
    SaveAll,
    /// (Ctrl|Cmd)+S
    SaveFocused,
    /// (Ctrl|Cmd)+Shift+F
    FormatAll,
}
