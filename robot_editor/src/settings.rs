//! Editor settings persistence
//!
//! Settings are stored as versioned JSON. Loading is safe against
//! corruption: a damaged or foreign document falls back to defaults.

use robot_core::{EditorConfig, MacroLibrary, MacroTemplate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of quick macro slots
pub const QUICK_MACRO_SLOTS: usize = 5;

/// Longest text a quick macro slot holds
pub const MAX_QUICK_MACRO_TEXT: usize = 63;

/// Serializable editor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorSettings {
    /// Version of the settings format (for future migrations)
    pub version: u32,
    #[serde(default)]
    pub config: EditorConfig,
    /// Text typed in by `quick N` when no template named `N` exists
    #[serde(default = "default_quick_macros")]
    pub quick_macros: Vec<String>,
    #[serde(default)]
    pub macros: Vec<MacroTemplate>,
}

fn default_quick_macros() -> Vec<String> {
    vec![String::new(); QUICK_MACRO_SLOTS]
}

fn clamp_quick_text(text: &str) -> &str {
    let mut end = text.len().min(MAX_QUICK_MACRO_TEXT);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

impl EditorSettings {
    /// Current version of the settings format
    pub const CURRENT_VERSION: u32 = 1;

    pub fn new() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            config: EditorConfig::default(),
            quick_macros: default_quick_macros(),
            macros: Vec::new(),
        }
    }

    /// Quick macro text for slot `slot` (1-based)
    pub fn quick_macro(&self, slot: usize) -> Option<&str> {
        if !(1..=QUICK_MACRO_SLOTS).contains(&slot) {
            return None;
        }
        self.quick_macros.get(slot - 1).map(String::as_str)
    }

    /// Store quick macro text, truncated to the slot size
    pub fn set_quick_macro(&mut self, slot: usize, text: &str) -> bool {
        if !(1..=QUICK_MACRO_SLOTS).contains(&slot) {
            return false;
        }
        if self.quick_macros.len() < QUICK_MACRO_SLOTS {
            self.quick_macros.resize(QUICK_MACRO_SLOTS, String::new());
        }
        self.quick_macros[slot - 1] = clamp_quick_text(text).to_string();
        true
    }

    /// Bring quick macros to exactly the slot count and slot size
    fn normalize_quick_macros(&mut self) {
        self.quick_macros.resize(QUICK_MACRO_SLOTS, String::new());
        for text in &mut self.quick_macros {
            let clamped = clamp_quick_text(text).len();
            text.truncate(clamped);
        }
    }

    pub fn macro_library(&self) -> MacroLibrary {
        self.macros.iter().cloned().collect()
    }
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self::new()
    }
}

/// Result type for settings operations
pub type SettingsResult<T> = Result<T, SettingsError>;

/// Errors that can occur during settings persistence
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Failed to serialize settings: {0}")]
    SerializationFailed(String),

    #[error("Failed to deserialize settings: {0}")]
    DeserializationFailed(String),

    #[error("Unsupported settings version: {0}")]
    UnsupportedVersion(u32),
}

/// Serializes settings to JSON bytes
pub fn serialize_settings(settings: &EditorSettings) -> SettingsResult<Vec<u8>> {
    serde_json::to_vec_pretty(settings).map_err(|e| SettingsError::SerializationFailed(e.to_string()))
}

/// Deserializes settings from JSON bytes
pub fn deserialize_settings(bytes: &[u8]) -> SettingsResult<EditorSettings> {
    let mut settings: EditorSettings = serde_json::from_slice(bytes)
        .map_err(|e| SettingsError::DeserializationFailed(e.to_string()))?;

    if settings.version != EditorSettings::CURRENT_VERSION {
        return Err(SettingsError::UnsupportedVersion(settings.version));
    }

    settings.normalize_quick_macros();
    Ok(settings)
}

/// Attempts to load settings from bytes, falling back to defaults on error
pub fn load_settings_safe(bytes: &[u8]) -> EditorSettings {
    match deserialize_settings(bytes) {
        Ok(settings) => settings,
        Err(err) => {
            tracing::warn!(error = %err, "settings unreadable, using defaults");
            EditorSettings::new()
        }
    }
}
