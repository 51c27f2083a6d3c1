//! Editor configuration

use serde::{Deserialize, Serialize};

use crate::line::Disposition;
use crate::store::DEFAULT_MAX_SIZE;

/// Tunables for one editing session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Program capacity in bytes, framing included
    pub max_size: usize,
    /// How a line that fails to compile is classified when it has no
    /// classification of its own yet
    pub default_invalid: Disposition,
    /// Nesting depth at which macro expansion stops
    pub max_macro_recursion: usize,
    /// Expansions allowed per top-level edit
    pub max_macro_repeat: usize,
    pub wrap_search: bool,
    pub case_sensitive: bool,
}

impl EditorConfig {
    pub const DEFAULT_MACRO_RECURSION: usize = 16;
    pub const DEFAULT_MACRO_REPEAT: usize = 128;
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            default_invalid: Disposition::Ignore,
            max_macro_recursion: Self::DEFAULT_MACRO_RECURSION,
            max_macro_repeat: Self::DEFAULT_MACRO_REPEAT,
            wrap_search: true,
            case_sensitive: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EditorConfig::default();
        assert_eq!(config.max_size, 65_535);
        assert_eq!(config.default_invalid, Disposition::Ignore);
        assert_eq!(config.max_macro_recursion, 16);
        assert_eq!(config.max_macro_repeat, 128);
        assert!(config.wrap_search);
        assert!(!config.case_sensitive);
    }
}
