//! Clipboard bridge
//!
//! The editor never talks to a platform clipboard directly. Hosts hand in a
//! [`ClipboardBridge`]; when it is unavailable the session keeps its own
//! copy buffer instead.

/// Host clipboard access
pub trait ClipboardBridge {
    /// Current clipboard text, `None` when unavailable or empty
    fn read_text(&self) -> Option<String>;

    /// Replace the clipboard text; `false` when the clipboard is unavailable
    fn write_text(&mut self, text: &str) -> bool;
}

/// No clipboard at all
#[derive(Debug, Clone, Copy, Default)]
pub struct NoClipboard;

impl ClipboardBridge for NoClipboard {
    fn read_text(&self) -> Option<String> {
        None
    }

    fn write_text(&mut self, _text: &str) -> bool {
        false
    }
}

/// In-process clipboard
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    text: Option<String>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

impl ClipboardBridge for MemoryClipboard {
    fn read_text(&self) -> Option<String> {
        self.text.clone().filter(|text| !text.is_empty())
    }

    fn write_text(&mut self, text: &str) -> bool {
        self.text = Some(text.to_string());
        true
    }
}

/// Join block lines for the clipboard
pub(crate) fn join_lines(lines: &[String]) -> String {
    lines.join("\n")
}

/// Split clipboard text into lines, tolerating `\r\n`
pub(crate) fn split_lines(text: &str) -> Vec<String> {
    text.lines().map(str::to_string).collect()
}
