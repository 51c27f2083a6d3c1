//! Editing commands
//!
//! Input layers translate keys, menus or ex commands into [`EditCommand`]s
//! and hand them to `EditorCore::apply`.

use crate::line::Disposition;
use crate::search::FindOptions;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditCommand {
    /// Insert a line above the cursor line
    InsertBefore(String),
    /// Insert a line below the cursor line
    InsertAfter(String),
    /// Replace the cursor line's text
    SetLine(String),
    DeleteLine,
    MoveCursor(isize),
    GotoLine(usize),
    SetColumn(usize),
    MarkBegin,
    MarkEnd,
    Unmark,
    CopyBlock,
    CutBlock,
    ClearBlock,
    Find {
        pattern: String,
        options: Option<FindOptions>,
    },
    /// Repeat the last find
    FindNext,
    Replace {
        pattern: String,
        replacement: String,
    },
    ReplaceAll {
        pattern: String,
        replacement: String,
    },
    /// Apply one disposition to every unresolved line
    Validate(Disposition),
    /// Expand `name(args)` above the cursor
    RunMacro(String),
    /// Numbered macro slot, with the text typed in when no template of
    /// that number exists
    QuickMacro { slot: usize, fallback: String },
}
