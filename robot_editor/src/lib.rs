//! # Robot Editor
//!
//! Session host around `robot_core` for editing robot programs.
//!
//! ## Philosophy
//!
//! - **Injected surroundings**: storage and clipboard come in as traits, so
//!   sessions run the same under tests as under a real host
//! - **Explicit close**: a program with undecided lines is not stored
//!   unless the close is forced
//! - **Typed commands**: ex-style command text is parsed once, up front
//!
//! ## Non-Goals
//!
//! This is NOT:
//! - A renderer or dialog toolkit
//! - A keyboard or mouse decoder
//! - Platform clipboard glue
//!
//! ## Design
//!
//! - `Editor` owns one `EditorCore` plus its storage, clipboard and settings
//! - Commands arrive as text and are parsed by `CommandParser`
//! - Every session carries a `SessionId` in its log events

pub mod clipboard;
pub mod commands;
pub mod editor;
pub mod ids;
pub mod io;
pub mod settings;

pub use clipboard::{ClipboardBridge, MemoryClipboard, NoClipboard};
pub use commands::{Command, CommandError, CommandParser};
pub use editor::{CloseOutcome, Editor, EditorAction, EditorError, EditorResult, InsertSummary};
pub use ids::SessionId;
pub use io::{ImportData, IoError, MemoryProgramStorage, ProgramStorage};
pub use settings::{
    deserialize_settings, load_settings_safe, serialize_settings, EditorSettings, SettingsError,
};
