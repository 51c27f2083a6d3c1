//! # Robot Core
//!
//! Line-oriented editing engine for robot programs.
//!
//! ## Philosophy
//!
//! - **One representation per line, always in step**: every line keeps its
//!   text and its compiled bytecode together
//! - **Deterministic**: Same command trace => same editor state
//! - **Bounded**: the flattened program never exceeds its capacity
//! - **Mechanism over policy**: Core provides editing primitives, hosts decide
//!   rendering, storage and clipboard access
//!
//! ## Design
//!
//! The core provides:
//! - LineStore: arena-linked lines with cursor, mark and size accounting
//! - EditorCore: the session context; `update` is the only content mutator
//! - Codec: the seam to the assembler, with a reference `RobotCodec`
//! - Macro engine: typed template expansion with recursion guards
//! - Search/replace with a terminating replace-all
//! - EditorSnapshot: Deterministic state for replay testing

pub mod codec;
pub mod color;
pub mod command;
pub mod config;
pub mod core;
pub mod error;
pub mod line;
pub mod macros;
pub mod search;
pub mod selection;
pub mod snapshot;
pub mod store;
pub mod sync;

pub use codec::{ArgKind, Codec, CompileError, Compiled, DecodeError, Decoded, RobotCodec};
pub use command::EditCommand;
pub use config::EditorConfig;
pub use core::{CoreOutcome, EditorCore};
pub use error::{EditError, EditResult};
pub use line::{Disposition, Line, Validity, MAX_COMMENT_TEXT, MAX_LINE_TEXT};
pub use macros::{
    parse_invocation, Invocation, MacroArg, MacroLibrary, MacroTemplate, MacroVariable,
    ParamGroup, ParamKind, ParamValue,
};
pub use search::{FindOptions, Match, ReplaceSummary};
pub use selection::{ExportFormat, ExportRegion, Mark};
pub use snapshot::EditorSnapshot;
pub use store::{LineId, LineStore, MoveFocus, Relation, DEFAULT_MAX_SIZE, PROGRAM_FRAMING};
pub use sync::{InvalidLine, UpdateOutcome};
