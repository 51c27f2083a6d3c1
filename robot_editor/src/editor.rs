//! Main editor implementation

use std::path::{Path, PathBuf};

use robot_core::{
    CoreOutcome, EditCommand, EditError, EditorCore, ExportFormat, ExportRegion, Validity,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::clipboard::{join_lines, split_lines, ClipboardBridge};
use crate::commands::{Command, CommandError, CommandParser};
use crate::ids::SessionId;
use crate::io::{self, ImportData, IoError, ProgramStorage};
use crate::settings::{serialize_settings, EditorSettings, SettingsError};

/// Editor error
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Edit refused: {0}")]
    Edit(#[from] EditError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("{0} line(s) still need a decision (use :q! to force)")]
    UnresolvedLines(usize),
}

/// Editor result
pub type EditorResult<T> = Result<T, EditorError>;

/// Summary of a close
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseOutcome {
    /// Bytes handed to storage
    pub program_size: usize,
    /// Lines left out because they did not compile
    pub dropped_lines: usize,
}

/// Summary of a paste or import
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InsertSummary {
    pub inserted: usize,
    /// Set when the program filled up before every line went in
    pub refused: Option<EditError>,
}

/// Editor action result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorAction {
    /// Continue editing
    Continue,
    /// Program was stored; carries its size
    Saved(usize),
    /// Session closed
    Closed(CloseOutcome),
}

/// One robot program editing session
pub struct Editor {
    id: SessionId,
    core: EditorCore,
    storage: Box<dyn ProgramStorage>,
    clipboard: Box<dyn ClipboardBridge>,
    settings: EditorSettings,
    /// Used when the clipboard is unavailable
    copy_buffer: Vec<String>,
    status: String,
}

impl Editor {
    /// Open a session on the program held by `storage`
    pub fn open(
        storage: Box<dyn ProgramStorage>,
        clipboard: Box<dyn ClipboardBridge>,
        settings: EditorSettings,
    ) -> EditorResult<Self> {
        let program = storage.load()?;

        let mut core = EditorCore::with_config(settings.config.clone());
        core.set_macros(settings.macro_library());
        if !program.is_empty() {
            core.open(&program);
        }

        let id = SessionId::new();
        info!(
            session = %id,
            lines = core.store().line_count(),
            size = core.store().program_size(),
            "session opened"
        );

        Ok(Self {
            id,
            core,
            storage,
            clipboard,
            settings,
            copy_buffer: Vec::new(),
            status: String::new(),
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn core(&self) -> &EditorCore {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut EditorCore {
        &mut self.core
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    /// Mutable settings; macro templates take effect on the next open
    pub fn settings_mut(&mut self) -> &mut EditorSettings {
        &mut self.settings
    }

    /// Serialized settings for the host to persist
    pub fn save_settings(&self) -> EditorResult<Vec<u8>> {
        Ok(serialize_settings(&self.settings)?)
    }

    pub fn status_message(&self) -> &str {
        &self.status
    }

    /// Current program text, one entry per line
    pub fn lines(&self) -> Vec<String> {
        self.core
            .store()
            .iter()
            .map(|(_, line)| line.text().to_string())
            .collect()
    }

    /// Parse and run one ex command
    pub fn execute(&mut self, cmd: &str) -> EditorResult<EditorAction> {
        match CommandParser::parse(cmd)? {
            Command::Write => self.write().map(EditorAction::Saved),
            Command::Quit | Command::WriteQuit => self.close(false).map(EditorAction::Closed),
            Command::ForceQuit => self.close(true).map(EditorAction::Closed),
            Command::Goto(line) => self.apply(EditCommand::GotoLine(line)),
            Command::Find(pattern) => self.apply(EditCommand::Find {
                pattern,
                options: None,
            }),
            Command::Replace {
                pattern,
                replacement,
            } => self.apply(EditCommand::Replace {
                pattern,
                replacement,
            }),
            Command::ReplaceAll {
                pattern,
                replacement,
            } => self.apply(EditCommand::ReplaceAll {
                pattern,
                replacement,
            }),
            Command::MarkStart => self.apply(EditCommand::MarkBegin),
            Command::MarkEnd => self.apply(EditCommand::MarkEnd),
            Command::MarkClear => self.apply(EditCommand::Unmark),
            Command::Copy => self.apply(EditCommand::CopyBlock),
            Command::Cut => self.apply(EditCommand::CutBlock),
            Command::Clear => self.apply(EditCommand::ClearBlock),
            Command::Paste => {
                let summary = self.paste();
                self.report_insert("Pasted", &summary);
                Ok(EditorAction::Continue)
            }
            Command::Validate(Some(disposition)) => self.apply(EditCommand::Validate(disposition)),
            Command::Validate(None) => {
                self.status = format!("{} unresolved line(s)", self.core.unresolved_count());
                Ok(EditorAction::Continue)
            }
            Command::Macro(invocation) => self.apply(EditCommand::RunMacro(invocation)),
            Command::Quick(slot) => {
                let fallback = self.settings.quick_macro(slot).unwrap_or_default().to_string();
                self.apply(EditCommand::QuickMacro { slot, fallback })
            }
            Command::Import(path) => {
                let summary = self.import_file(&path)?;
                self.report_insert("Imported", &summary);
                Ok(EditorAction::Continue)
            }
            Command::Export {
                path,
                region,
                format,
            } => {
                let written = self.export_file(&path, region, format)?;
                self.status = format!("Exported to {}", written.display());
                Ok(EditorAction::Continue)
            }
        }
    }

    fn apply(&mut self, command: EditCommand) -> EditorResult<EditorAction> {
        match self.core.apply(command) {
            CoreOutcome::Continue | CoreOutcome::Changed => {}
            CoreOutcome::StatusMessage(message) => self.status = message,
            CoreOutcome::Copied(lines) => {
                self.status = format!("Copied {} line(s)", lines.len());
                self.copy(lines);
            }
            CoreOutcome::Found(found) => {
                self.status = format!("Found at line {}", found.line_number);
            }
            CoreOutcome::NotFound => self.status = "Not found".to_string(),
        }
        Ok(EditorAction::Continue)
    }

    fn copy(&mut self, lines: Vec<String>) {
        if !self.clipboard.write_text(&join_lines(&lines)) {
            debug!(session = %self.id, "clipboard unavailable, keeping copy locally");
            self.copy_buffer = lines;
        }
    }

    /// Insert the clipboard (or the local copy buffer) above the cursor
    pub fn paste(&mut self) -> InsertSummary {
        let lines = match self.clipboard.read_text() {
            Some(text) => split_lines(&text),
            None => self.copy_buffer.clone(),
        };
        self.insert_lines(&lines)
    }

    /// Insert a text or `.bc` file above the cursor
    ///
    /// A bytecode file that does not decode inserts nothing.
    pub fn import_file(&mut self, path: &Path) -> EditorResult<InsertSummary> {
        let lines = match io::read_import(path) {
            Ok(ImportData::Text(lines)) => lines,
            Ok(ImportData::Bytecode(body)) => self.core.decode_records(&body).map_err(|err| {
                warn!(session = %self.id, path = %path.display(), "bytecode import rejected");
                IoError::MalformedImport(format!("{}: {}", path.display(), err))
            })?,
            Err(err) => {
                warn!(session = %self.id, error = %err, "import failed");
                return Err(err.into());
            }
        };
        Ok(self.insert_lines(&lines))
    }

    /// Write the program or the block to a file; returns the path written
    pub fn export_file(
        &self,
        path: &Path,
        region: ExportRegion,
        format: ExportFormat,
    ) -> EditorResult<PathBuf> {
        let data = self.core.store().export_block(format, region);
        let written = io::write_export(path, format, &data)?;
        debug!(session = %self.id, path = %written.display(), bytes = data.len(), "exported");
        Ok(written)
    }

    fn insert_lines(&mut self, lines: &[String]) -> InsertSummary {
        let mut summary = InsertSummary::default();
        for text in lines {
            self.core.begin_command();
            match self.core.insert_at_cursor(text) {
                Ok(_) => summary.inserted += 1,
                Err(err @ (EditError::CapacityExceeded { .. } | EditError::OutOfMemory)) => {
                    warn!(session = %self.id, error = %err, "insert stopped");
                    summary.refused = Some(err);
                    break;
                }
                Err(err) => warn!(session = %self.id, error = %err, "line skipped"),
            }
        }
        summary
    }

    fn report_insert(&mut self, verb: &str, summary: &InsertSummary) {
        self.status = match &summary.refused {
            Some(err) => format!("{} {} line(s), then stopped: {}", verb, summary.inserted, err),
            None => format!("{} {} line(s)", verb, summary.inserted),
        };
    }

    /// Store the flattened program without closing
    pub fn write(&mut self) -> EditorResult<usize> {
        let program = self.core.flatten();
        self.storage.store(&program)?;
        self.status = format!("Wrote {} bytes", program.len());
        Ok(program.len())
    }

    /// Store the program and end the session
    ///
    /// Refused while lines are unresolved unless `force` is set; those lines
    /// are then dropped from the stored program.
    pub fn close(&mut self, force: bool) -> EditorResult<CloseOutcome> {
        let unresolved = self.core.unresolved_count();
        if unresolved > 0 && !force {
            self.status = format!("{} unresolved line(s)", unresolved);
            return Err(EditorError::UnresolvedLines(unresolved));
        }

        let dropped_lines = self
            .core
            .invalid_lines()
            .iter()
            .filter(|entry| entry.validity != Validity::InvalidComment)
            .count();
        let program = self.core.flatten();
        self.storage.store(&program)?;

        info!(
            session = %self.id,
            size = program.len(),
            dropped = dropped_lines,
            "session closed"
        );
        Ok(CloseOutcome {
            program_size: program.len(),
            dropped_lines,
        })
    }
}
