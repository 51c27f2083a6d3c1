//! EditorCore session context
//!
//! Everything one editing session needs lives here and is passed around
//! explicitly: the line store, the codec, the macro library, the config,
//! the macro guard counters and the last search.

use tracing::{debug, warn};

use crate::{
    codec::{Codec, DecodeError, RobotCodec},
    command::EditCommand,
    config::EditorConfig,
    error::{EditError, EditResult},
    line::{truncate_text, Line, Validity, MAX_LINE_TEXT},
    macros::MacroLibrary,
    search::{FindOptions, Match},
    snapshot::EditorSnapshot,
    store::{LineId, LineStore, MoveFocus, Relation, PROGRAM_PROLOGUE},
    sync::UpdateOutcome,
};

/// Outcome from applying a command to the editor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreOutcome {
    /// Nothing changed
    Continue,
    /// Lines, cursor or mark changed
    Changed,
    /// Display a status message
    StatusMessage(String),
    /// Block text for the host to place on its clipboard
    Copied(Vec<String>),
    Found(Match),
    NotFound,
}

#[derive(Debug, Clone)]
struct LastSearch {
    pattern: String,
    options: FindOptions,
}

/// Editor core state machine
pub struct EditorCore {
    pub(crate) store: LineStore,
    pub(crate) codec: Box<dyn Codec>,
    pub(crate) macros: MacroLibrary,
    pub(crate) config: EditorConfig,
    pub(crate) recurse_level: usize,
    pub(crate) repeat_level: usize,
    last_search: Option<LastSearch>,
}

impl EditorCore {
    /// Create an editor holding one blank line
    pub fn new() -> Self {
        Self::with_config(EditorConfig::default())
    }

    pub fn with_config(config: EditorConfig) -> Self {
        Self::with_codec(Box::new(RobotCodec::new()), config)
    }

    pub fn with_codec(codec: Box<dyn Codec>, config: EditorConfig) -> Self {
        let mut core = Self {
            store: LineStore::new(config.max_size),
            codec,
            macros: MacroLibrary::new(),
            config,
            recurse_level: 0,
            repeat_level: 0,
            last_search: None,
        };
        core.seed_blank_line();
        core
    }

    fn seed_blank_line(&mut self) {
        match self.store.insert_blank(LineId::HEAD, Relation::After) {
            Ok(id) => self.store.set_cursor(id, 1),
            Err(err) => warn!(error = %err, "no room for an initial line"),
        }
        self.store.set_cursor_column(0);
    }

    /// Replace the contents with a decoded program buffer
    ///
    /// Decoding starts after the `0xFF` prologue and stops at the end
    /// marker. Returns the number of lines loaded.
    pub fn open(&mut self, program: &[u8]) -> usize {
        self.store = LineStore::new(self.config.max_size);
        self.begin_command();
        self.last_search = None;

        let body = match program.split_first() {
            Some((&PROGRAM_PROLOGUE, rest)) => rest,
            _ => program,
        };

        let mut pos = 0;
        while pos < body.len() {
            match self.codec.decode(&body[pos..]) {
                Ok(decoded) => {
                    let end = pos + decoded.consumed;
                    let line =
                        Line::decoded(decoded.display, body[pos..end].to_vec(), decoded.arg_types);
                    if let Err(err) = self.store.append(line) {
                        warn!(error = %err, "stopped loading program");
                        break;
                    }
                    pos = end;
                }
                Err(DecodeError::EndOfProgram) => break,
                Err(DecodeError::Malformed) => {
                    warn!(offset = pos + 1, "malformed record, rest of program dropped");
                    break;
                }
            }
        }

        match self.store.first() {
            Some(first) => {
                self.store.set_cursor(first, 1);
                self.store.set_cursor_column(0);
            }
            None => self.seed_blank_line(),
        }

        debug!(
            lines = self.store.line_count(),
            size = self.store.program_size(),
            "opened program"
        );
        self.store.line_count()
    }

    /// Disassemble program records into display lines
    ///
    /// `body` starts after the prologue. Stops at the end marker or the end
    /// of the buffer; any malformed record fails the whole decode.
    pub fn decode_records(&self, body: &[u8]) -> Result<Vec<String>, DecodeError> {
        let mut lines = Vec::new();
        let mut pos = 0;
        while pos < body.len() {
            match self.codec.decode(&body[pos..]) {
                Ok(decoded) => {
                    lines.push(decoded.display);
                    pos += decoded.consumed;
                }
                Err(DecodeError::EndOfProgram) => break,
                Err(err) => return Err(err),
            }
        }
        Ok(lines)
    }

    /// Reset the macro guards; call at the start of every top-level edit
    pub fn begin_command(&mut self) {
        self.recurse_level = 0;
        self.repeat_level = 0;
    }

    pub fn store(&self) -> &LineStore {
        &self.store
    }

    /// Structural access: cursor, marks, deletes and blank inserts
    pub fn store_mut(&mut self) -> &mut LineStore {
        &mut self.store
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn macros(&self) -> &MacroLibrary {
        &self.macros
    }

    pub fn set_macros(&mut self, macros: MacroLibrary) {
        self.macros = macros;
    }

    pub fn current_line(&self) -> Option<&Line> {
        self.store.get(self.store.cursor())
    }

    /// Serialise the program: prologue, lines, epilogue
    pub fn flatten(&self) -> Vec<u8> {
        self.store.flatten()
    }

    /// Insert `text` as a new line next to `anchor`
    ///
    /// On any failure the new line is taken back out and nothing else
    /// changes.
    pub fn insert(&mut self, anchor: LineId, text: &str, relation: Relation) -> EditResult<LineId> {
        let anchor_number = self
            .store
            .line_number(anchor)
            .ok_or(EditError::LineNotFound)?;
        self.insert_line(anchor, anchor_number, text, relation)
            .map(|(id, _)| id)
    }

    /// `insert` next to line number `anchor_number`
    pub(crate) fn insert_line(
        &mut self,
        anchor: LineId,
        anchor_number: usize,
        text: &str,
        relation: Relation,
    ) -> EditResult<(LineId, UpdateOutcome)> {
        let id = self.store.allocate(Line::empty())?;
        let position = match self.store.link_numbered(anchor, anchor_number, relation, id) {
            Ok(position) => position,
            Err(err) => {
                self.store.release(id);
                return Err(err);
            }
        };

        match self.update(id, text) {
            Ok(outcome) => Ok((id, outcome)),
            Err(err) => {
                self.store.unlink_numbered(id, position);
                Err(err)
            }
        }
    }

    /// Insert above the cursor line; the cursor stays on its line
    pub fn insert_at_cursor(&mut self, text: &str) -> EditResult<LineId> {
        let cursor = self.store.cursor();
        self.insert(cursor, text, Relation::Before)
    }

    pub fn delete(&mut self, id: LineId, focus: MoveFocus) -> bool {
        self.store.delete(id, focus)
    }

    /// Numbered macro: expand the template named after the slot if there
    /// is one, otherwise type `fallback` into the cursor line
    pub fn quick_macro(&mut self, slot: usize, fallback: &str) -> EditResult<UpdateOutcome> {
        let name = slot.to_string();
        if self.macros.get(&name).is_some() {
            return self.run_macro(&name);
        }

        let cursor = self.store.cursor();
        let mut text = self
            .current_line()
            .map(|line| line.text().to_string())
            .ok_or(EditError::LineNotFound)?;
        let mut column = self.store.cursor_column().min(text.len());
        while !text.is_char_boundary(column) {
            column -= 1;
        }
        text.insert_str(column, fallback);
        truncate_text(&mut text, MAX_LINE_TEXT);

        let outcome = self.update(cursor, &text)?;
        self.store.set_cursor_column(column + fallback.len());
        Ok(outcome)
    }

    /// Apply a command and return the outcome
    pub fn apply(&mut self, command: EditCommand) -> CoreOutcome {
        self.begin_command();
        let cursor = self.store.cursor();

        match command {
            EditCommand::InsertBefore(text) => {
                edit_outcome(self.insert(cursor, &text, Relation::Before).map(|_| ()))
            }
            EditCommand::InsertAfter(text) => {
                let result = self.insert(cursor, &text, Relation::After).map(|id| {
                    let line = self.store.cursor_line() + 1;
                    self.store.set_cursor(id, line);
                });
                edit_outcome(result)
            }
            EditCommand::SetLine(text) => edit_outcome(self.update(cursor, &text).map(|_| ())),
            EditCommand::DeleteLine => {
                if self.delete(cursor, MoveFocus::Next) {
                    CoreOutcome::Changed
                } else {
                    CoreOutcome::Continue
                }
            }
            EditCommand::MoveCursor(count) => {
                self.store.move_cursor(count);
                CoreOutcome::Changed
            }
            EditCommand::GotoLine(line) => {
                self.store.goto_line(line);
                CoreOutcome::Changed
            }
            EditCommand::SetColumn(column) => {
                self.store.set_cursor_column(column);
                CoreOutcome::Changed
            }
            EditCommand::MarkBegin => {
                self.store.mark_begin();
                CoreOutcome::Changed
            }
            EditCommand::MarkEnd => {
                self.store.mark_end();
                CoreOutcome::Changed
            }
            EditCommand::Unmark => {
                self.store.unmark();
                CoreOutcome::Changed
            }
            EditCommand::CopyBlock => CoreOutcome::Copied(self.store.copy_block()),
            EditCommand::CutBlock => CoreOutcome::Copied(self.store.cut_block()),
            EditCommand::ClearBlock => {
                self.store.clear_block();
                CoreOutcome::Changed
            }
            EditCommand::Find { pattern, options } => {
                let options = options.unwrap_or_else(|| FindOptions::from(&self.config));
                let outcome = self.find_and_move(&pattern, options);
                self.last_search = Some(LastSearch { pattern, options });
                outcome
            }
            EditCommand::FindNext => match self.last_search.clone() {
                Some(last) => self.find_and_move(&last.pattern, last.options),
                None => CoreOutcome::NotFound,
            },
            EditCommand::Replace {
                pattern,
                replacement,
            } => {
                let options = FindOptions::from(&self.config);
                match self.replace_one(&pattern, &replacement, options) {
                    Ok(Some(found)) => CoreOutcome::Found(found),
                    Ok(None) => CoreOutcome::NotFound,
                    Err(err) => CoreOutcome::StatusMessage(err.to_string()),
                }
            }
            EditCommand::ReplaceAll {
                pattern,
                replacement,
            } => {
                let options = FindOptions::from(&self.config);
                let summary = self.replace_all(&pattern, &replacement, options);
                match summary.refused {
                    Some(err) => CoreOutcome::StatusMessage(format!(
                        "Replaced {} occurrence(s), then stopped: {}",
                        summary.replaced, err
                    )),
                    None => CoreOutcome::StatusMessage(format!(
                        "Replaced {} occurrence(s)",
                        summary.replaced
                    )),
                }
            }
            EditCommand::Validate(disposition) => {
                let remaining = self.validate_all(|entry| {
                    (entry.validity == Validity::InvalidUncertain).then_some(disposition)
                });
                CoreOutcome::StatusMessage(format!("{} unresolved line(s)", remaining))
            }
            EditCommand::RunMacro(invocation) => {
                edit_outcome(self.run_macro(&invocation).map(|_| ()))
            }
            EditCommand::QuickMacro { slot, fallback } => {
                edit_outcome(self.quick_macro(slot, &fallback).map(|_| ()))
            }
        }
    }

    fn find_and_move(&mut self, pattern: &str, options: FindOptions) -> CoreOutcome {
        match self.find(pattern, options) {
            Some(found) => {
                self.store.goto_line(found.line_number);
                self.store.set_cursor_column(found.column);
                CoreOutcome::Found(found)
            }
            None => CoreOutcome::NotFound,
        }
    }

    /// Get a complete snapshot of editor state (for determinism testing)
    pub fn snapshot(&self) -> EditorSnapshot {
        EditorSnapshot {
            lines: self
                .store
                .iter()
                .map(|(_, line)| line.text().to_string())
                .collect(),
            validities: self.store.iter().map(|(_, line)| line.validity()).collect(),
            cursor_line: self.store.cursor_line(),
            cursor_column: self.store.cursor_column(),
            total_size: self.store.total_size(),
            mark: self
                .store
                .mark()
                .map(|mark| (mark.start_line, mark.end_line)),
        }
    }
}

fn edit_outcome(result: EditResult<()>) -> CoreOutcome {
    match result {
        Ok(()) => CoreOutcome::Changed,
        Err(err) => CoreOutcome::StatusMessage(err.to_string()),
    }
}

impl Default for EditorCore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_comment;
    use crate::line::Disposition;
    use crate::macros::{MacroTemplate, MacroVariable, ParamGroup, ParamKind, ParamValue};
    use tracing_test::traced_test;

    fn texts(core: &EditorCore) -> Vec<String> {
        core.snapshot().lines
    }

    fn template(name: &str, lines: &[&str]) -> MacroTemplate {
        MacroTemplate {
            name: name.into(),
            label: String::new(),
            groups: vec![ParamGroup {
                kind: ParamKind::Number { min: 0, max: 255 },
                variables: vec![MacroVariable {
                    name: "n".into(),
                    default: ParamValue::Number(1),
                }],
            }],
            lines: lines.iter().map(|l| l.to_string()).collect(),
        }
    }

    fn with_macros(templates: Vec<MacroTemplate>) -> EditorCore {
        let mut core = EditorCore::new();
        core.set_macros(templates.into_iter().collect());
        core
    }

    #[test]
    fn test_new_editor_has_one_blank_line() {
        let core = EditorCore::new();
        assert_eq!(core.store().line_count(), 1);
        assert_eq!(core.store().cursor_line(), 1);
        assert_eq!(core.store().total_size(), 3);
        assert!(core.current_line().unwrap().is_blank());
    }

    #[test]
    fn test_insert_at_cursor_keeps_cursor_line() {
        let mut core = EditorCore::new();
        let cursor = core.store().cursor();
        core.insert_at_cursor("end").unwrap();
        assert_eq!(texts(&core), vec!["END", ""]);
        assert_eq!(core.store().cursor(), cursor);
        assert_eq!(core.store().cursor_line(), 2);
        assert_eq!(core.store().total_size(), 6);
    }

    #[test]
    fn test_insert_then_delete_restores_state() {
        let mut core = EditorCore::new();
        core.update(core.store().cursor(), "wait 3").unwrap();
        let before = core.snapshot();

        let id = core.insert_at_cursor("set x 5").unwrap();
        assert!(core.delete(id, MoveFocus::Next));
        assert_eq!(core.snapshot(), before);
    }

    #[test]
    fn test_insert_after_blank_then_delete_blank() {
        let mut core = EditorCore::new();
        let blank = core.store().cursor();

        core.insert(blank, "SET X 1", Relation::After).unwrap();
        assert!(core.delete(blank, MoveFocus::Next));

        assert_eq!(core.store().line_count(), 1);
        let (_, line) = core.store().iter().next().unwrap();
        assert_eq!(line.validity(), Validity::Valid);
        assert_eq!(line.text(), "SET X 1");
        assert_eq!(core.store().total_size(), 9);
        assert_eq!(core.store().cursor_line(), 1);
    }

    #[test]
    fn test_insert_refused_leaves_store_untouched() {
        let config = EditorConfig {
            max_size: 12,
            ..EditorConfig::default()
        };
        let mut core = EditorCore::with_config(config);
        let before = core.snapshot();

        let result = core.insert_at_cursor("set counter 1");
        assert!(matches!(result, Err(EditError::CapacityExceeded { .. })));
        assert_eq!(core.snapshot(), before);
        assert_eq!(core.store().line_count(), 1);
    }

    #[test]
    fn test_open_decodes_program() {
        let mut source = EditorCore::new();
        let first = source.store().cursor();
        source.update(first, "wait 5").unwrap();
        source.insert(first, "end", Relation::After).unwrap();
        let program = source.flatten();

        let mut core = EditorCore::new();
        assert_eq!(core.open(&program), 2);
        assert_eq!(texts(&core), vec!["WAIT 5", "END"]);
        assert_eq!(core.store().program_size(), program.len());
        assert_eq!(core.store().cursor_line(), 1);
        assert_eq!(core.flatten(), program);
    }

    #[test]
    fn test_decode_records_is_strict() {
        let core = EditorCore::new();
        assert_eq!(
            core.decode_records(&[1, 0, 1, 1, 1, 1, 0]).unwrap(),
            vec!["END", "DIE"]
        );
        assert_eq!(
            core.decode_records(&[1, 0, 1, 4, 2]),
            Err(DecodeError::Malformed)
        );
        assert!(core.decode_records(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_open_empty_program_gives_blank_line() {
        let mut core = EditorCore::new();
        assert_eq!(core.open(&[0xFF, 0x00]), 1);
        assert!(core.current_line().unwrap().is_blank());
    }

    #[test]
    fn test_comment_line_round_trips() {
        let config = EditorConfig {
            default_invalid: Disposition::Comment,
            ..EditorConfig::default()
        };
        let mut core = EditorCore::with_config(config.clone());
        core.update(core.store().cursor(), "not a command").unwrap();
        let cursor = core.store().cursor();
        core.insert(cursor, "end", Relation::After).unwrap();
        let program = core.flatten();

        let mut expected = vec![0xFF];
        expected.extend(encode_comment("not a command"));
        expected.extend([1, 0, 1]);
        expected.push(0x00);
        assert_eq!(program, expected);

        let mut reopened = EditorCore::with_config(config);
        reopened.open(&program);
        assert_eq!(texts(&reopened), vec![". \"not a command\"", "END"]);
        assert!(reopened.current_line().unwrap().validity().is_valid());
        assert_eq!(reopened.flatten(), program);
    }

    #[test]
    fn test_macro_expands_in_place() {
        let mut core = with_macros(vec![template("walk", &["wait !n!", "cycle !n!"])]);
        let id = core.store().cursor();
        let outcome = core.update(id, "#walk(7)").unwrap();
        assert_eq!(outcome, UpdateOutcome::Expanded { lines: 2 });
        assert_eq!(texts(&core), vec!["WAIT 7", "CYCLE 7"]);
        assert_eq!(core.store().cursor_line(), 1);
    }

    #[test]
    fn test_unknown_macro_leaves_line() {
        let mut core = EditorCore::new();
        let id = core.store().cursor();
        let err = core.update(id, "#nothing").unwrap_err();
        assert_eq!(err, EditError::UnknownMacro("nothing".into()));
        assert!(core.current_line().unwrap().is_blank());
    }

    #[test]
    fn test_zero_line_macro_leaves_blank_line() {
        let mut core = with_macros(vec![template("nop", &[])]);
        let id = core.store().cursor();
        core.update(id, "end").unwrap();
        core.update(id, "#nop").unwrap();
        assert_eq!(texts(&core), vec![""]);
    }

    #[test]
    fn test_nested_macro_expands() {
        let mut core = with_macros(vec![
            template("outer", &["#inner(!n!)", "end"]),
            template("inner", &["wait !n!", "die"]),
        ]);
        let id = core.store().cursor();
        core.update(id, "#outer(4)").unwrap();
        assert_eq!(texts(&core), vec!["WAIT 4", "DIE", "END"]);
    }

    #[test]
    fn test_nested_expansion_renumbers_cursor_and_mark() {
        let mut core = with_macros(vec![
            template("outer", &["#inner(!n!)", "end"]),
            template("inner", &["wait !n!", "die"]),
        ]);
        let first = core.store().cursor();
        core.update(first, "end").unwrap();
        let second = core.insert(first, "die", Relation::After).unwrap();
        core.store_mut().goto_line(2);
        core.store_mut().mark_begin();

        core.begin_command();
        core.update(first, "#outer(4)").unwrap();
        assert_eq!(texts(&core), vec!["WAIT 4", "DIE", "END", "DIE"]);

        let position = core
            .store()
            .iter()
            .position(|(id, _)| id == second)
            .map(|pos| pos + 1);
        assert_eq!(position, Some(4));
        assert_eq!(core.store().cursor(), second);
        assert_eq!(core.store().cursor_line(), 4);
        let mark = core.store().mark().unwrap();
        assert_eq!((mark.start_line, mark.end_line), (4, 4));
    }

    #[test]
    fn test_self_recursive_macro_terminates() {
        let mut core = with_macros(vec![template("loop", &["die", "#loop"])]);
        core.begin_command();
        let id = core.store().cursor();
        core.update(id, "#loop").unwrap();

        let lines = texts(&core);
        // One DIE per level, then the guard leaves an empty line
        assert_eq!(lines.len(), EditorConfig::DEFAULT_MACRO_RECURSION + 1);
        assert!(lines[..EditorConfig::DEFAULT_MACRO_RECURSION]
            .iter()
            .all(|l| l == "DIE"));
        assert_eq!(lines.last().unwrap(), "");
        assert_eq!(core.recurse_level, 0);
    }

    #[test]
    #[traced_test]
    fn test_guard_trip_is_logged() {
        let mut core = with_macros(vec![template("loop", &["#loop"])]);
        let id = core.store().cursor();
        core.update(id, "#loop").unwrap();
        assert!(logs_contain("macro guard tripped"));
    }

    #[test]
    fn test_repeat_guard_limits_expansions() {
        let config = EditorConfig {
            max_macro_repeat: 3,
            ..EditorConfig::default()
        };
        let mut core = EditorCore::with_config(config);
        core.set_macros(
            vec![
                template("two", &["#one", "#one"]),
                template("one", &["die"]),
            ]
            .into_iter()
            .collect(),
        );
        let id = core.store().cursor();
        core.update(id, "#two").unwrap();
        // two + one + one = 3 expansions; nothing was suppressed
        assert_eq!(texts(&core), vec!["DIE", "DIE"]);

        // Without a reset the counter is spent
        let outcome = core.update(id, "#one").unwrap();
        assert_eq!(outcome, UpdateOutcome::Suppressed);
        assert_eq!(texts(&core), vec!["", "DIE"]);

        core.begin_command();
        core.update(id, "#one").unwrap();
        assert_eq!(texts(&core), vec!["DIE", "DIE"]);
    }

    #[test]
    fn test_macro_rollback_on_capacity() {
        let config = EditorConfig {
            max_size: 12,
            ..EditorConfig::default()
        };
        let mut core = EditorCore::with_config(config);
        core.set_macros(vec![template("big", &["end", "end", "set counter 1"])].into_iter().collect());
        let before = core.snapshot();

        let id = core.store().cursor();
        let result = core.update(id, "#big");
        assert!(matches!(result, Err(EditError::CapacityExceeded { .. })));
        assert_eq!(core.snapshot(), before);
    }

    #[test]
    fn test_run_macro_inserts_above_cursor() {
        let mut core = with_macros(vec![template("walk", &["wait !n!", "cycle !n!"])]);
        core.update(core.store().cursor(), "end").unwrap();
        let outcome = core.apply(EditCommand::RunMacro("walk(2)".into()));
        assert_eq!(outcome, CoreOutcome::Changed);
        assert_eq!(texts(&core), vec!["WAIT 2", "CYCLE 2", "END"]);
        assert_eq!(core.store().cursor_line(), 3);
    }

    #[test]
    fn test_quick_macro_fallback_types_text() {
        let mut core = EditorCore::new();
        core.update(core.store().cursor(), "wait").unwrap();
        core.store_mut().set_cursor_column(4);
        core.quick_macro(1, " 9").unwrap();
        assert_eq!(texts(&core), vec!["WAIT 9"]);
        assert_eq!(core.store().cursor_column(), 6);
    }

    #[test]
    fn test_quick_macro_uses_numbered_template() {
        let mut core = with_macros(vec![template("1", &["die"])]);
        core.quick_macro(1, "ignored").unwrap();
        assert_eq!(texts(&core), vec!["DIE", ""]);
    }

    #[test]
    fn test_apply_find_and_find_next() {
        let mut core = EditorCore::new();
        core.update(core.store().cursor(), ": a").unwrap();
        core.apply(EditCommand::InsertAfter(": b".into()));
        core.apply(EditCommand::InsertAfter(": a".into()));
        core.apply(EditCommand::GotoLine(1));

        let outcome = core.apply(EditCommand::Find {
            pattern: "a".into(),
            options: Some(FindOptions {
                wrap: false,
                case_sensitive: true,
            }),
        });
        assert!(matches!(outcome, CoreOutcome::Found(m) if m.line_number == 1));
        let outcome = core.apply(EditCommand::FindNext);
        assert!(matches!(outcome, CoreOutcome::Found(m) if m.line_number == 3));
        assert_eq!(core.apply(EditCommand::FindNext), CoreOutcome::NotFound);
    }

    #[test]
    fn test_apply_insert_after_moves_cursor() {
        let mut core = EditorCore::new();
        core.apply(EditCommand::SetLine("end".into()));
        core.apply(EditCommand::InsertAfter("die".into()));
        assert_eq!(texts(&core), vec!["END", "DIE"]);
        assert_eq!(core.store().cursor_line(), 2);
        assert_eq!(core.current_line().unwrap().text(), "DIE");
    }

    #[test]
    fn test_apply_validate() {
        let mut core = EditorCore::new();
        core.apply(EditCommand::SetLine("bogus".into()));
        let outcome = core.apply(EditCommand::Validate(Disposition::Delete));
        assert_eq!(outcome, CoreOutcome::StatusMessage("0 unresolved line(s)".into()));
        assert_eq!(core.flatten(), vec![0xFF, 0x00]);
    }
}
