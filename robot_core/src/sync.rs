//! Text/bytecode synchronisation
//!
//! `update` is the only way line content changes. It compiles the text,
//! decides the line's validity and keeps the store's running size in step
//! with the line's new bytecode length.

use tracing::{debug, warn};

use crate::codec::COMMENT_OVERHEAD;
use crate::core::EditorCore;
use crate::error::{EditError, EditResult};
use crate::line::{truncate_text, Disposition, Line, Validity, MAX_COMMENT_TEXT, MAX_LINE_TEXT};
use crate::store::LineId;

/// What `update` did with a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Compiled; the line now holds the canonical text
    Compiled,
    /// Did not compile and was classified
    Invalid(Validity),
    /// A macro expanded into this many lines, starting with this one
    Expanded { lines: usize },
    /// A macro guard tripped and the line was left empty
    Suppressed,
}

/// A line that did not compile, as offered for review
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidLine {
    pub id: LineId,
    pub line_number: usize,
    pub text: String,
    pub validity: Validity,
    pub error: String,
}

impl EditorCore {
    /// Replace the content of line `id` with `text`
    ///
    /// Errors leave the line and the store untouched.
    pub fn update(&mut self, id: LineId, text: &str) -> EditResult<UpdateOutcome> {
        let (old_len, prior) = {
            let line = self.store.get(id).ok_or(EditError::LineNotFound)?;
            (line.bytecode_length, line.validity)
        };

        if text.starts_with('#') {
            return self.expand_line(id, text);
        }

        let compiled = match self.codec.compile(text) {
            Ok(compiled) => compiled,
            Err(err) => {
                debug!(error = %err, "line did not compile");
                let use_type = match prior {
                    Validity::Valid => self.config.default_invalid.validity(),
                    other => other,
                };
                return Ok(UpdateOutcome::Invalid(self.store_invalid(id, text, use_type, old_len)));
            }
        };

        if compiled.display.len() > MAX_LINE_TEXT {
            let use_type = match prior {
                Validity::InvalidUncertain | Validity::InvalidDiscard => prior,
                _ => self.config.default_invalid.validity(),
            };
            return Ok(UpdateOutcome::Invalid(self.store_invalid(
                id,
                &compiled.display,
                use_type,
                old_len,
            )));
        }

        if let Err(err) = self.store.check_capacity(old_len, compiled.bytecode.len()) {
            warn!(error = %err, "edit refused");
            return Err(err);
        }

        let new_len = compiled.bytecode.len();
        if let Some(line) = self.store.get_mut(id) {
            line.text = compiled.display;
            line.bytecode = compiled.bytecode;
            line.bytecode_length = new_len;
            line.arg_types = compiled.arg_types;
            line.validity = Validity::Valid;
        }
        self.store.adjust_size(old_len, new_len);
        Ok(UpdateOutcome::Compiled)
    }

    /// Store `text` as a line that did not compile
    ///
    /// A comment that does not fit falls back to `InvalidUncertain`.
    fn store_invalid(
        &mut self,
        id: LineId,
        text: &str,
        mut use_type: Validity,
        old_len: usize,
    ) -> Validity {
        let mut text = text.to_string();
        truncate_text(&mut text, MAX_LINE_TEXT);

        if use_type == Validity::InvalidComment {
            let mut comment = text.clone();
            truncate_text(&mut comment, MAX_COMMENT_TEXT);
            if self
                .store
                .check_capacity(old_len, comment.len() + COMMENT_OVERHEAD)
                .is_ok()
            {
                text = comment;
            } else {
                warn!("no room to keep line as a comment");
                use_type = Validity::InvalidUncertain;
            }
        }

        let new_len = match use_type {
            Validity::InvalidComment => text.len() + COMMENT_OVERHEAD,
            _ => 0,
        };
        if let Some(line) = self.store.get_mut(id) {
            line.text = text;
            line.bytecode.clear();
            line.bytecode_length = new_len;
            line.arg_types.clear();
            line.validity = use_type;
        }
        self.store.adjust_size(old_len, new_len);
        use_type
    }

    /// Put a saved copy of a line back in place
    pub(crate) fn restore_line(&mut self, id: LineId, saved: Line) {
        let new_len = saved.bytecode_length;
        if let Some(line) = self.store.get_mut(id) {
            let old_len = line.bytecode_length;
            *line = saved;
            self.store.adjust_size(old_len, new_len);
        }
    }

    /// Reclassify a line that did not compile
    ///
    /// Valid lines are left alone. Turning a line into a comment is refused
    /// when the comment would not fit.
    pub fn set_validity(&mut self, id: LineId, disposition: Disposition) -> EditResult<Validity> {
        let line = self.store.get(id).ok_or(EditError::LineNotFound)?;
        if line.validity.is_valid() {
            return Ok(Validity::Valid);
        }

        let old_len = line.bytecode_length;
        let mut text = line.text.clone();
        let validity = disposition.validity();
        let new_len = match validity {
            Validity::InvalidComment => {
                truncate_text(&mut text, MAX_COMMENT_TEXT);
                let new_len = text.len() + COMMENT_OVERHEAD;
                self.store.check_capacity(old_len, new_len)?;
                new_len
            }
            _ => 0,
        };

        if let Some(line) = self.store.get_mut(id) {
            line.text = text;
            line.bytecode_length = new_len;
            line.validity = validity;
        }
        self.store.adjust_size(old_len, new_len);
        Ok(validity)
    }

    /// Every line that is not valid, in program order
    pub fn invalid_lines(&self) -> Vec<InvalidLine> {
        self.store
            .iter()
            .enumerate()
            .filter(|(_, (_, line))| !line.validity.is_valid())
            .map(|(index, (id, line))| {
                let error = match self.codec.compile(&line.text) {
                    Err(err) => err.to_string(),
                    Ok(_) => "Line too long".to_string(),
                };
                InvalidLine {
                    id,
                    line_number: index + 1,
                    text: line.text.clone(),
                    validity: line.validity,
                    error,
                }
            })
            .collect()
    }

    /// Offer each invalid line to `decide` and apply the answers
    ///
    /// Returns how many lines are still unresolved (`InvalidUncertain`).
    pub fn validate_all<F>(&mut self, mut decide: F) -> usize
    where
        F: FnMut(&InvalidLine) -> Option<Disposition>,
    {
        for entry in self.invalid_lines() {
            let Some(disposition) = decide(&entry) else {
                continue;
            };
            if disposition.validity() == entry.validity {
                continue;
            }
            if let Err(err) = self.set_validity(entry.id, disposition) {
                warn!(line = entry.line_number, error = %err, "disposition refused");
            }
        }
        self.unresolved_count()
    }

    /// Number of lines still `InvalidUncertain`
    pub fn unresolved_count(&self) -> usize {
        self.store
            .iter()
            .filter(|(_, line)| line.validity == Validity::InvalidUncertain)
            .count()
    }
}
