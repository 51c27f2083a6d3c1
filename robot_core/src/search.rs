//! Find and replace over line text

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::EditorConfig;
use crate::core::EditorCore;
use crate::error::{EditError, EditResult};
use crate::line::{truncate_text, MAX_LINE_TEXT};
use crate::store::LineId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindOptions {
    /// Continue from the top once the end is reached
    pub wrap: bool,
    pub case_sensitive: bool,
}

impl Default for FindOptions {
    fn default() -> Self {
        Self {
            wrap: true,
            case_sensitive: false,
        }
    }
}

impl From<&EditorConfig> for FindOptions {
    fn from(config: &EditorConfig) -> Self {
        Self {
            wrap: config.wrap_search,
            case_sensitive: config.case_sensitive,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub line: LineId,
    pub line_number: usize,
    /// Byte offset into the line text
    pub column: usize,
}

/// Result of a replace-all pass
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReplaceSummary {
    pub replaced: usize,
    /// Set when a replacement was refused and the pass stopped early
    pub refused: Option<EditError>,
}

fn fold(text: &str, case_sensitive: bool) -> Cow<'_, str> {
    if case_sensitive {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.to_ascii_lowercase())
    }
}

fn find_in(haystack: &str, needle: &str, mut from: usize) -> Option<usize> {
    while from < haystack.len() && !haystack.is_char_boundary(from) {
        from += 1;
    }
    haystack
        .get(from..)
        .and_then(|rest| rest.find(needle))
        .map(|pos| pos + from)
}

impl EditorCore {
    /// Next occurrence of `pattern` after the cursor
    pub fn find(&self, pattern: &str, options: FindOptions) -> Option<Match> {
        self.find_from(pattern, options, self.store.cursor_column() + 1, None)
    }

    /// Search the cursor line from byte `first_column`, then the lines
    /// after it, then (when wrapping) the lines before it
    ///
    /// With `wrap_through` set, the wrapped pass runs through that line
    /// number instead of stopping before the cursor line.
    fn find_from(
        &self,
        pattern: &str,
        options: FindOptions,
        first_column: usize,
        wrap_through: Option<usize>,
    ) -> Option<Match> {
        if pattern.is_empty() {
            return None;
        }
        let needle = fold(pattern, options.case_sensitive);
        let search = |id: LineId, from: usize| {
            self.store
                .get(id)
                .and_then(|line| find_in(&fold(line.text(), options.case_sensitive), &needle, from))
        };

        let start = self.store.cursor();
        let start_line = self.store.cursor_line();
        if let Some(column) = search(start, first_column) {
            return Some(Match {
                line: start,
                line_number: start_line,
                column,
            });
        }

        let mut current = self.store.next(start);
        let mut number = start_line + 1;
        while let Some(id) = current {
            if let Some(column) = search(id, 0) {
                return Some(Match {
                    line: id,
                    line_number: number,
                    column,
                });
            }
            current = self.store.next(id);
            number += 1;
        }

        if !options.wrap {
            return None;
        }

        let last = wrap_through.unwrap_or(start_line.saturating_sub(1));
        let mut current = self.store.first();
        let mut number = 1;
        while let Some(id) = current {
            if number > last {
                break;
            }
            if let Some(column) = search(id, 0) {
                return Some(Match {
                    line: id,
                    line_number: number,
                    column,
                });
            }
            current = self.store.next(id);
            number += 1;
        }
        None
    }

    /// Splice `replacement` over `pattern_len` bytes at the match
    fn replace_at(&mut self, found: &Match, pattern_len: usize, replacement: &str) -> EditResult<()> {
        let text = self
            .store
            .get(found.line)
            .map(|line| line.text().to_string())
            .ok_or(EditError::LineNotFound)?;

        let end = (found.column + pattern_len).min(text.len());
        let mut spliced = String::with_capacity(text.len() + replacement.len());
        spliced.push_str(&text[..found.column]);
        spliced.push_str(replacement);
        spliced.push_str(&text[end..]);
        truncate_text(&mut spliced, MAX_LINE_TEXT);

        self.update(found.line, &spliced)?;
        Ok(())
    }

    /// Find the next match, move there and replace it
    pub fn replace_one(
        &mut self,
        pattern: &str,
        replacement: &str,
        options: FindOptions,
    ) -> EditResult<Option<Match>> {
        let Some(found) = self.find(pattern, options) else {
            return Ok(None);
        };
        self.store.goto_line(found.line_number);
        self.store.set_cursor_column(found.column);
        self.replace_at(&found, pattern.len(), replacement)?;
        Ok(Some(found))
    }

    /// Replace every match, starting at the cursor and wrapping at most once
    ///
    /// The pass ends when matching regresses a second time or, once
    /// wrapped, runs past where it started. Matches on the starting line
    /// before the starting column move that column by the length change
    /// of each replacement.
    pub fn replace_all(
        &mut self,
        pattern: &str,
        replacement: &str,
        options: FindOptions,
    ) -> ReplaceSummary {
        let mut summary = ReplaceSummary::default();
        let delta = replacement.len() as isize - pattern.len() as isize;

        let start_line = self.store.cursor_line();
        let mut start_pos = self.store.cursor_column() as isize;
        let mut last_line = start_line;
        let mut last_pos = start_pos;
        let mut wrapped = false;
        let mut from = self.store.cursor_column() + 1;

        while let Some(found) = self.find_from(pattern, options, from, Some(start_line)) {
            let line = found.line_number;
            let pos = found.column as isize;

            if line == start_line && pos <= start_pos {
                start_pos += delta;
            }

            let regressed = (line == last_line && pos < last_pos) || line < last_line;
            if regressed {
                let before_start = (line == start_line && pos <= start_pos) || line < start_line;
                if before_start && !wrapped {
                    wrapped = true;
                } else {
                    break;
                }
            }

            let past_start = (line == start_line && pos > start_pos) || line > start_line;
            if wrapped && past_start {
                break;
            }

            if found.column > MAX_LINE_TEXT {
                break;
            }

            self.store.goto_line(line);
            self.store.set_cursor_column(found.column);
            if let Err(err) = self.replace_at(&found, pattern.len(), replacement) {
                warn!(line, error = %err, "replacement refused");
                summary.refused = Some(err);
                break;
            }
            summary.replaced += 1;

            let next = found.column + replacement.len();
            self.store.set_cursor_column(next);
            last_line = line;
            last_pos = next as isize;
            from = next;
        }

        debug!(replaced = summary.replaced, wrapped, "replace all finished");
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Relation;

    fn core_with(lines: &[&str]) -> EditorCore {
        let mut core = EditorCore::new();
        let first = core.store().cursor();
        core.update(first, lines[0]).unwrap();
        let mut anchor = first;
        for text in &lines[1..] {
            anchor = core.insert(anchor, text, Relation::After).unwrap();
        }
        core
    }

    fn texts(core: &EditorCore) -> Vec<String> {
        core.store()
            .iter()
            .map(|(_, line)| line.text().to_string())
            .collect()
    }

    #[test]
    fn test_find_skips_cursor_column() {
        let core = core_with(&[": loop", ": loop2"]);
        // Cursor at column 0 of line 1; the match at column 2 is after it
        let found = core.find("loop", FindOptions::default()).unwrap();
        assert_eq!((found.line_number, found.column), (1, 2));
    }

    #[test]
    fn test_find_moves_to_later_line() {
        let mut core = core_with(&[": loop", ": loop2"]);
        core.store_mut().set_cursor_column(2);
        let found = core.find("loop", FindOptions::default()).unwrap();
        assert_eq!((found.line_number, found.column), (2, 2));
    }

    #[test]
    fn test_find_case_folding() {
        let core = core_with(&["END", ": Finish"]);
        let options = FindOptions {
            wrap: false,
            case_sensitive: false,
        };
        let found = core.find("finish", options).unwrap();
        assert_eq!(found.line_number, 2);

        let strict = FindOptions {
            wrap: false,
            case_sensitive: true,
        };
        assert!(core.find("finish", strict).is_none());
    }

    #[test]
    fn test_find_wraps_excluding_start_line() {
        let mut core = core_with(&[": target", "END", ": target"]);
        core.store_mut().goto_line(3);
        core.store_mut().set_cursor_column(2);

        let wrapped = FindOptions {
            wrap: true,
            case_sensitive: true,
        };
        let found = core.find("target", wrapped).unwrap();
        assert_eq!(found.line_number, 1);

        let no_wrap = FindOptions {
            wrap: false,
            case_sensitive: true,
        };
        assert!(core.find("target", no_wrap).is_none());
    }

    #[test]
    fn test_find_empty_pattern() {
        let core = core_with(&["END"]);
        assert!(core.find("", FindOptions::default()).is_none());
    }

    #[test]
    fn test_replace_one() {
        let mut core = core_with(&["END", ": start"]);
        let found = core
            .replace_one("start", "begin", FindOptions::default())
            .unwrap()
            .unwrap();
        assert_eq!(found.line_number, 2);
        assert_eq!(texts(&core), vec!["END", ": begin"]);
        assert_eq!(core.store().cursor_line(), 2);
    }

    #[test]
    fn test_replace_all_counts_and_terminates() {
        let mut core = core_with(&["WAIT 1", "WAIT 1", "WAIT 1"]);
        core.store_mut().goto_line(2);

        let summary = core.replace_all("1", "11", FindOptions::default());
        assert_eq!(summary.replaced, 3);
        assert!(summary.refused.is_none());
        assert_eq!(texts(&core), vec!["WAIT 11", "WAIT 11", "WAIT 11"]);
    }

    #[test]
    fn test_replace_all_self_matching_replacement() {
        let mut core = core_with(&[": a", ": a"]);
        let summary = core.replace_all("a", "aa", FindOptions::default());
        assert_eq!(summary.replaced, 2);
        assert_eq!(texts(&core), vec![": aa", ": aa"]);
    }

    #[test]
    fn test_replace_all_covers_start_line_before_cursor() {
        let mut core = core_with(&["END", ": a_b_a"]);
        core.store_mut().goto_line(2);
        core.store_mut().set_cursor_column(4);

        let summary = core.replace_all("a", "z", FindOptions::default());
        assert_eq!(summary.replaced, 2);
        assert_eq!(texts(&core), vec!["END", ": z_b_z"]);
    }

    #[test]
    fn test_replace_all_single_line_growing_replacement() {
        let mut core = core_with(&[": a_a"]);
        core.store_mut().set_cursor_column(3);

        let summary = core.replace_all("a", "aa", FindOptions::default());
        assert_eq!(summary.replaced, 2);
        assert_eq!(texts(&core), vec![": aa_aa"]);
    }

    #[test]
    fn test_find_from_inside_multibyte_char() {
        let mut core = core_with(&["* \"\u{e9}xa\""]);
        // Column 3 is the first byte of the two-byte character
        core.store_mut().set_cursor_column(3);
        let options = FindOptions {
            wrap: false,
            case_sensitive: true,
        };
        let found = core.find("a", options).unwrap();
        assert_eq!((found.line_number, found.column), (1, 6));
    }

    #[test]
    fn test_replace_all_without_wrap_stops_at_end() {
        let mut core = core_with(&[": x", ": x", ": x"]);
        core.store_mut().goto_line(2);
        let options = FindOptions {
            wrap: false,
            case_sensitive: true,
        };
        let summary = core.replace_all("x", "y", options);
        assert_eq!(summary.replaced, 2);
        assert_eq!(texts(&core), vec![": x", ": y", ": y"]);
    }
}
