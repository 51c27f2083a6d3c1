//! Block selection
//!
//! A mark is a pair of line endpoints. The first mark command drops both
//! endpoints on the cursor line, the second moves the end, and from then on
//! `mark_begin`/`mark_end` move the endpoint they name. The endpoints are
//! kept ordered at all times.
//!
//! Block operations without a mark act on the cursor line alone.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::store::{LineId, LineStore, Relation, PROGRAM_EPILOGUE, PROGRAM_PROLOGUE};

/// Marked line range, inclusive at both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark {
    pub start_line: usize,
    pub end_line: usize,
    pub start: LineId,
    pub end: LineId,
}

impl Mark {
    fn single(id: LineId, line: usize) -> Self {
        Self {
            start_line: line,
            end_line: line,
            start: id,
            end: id,
        }
    }

    /// Number of lines covered
    pub fn line_count(&self) -> usize {
        self.end_line - self.start_line + 1
    }

    pub fn contains(&self, line: usize) -> bool {
        (self.start_line..=self.end_line).contains(&line)
    }

    fn order(&mut self) {
        if self.start_line > self.end_line {
            std::mem::swap(&mut self.start_line, &mut self.end_line);
            std::mem::swap(&mut self.start, &mut self.end);
        }
    }
}

/// Export encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Text,
    Bytecode,
}

/// Export scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportRegion {
    Program,
    Block,
}

#[derive(Clone, Copy)]
enum Endpoint {
    Begin,
    End,
}

impl LineStore {
    pub fn mark_begin(&mut self) {
        self.place_mark(Endpoint::Begin);
    }

    pub fn mark_end(&mut self) {
        self.place_mark(Endpoint::End);
    }

    pub fn unmark(&mut self) {
        let (mark, complete) = self.mark_state();
        *mark = None;
        *complete = false;
    }

    fn place_mark(&mut self, endpoint: Endpoint) {
        let cursor = self.cursor();
        let line = self.cursor_line();
        let (mark, complete) = self.mark_state();

        match *mark {
            None => *mark = Some(Mark::single(cursor, line)),
            Some(ref mut placed) if !*complete => {
                placed.end_line = line;
                placed.end = cursor;
                *complete = true;
            }
            Some(ref mut placed) => match endpoint {
                Endpoint::Begin => {
                    placed.start_line = line;
                    placed.start = cursor;
                }
                Endpoint::End => {
                    placed.end_line = line;
                    placed.end = cursor;
                }
            },
        }

        if let Some(mark) = mark.as_mut() {
            mark.order();
        }
    }

    /// The mark, or the cursor line when nothing is marked
    pub fn block(&self) -> Mark {
        self.mark()
            .copied()
            .unwrap_or_else(|| Mark::single(self.cursor(), self.cursor_line()))
    }

    fn block_ids(&self, block: &Mark) -> Vec<LineId> {
        let mut ids = Vec::with_capacity(block.line_count());
        let mut current = Some(block.start);
        while let Some(id) = current {
            ids.push(id);
            if id == block.end || ids.len() == block.line_count() {
                break;
            }
            current = self.next(id);
        }
        ids
    }

    /// Text of every line in the block
    pub fn copy_block(&self) -> Vec<String> {
        let block = self.block();
        self.block_ids(&block)
            .into_iter()
            .filter_map(|id| self.get(id).map(|line| line.text().to_string()))
            .collect()
    }

    /// Delete the block and clear the mark
    ///
    /// If that empties the store a single blank line takes its place.
    pub fn clear_block(&mut self) -> usize {
        let block = self.block();
        let before = self.previous(block.start).unwrap_or(LineId::HEAD);
        let after = self.next(block.end);
        let cursor_line = self.cursor_line();

        self.unmark();
        let removed = self.unlink_span(block.start, block.end);

        if self.line_count() == 0 {
            self.set_cursor(LineId::HEAD, 0);
            if let Ok(id) = self.insert_blank(LineId::HEAD, Relation::After) {
                self.set_cursor(id, 1);
            }
        } else if block.contains(cursor_line) {
            match after {
                Some(after) => self.set_cursor(after, block.start_line),
                None => self.set_cursor(before, block.start_line - 1),
            }
        } else if cursor_line > block.end_line {
            let cursor = self.cursor();
            self.set_cursor(cursor, cursor_line - removed);
        }

        debug!(removed, lines = self.line_count(), "cleared block");
        removed
    }

    /// Copy then clear
    pub fn cut_block(&mut self) -> Vec<String> {
        let lines = self.copy_block();
        self.clear_block();
        lines
    }

    pub fn export_block(&self, format: ExportFormat, region: ExportRegion) -> Vec<u8> {
        let ids: Vec<LineId> = match region {
            ExportRegion::Program => self.iter().map(|(id, _)| id).collect(),
            ExportRegion::Block => self.block_ids(&self.block()),
        };
        let lines = ids.into_iter().filter_map(|id| self.get(id));

        match format {
            ExportFormat::Text => {
                let mut out = Vec::new();
                for line in lines {
                    out.extend_from_slice(line.text().as_bytes());
                    out.push(b'\n');
                }
                out
            }
            ExportFormat::Bytecode => {
                let mut out = vec![PROGRAM_PROLOGUE];
                for line in lines {
                    out.extend_from_slice(&line.program_bytes());
                }
                out.push(PROGRAM_EPILOGUE);
                out
            }
        }
    }
}
