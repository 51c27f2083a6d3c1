//! Line store
//!
//! Lines live in an arena and are linked through `previous`/`next` indices.
//! Slot 0 is a sentinel head that carries no content and is never counted
//! towards the program size. Every structural edit keeps the cursor line
//! number, the mark endpoints and the running size consistent before it
//! returns.

use tracing::debug;

use crate::codec::BLANK_LINE;
use crate::error::{EditError, EditResult};
use crate::line::Line;
use crate::selection::Mark;

/// Prologue byte of a program buffer
pub const PROGRAM_PROLOGUE: u8 = 0xFF;

/// Epilogue byte of a program buffer
pub const PROGRAM_EPILOGUE: u8 = 0x00;

/// Bytes added to the line total by the prologue and epilogue
pub const PROGRAM_FRAMING: usize = 2;

/// Default program capacity in bytes
pub const DEFAULT_MAX_SIZE: usize = 65_535;

/// Stable handle to a line
///
/// Handles carry a generation so a handle to a deleted line never aliases a
/// line that later reuses its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineId {
    index: u32,
    generation: u32,
}

impl LineId {
    /// The sentinel head
    pub const HEAD: LineId = LineId {
        index: 0,
        generation: 0,
    };

    pub fn is_head(&self) -> bool {
        self.index == 0
    }
}

/// Where a new line goes relative to its anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Before,
    After,
}

/// Where the cursor goes when its line is deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveFocus {
    Previous,
    Next,
}

#[derive(Debug, Clone)]
struct Node {
    line: Line,
    previous: Option<LineId>,
    next: Option<LineId>,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Doubly-linked sequence of lines with size accounting
#[derive(Debug, Clone)]
pub struct LineStore {
    slots: Vec<Slot>,
    free: Vec<u32>,
    total_size: usize,
    max_size: usize,
    line_count: usize,
    cursor: LineId,
    cursor_line: usize,
    cursor_col: usize,
    mark: Option<Mark>,
    mark_complete: bool,
}

impl LineStore {
    /// Empty store holding only the sentinel
    pub fn new(max_size: usize) -> Self {
        let head = Slot {
            generation: 0,
            node: Some(Node {
                line: Line::empty(),
                previous: None,
                next: None,
            }),
        };
        Self {
            slots: vec![head],
            free: Vec::new(),
            total_size: 0,
            max_size,
            line_count: 0,
            cursor: LineId::HEAD,
            cursor_line: 0,
            cursor_col: 0,
            mark: None,
            mark_complete: false,
        }
    }

    fn node(&self, id: LineId) -> Option<&Node> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    fn node_mut(&mut self, id: LineId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    /// Whether `id` names a live content line
    pub fn contains(&self, id: LineId) -> bool {
        !id.is_head() && self.node(id).is_some()
    }

    pub fn get(&self, id: LineId) -> Option<&Line> {
        if id.is_head() {
            return None;
        }
        self.node(id).map(|node| &node.line)
    }

    pub(crate) fn get_mut(&mut self, id: LineId) -> Option<&mut Line> {
        if id.is_head() {
            return None;
        }
        self.node_mut(id).map(|node| &mut node.line)
    }

    pub fn first(&self) -> Option<LineId> {
        self.node(LineId::HEAD).and_then(|head| head.next)
    }

    pub fn last(&self) -> Option<LineId> {
        let mut current = self.first()?;
        while let Some(next) = self.next(current) {
            current = next;
        }
        Some(current)
    }

    pub fn next(&self, id: LineId) -> Option<LineId> {
        self.node(id).and_then(|node| node.next)
    }

    /// Previous content line; `None` at the first line
    pub fn previous(&self, id: LineId) -> Option<LineId> {
        self.node(id)
            .and_then(|node| node.previous)
            .filter(|prev| !prev.is_head())
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            store: self,
            next: self.first(),
        }
    }

    /// 1-based line number of `id`
    pub fn line_number(&self, id: LineId) -> Option<usize> {
        if id.is_head() {
            return Some(0);
        }
        if id == self.cursor {
            return Some(self.cursor_line);
        }
        self.iter()
            .position(|(candidate, _)| candidate == id)
            .map(|pos| pos + 1)
    }

    /// Line at 1-based position `number`
    pub fn line_at(&self, number: usize) -> Option<LineId> {
        if number == 0 {
            return None;
        }
        self.iter().nth(number - 1).map(|(id, _)| id)
    }

    /// Sum of every line's bytecode length
    pub fn total_size(&self) -> usize {
        self.total_size
    }

    /// Size of the flattened program including its framing
    pub fn program_size(&self) -> usize {
        self.total_size + PROGRAM_FRAMING
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn line_count(&self) -> usize {
        self.line_count
    }

    pub fn cursor(&self) -> LineId {
        self.cursor
    }

    /// 1-based line number of the cursor
    pub fn cursor_line(&self) -> usize {
        self.cursor_line
    }

    pub fn cursor_column(&self) -> usize {
        self.cursor_col
    }

    pub fn set_cursor_column(&mut self, col: usize) {
        self.cursor_col = col;
    }

    pub fn mark(&self) -> Option<&Mark> {
        self.mark.as_ref()
    }

    pub(crate) fn mark_state(&mut self) -> (&mut Option<Mark>, &mut bool) {
        (&mut self.mark, &mut self.mark_complete)
    }

    pub(crate) fn set_cursor(&mut self, id: LineId, line_number: usize) {
        self.cursor = id;
        self.cursor_line = line_number;
    }

    /// Refuse a size change from `old` to `new` bytes that would overflow
    pub(crate) fn check_capacity(&self, old: usize, new: usize) -> EditResult<()> {
        let needed = self.program_size() - old + new;
        if needed > self.max_size {
            return Err(EditError::CapacityExceeded {
                needed,
                max: self.max_size,
            });
        }
        Ok(())
    }

    pub(crate) fn adjust_size(&mut self, old: usize, new: usize) {
        self.total_size = self.total_size - old + new;
    }

    /// Allocate an unlinked node for `line`
    pub(crate) fn allocate(&mut self, line: Line) -> EditResult<LineId> {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(Node {
                line,
                previous: None,
                next: None,
            });
            return Ok(LineId {
                index,
                generation: slot.generation,
            });
        }

        self.slots
            .try_reserve(1)
            .map_err(|_| EditError::OutOfMemory)?;
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node: Some(Node {
                line,
                previous: None,
                next: None,
            }),
        });
        Ok(LineId {
            index,
            generation: 0,
        })
    }

    pub(crate) fn release(&mut self, id: LineId) -> Option<Line> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        Some(node.line)
    }

    /// Splice the allocated node `id` next to `anchor`
    ///
    /// Shifts the cursor line number and mark endpoints at or past the
    /// insertion point, and accounts the node's current size.
    pub(crate) fn link(&mut self, anchor: LineId, relation: Relation, id: LineId) -> EditResult<()> {
        let anchor_number = self.line_number(anchor).ok_or(EditError::LineNotFound)?;
        self.link_numbered(anchor, anchor_number, relation, id).map(|_| ())
    }

    /// `link` for a caller that already knows `anchor`'s line number
    ///
    /// Returns the new line's number.
    pub(crate) fn link_numbered(
        &mut self,
        anchor: LineId,
        anchor_number: usize,
        relation: Relation,
        id: LineId,
    ) -> EditResult<usize> {
        let (previous, next, position) = match relation {
            Relation::After => (anchor, self.next(anchor), anchor_number + 1),
            Relation::Before => {
                if anchor.is_head() {
                    return Err(EditError::LineNotFound);
                }
                let previous = self
                    .node(anchor)
                    .and_then(|node| node.previous)
                    .ok_or(EditError::LineNotFound)?;
                (previous, Some(anchor), anchor_number)
            }
        };

        let length = {
            let node = self.node_mut(id).ok_or(EditError::LineNotFound)?;
            node.previous = Some(previous);
            node.next = next;
            node.line.bytecode_length
        };
        if let Some(node) = self.node_mut(previous) {
            node.next = Some(id);
        }
        if let Some(next) = next {
            if let Some(node) = self.node_mut(next) {
                node.previous = Some(id);
            }
        }

        if let Some(mark) = self.mark.as_mut() {
            if mark.start_line >= position {
                mark.start_line += 1;
            }
            if mark.end_line >= position {
                mark.end_line += 1;
            }
        }
        if !self.cursor.is_head() && self.cursor_line >= position {
            self.cursor_line += 1;
        }

        self.line_count += 1;
        self.total_size += length;
        Ok(position)
    }

    /// Unlink `id` and free it, returning its line
    ///
    /// Mark endpoints are fixed up before the node goes away; the cursor
    /// must already have been moved off `id` by the caller.
    pub(crate) fn unlink(&mut self, id: LineId) -> Option<Line> {
        if id.is_head() {
            return None;
        }
        let number = self.line_number(id)?;
        self.unlink_numbered(id, number)
    }

    /// `unlink` for a caller that already knows `id` is line `number`
    pub(crate) fn unlink_numbered(&mut self, id: LineId, number: usize) -> Option<Line> {
        if id.is_head() {
            return None;
        }
        let (previous, next) = {
            let node = self.node(id)?;
            (node.previous?, node.next)
        };

        if let Some(node) = self.node_mut(previous) {
            node.next = next;
        }
        if let Some(next) = next {
            if let Some(node) = self.node_mut(next) {
                node.previous = Some(previous);
            }
        }

        if let Some(mut mark) = self.mark.take() {
            if mark.start == id {
                if let Some(next) = next {
                    mark.start = next;
                }
            }
            if mark.end == id {
                mark.end = previous;
            }
            if mark.start_line > number {
                mark.start_line -= 1;
            }
            if mark.end_line >= number {
                mark.end_line = mark.end_line.saturating_sub(1);
            }
            if mark.start_line <= mark.end_line && !mark.end.is_head() {
                self.mark = Some(mark);
            } else {
                self.mark_complete = false;
            }
        }

        if self.cursor != id && self.cursor_line > number {
            self.cursor_line -= 1;
        }

        let line = self.release(id)?;
        self.line_count -= 1;
        self.total_size -= line.bytecode_length;
        Some(line)
    }

    /// Unlink and free the run of lines from `start` through `end`
    ///
    /// Only the links, the size and the count are maintained here; the
    /// caller owns cursor and mark relocation.
    pub(crate) fn unlink_span(&mut self, start: LineId, end: LineId) -> usize {
        let before = match self.node(start).and_then(|node| node.previous) {
            Some(before) => before,
            None => return 0,
        };
        let after = self.next(end);

        let mut removed = 0;
        let mut current = Some(start);
        while let Some(id) = current {
            current = if id == end { None } else { self.next(id) };
            if let Some(line) = self.release(id) {
                self.total_size -= line.bytecode_length;
                self.line_count -= 1;
                removed += 1;
            }
        }

        if let Some(node) = self.node_mut(before) {
            node.next = after;
        }
        if let Some(after) = after {
            if let Some(node) = self.node_mut(after) {
                node.previous = Some(before);
            }
        }
        removed
    }

    /// Add a line at the end without any renumbering (used while loading)
    pub(crate) fn append(&mut self, line: Line) -> EditResult<LineId> {
        let anchor = self.last().unwrap_or(LineId::HEAD);
        let id = self.allocate(line)?;
        let length = {
            let node = self.node_mut(id).ok_or(EditError::LineNotFound)?;
            node.previous = Some(anchor);
            node.line.bytecode_length
        };
        if let Some(node) = self.node_mut(anchor) {
            node.next = Some(id);
        }
        self.line_count += 1;
        self.total_size += length;
        Ok(id)
    }

    /// Insert a blank line next to `anchor`
    pub fn insert_blank(&mut self, anchor: LineId, relation: Relation) -> EditResult<LineId> {
        self.check_capacity(0, BLANK_LINE.len())?;
        let line = Line::decoded(String::new(), BLANK_LINE.to_vec(), Vec::new());
        let id = self.allocate(line)?;
        if let Err(err) = self.link(anchor, relation, id) {
            self.release(id);
            return Err(err);
        }
        Ok(id)
    }

    /// Delete `id`, refusing to delete the last remaining line
    pub fn delete(&mut self, id: LineId, focus: MoveFocus) -> bool {
        if self.line_count <= 1 || !self.contains(id) {
            return false;
        }

        let number = if id == self.cursor {
            let previous = self.previous(id);
            let next = self.next(id);
            let line = self.cursor_line;
            // Numbers are pre-deletion; unlink renumbers lines past `id`
            match (focus, previous, next) {
                (MoveFocus::Next, _, Some(next)) => self.set_cursor(next, line + 1),
                (MoveFocus::Next, Some(previous), None) => self.set_cursor(previous, line - 1),
                (MoveFocus::Previous, Some(previous), _) => self.set_cursor(previous, line - 1),
                (MoveFocus::Previous, None, Some(next)) => self.set_cursor(next, line + 1),
                _ => return false,
            }
            line
        } else {
            match self.line_number(id) {
                Some(number) => number,
                None => return false,
            }
        };

        match self.unlink_numbered(id, number) {
            Some(line) => {
                debug!(size = line.bytecode_length, lines = self.line_count, "deleted line");
                true
            }
            None => false,
        }
    }

    /// Move the cursor by `count` lines
    ///
    /// Moving down past the last line appends a blank line (unless the last
    /// line already is blank) and stops there. Moving up stops at line 1.
    pub fn move_cursor(&mut self, count: isize) {
        if count < 0 {
            for _ in 0..count.unsigned_abs() {
                match self.previous(self.cursor) {
                    Some(previous) => {
                        let line = self.cursor_line - 1;
                        self.set_cursor(previous, line);
                    }
                    None => break,
                }
            }
            return;
        }

        for _ in 0..count {
            match self.next(self.cursor) {
                Some(next) => {
                    let line = self.cursor_line + 1;
                    self.set_cursor(next, line);
                }
                None => {
                    let blank = self.get(self.cursor).map(Line::is_blank).unwrap_or(true);
                    if !blank {
                        let anchor = self.cursor;
                        if let Ok(id) = self.insert_blank(anchor, Relation::After) {
                            let line = self.cursor_line + 1;
                            self.set_cursor(id, line);
                        }
                    }
                    break;
                }
            }
        }
    }

    /// Move the cursor to line `number`, clamped into the program
    pub fn goto_line(&mut self, number: usize) {
        let target = number.clamp(1, self.line_count.max(1));
        let delta = target as isize - self.cursor_line as isize;
        self.move_cursor(delta);
    }

    /// Flatten into one program buffer
    ///
    /// Comment lines become pass-through records, lines that did not
    /// compile are dropped, and a blank last line is trimmed.
    pub fn flatten(&self) -> Vec<u8> {
        let mut program = Vec::with_capacity(self.program_size());
        program.push(PROGRAM_PROLOGUE);

        for (id, line) in self.iter() {
            if self.next(id).is_none() && line.is_blank() {
                break;
            }
            program.extend_from_slice(&line.program_bytes());
        }

        program.push(PROGRAM_EPILOGUE);
        program
    }
}

/// Iterator over content lines in order
pub struct Iter<'a> {
    store: &'a LineStore,
    next: Option<LineId>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (LineId, &'a Line);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let node = self.store.node(id)?;
        self.next = node.next;
        Some((id, &node.line))
    }
}
