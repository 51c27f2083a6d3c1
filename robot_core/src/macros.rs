//! Macro templates and expansion
//!
//! A template is a named list of lines with `!name!` references to typed
//! variables. Typing `#name(args)` on a line expands the template in place:
//! the line takes the first generated line and the rest are inserted after
//! it. Generated lines go through `update` like any other text, so a
//! generated `#other(...)` line expands too, bounded by the recursion and
//! repeat guards.
//!
//! Reference syntax inside template lines:
//! - `!name!` renders the variable (numbers in decimal)
//! - `!name:x!` renders a number as two lower-case hex digits
//! - an unknown name renders as `(undef)`

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::color::{parse_color, print_color, MAX_COLOR};
use crate::core::EditorCore;
use crate::error::{EditError, EditResult};
use crate::line::truncate_text;
use crate::store::{LineId, Relation};
use crate::sync::UpdateOutcome;

/// Placeholder for a reference to a variable the template does not declare
pub const UNDEFINED_REFERENCE: &str = "(undef)";

/// Type of a parameter group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParamKind {
    Number { min: i32, max: i32 },
    String { max_len: usize },
    Character,
    Color,
}

/// Value bound to a variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(i32),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroVariable {
    pub name: String,
    pub default: ParamValue,
}

/// Variables sharing one type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamGroup {
    pub kind: ParamKind,
    pub variables: Vec<MacroVariable>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroTemplate {
    pub name: String,
    /// Human-readable title
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub groups: Vec<ParamGroup>,
    pub lines: Vec<String>,
}

/// One argument of an invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroArg {
    /// Set for `name=value` arguments
    pub name: Option<String>,
    pub value: String,
}

/// Parsed `name(args)` text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub name: String,
    pub args: Vec<MacroArg>,
}

/// Per-expansion variable values, parallel to the template's groups
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bindings {
    values: Vec<Vec<ParamValue>>,
}

impl Bindings {
    pub fn get(&self, group: usize, variable: usize) -> Option<&ParamValue> {
        self.values.get(group).and_then(|vars| vars.get(variable))
    }
}

/// Split `name(arg, key=value, ...)` into its parts
///
/// The argument list may also start with a comma instead of a
/// parenthesis. A closing parenthesis ends it.
pub fn parse_invocation(text: &str) -> Invocation {
    let text = text.trim_start();
    let split = text.find(|c: char| c == '(' || c == ',').unwrap_or(text.len());
    let name = text[..split].trim().to_string();

    let mut args = Vec::new();
    if split < text.len() {
        let rest = &text[split + 1..];
        let rest = match rest.find(')') {
            Some(end) => &rest[..end],
            None => rest,
        };
        if !rest.trim().is_empty() {
            for raw in rest.split(',') {
                let arg = match raw.split_once('=') {
                    Some((key, value)) => MacroArg {
                        name: Some(key.trim().to_string()),
                        value: value.trim().to_string(),
                    },
                    None => MacroArg {
                        name: None,
                        value: raw.trim().to_string(),
                    },
                };
                args.push(arg);
            }
        }
    }

    Invocation { name, args }
}

/// Leading integer of `text`, `strtol`-style: optional sign then digits,
/// anything after is ignored and no digits at all reads as zero
fn parse_leading_int(text: &str) -> i64 {
    let text = text.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let mut value: i64 = 0;
    for byte in digits.bytes().take_while(u8::is_ascii_digit) {
        value = value.saturating_mul(10).saturating_add((byte - b'0') as i64);
    }
    if negative {
        -value
    } else {
        value
    }
}

impl ParamKind {
    /// Parse a raw argument for this kind; `None` keeps the current value
    fn parse(&self, raw: &str) -> Option<ParamValue> {
        match self {
            ParamKind::Number { min, max } => {
                let value = parse_leading_int(raw).clamp(*min as i64, *max as i64);
                Some(ParamValue::Number(value as i32))
            }
            ParamKind::String { max_len } => {
                let mut value = raw.to_string();
                truncate_text(&mut value, *max_len);
                Some(ParamValue::Text(value))
            }
            ParamKind::Character => {
                let code = match raw.strip_prefix('\'') {
                    Some(rest) => rest.chars().next().map(|c| c as i64).unwrap_or(0),
                    None => parse_leading_int(raw),
                };
                Some(ParamValue::Number(code as i32))
            }
            ParamKind::Color => parse_color(raw).map(|color| ParamValue::Number(color as i32)),
        }
    }

    fn render(&self, value: &ParamValue, hex: bool) -> String {
        match (self, value) {
            (_, ParamValue::Text(text)) => text.clone(),
            (ParamKind::Number { .. }, ParamValue::Number(n)) if hex => format!("{:02x}", n),
            (ParamKind::Number { .. }, ParamValue::Number(n)) => n.to_string(),
            (ParamKind::String { .. }, ParamValue::Number(n)) => n.to_string(),
            (ParamKind::Character, ParamValue::Number(n)) => {
                let c = char::from_u32(*n as u32).unwrap_or('?');
                format!("'{}'", c)
            }
            (ParamKind::Color, ParamValue::Number(n)) => {
                print_color((*n).clamp(0, MAX_COLOR as i32) as u16)
            }
        }
    }
}

/// Piece of a template line
enum Fragment<'a> {
    Literal(&'a str),
    Reference { name: &'a str, hex: bool },
}

fn is_reference_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn fragments(line: &str) -> Vec<Fragment<'_>> {
    let mut out = Vec::new();
    let mut rest = line;

    while let Some(open) = rest.find('!') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('!') else {
            break;
        };

        let inner = &after[..close];
        let (name, hex) = match inner.split_once(':') {
            Some((name, "x")) => (name, true),
            Some((name, "d")) => (name, false),
            Some(_) => ("", false),
            None => (inner, false),
        };

        if is_reference_name(name) {
            out.push(Fragment::Literal(&rest[..open]));
            out.push(Fragment::Reference { name, hex });
            rest = &after[close + 1..];
        } else {
            out.push(Fragment::Literal(&rest[..=open]));
            rest = after;
        }
    }

    out.push(Fragment::Literal(rest));
    out
}

impl MacroTemplate {
    fn find_variable(&self, name: &str) -> Option<(usize, usize)> {
        self.groups.iter().enumerate().find_map(|(g, group)| {
            group
                .variables
                .iter()
                .position(|var| var.name.eq_ignore_ascii_case(name))
                .map(|v| (g, v))
        })
    }

    pub fn defaults(&self) -> Bindings {
        Bindings {
            values: self
                .groups
                .iter()
                .map(|group| group.variables.iter().map(|var| var.default.clone()).collect())
                .collect(),
        }
    }

    /// Bind invocation arguments over the defaults
    ///
    /// Named arguments go to the first variable of that name in any group.
    /// Unnamed ones take the next variable not yet given a value, moving on
    /// to the next group when one runs out. Surplus and unknown arguments
    /// are ignored.
    pub fn bind(&self, args: &[MacroArg]) -> Bindings {
        let mut bindings = self.defaults();
        let mut bound: Vec<Vec<bool>> = self
            .groups
            .iter()
            .map(|group| vec![false; group.variables.len()])
            .collect();
        let (mut group, mut variable) = (0, 0);

        for arg in args {
            let slot = match &arg.name {
                Some(name) => self.find_variable(name),
                None => loop {
                    let Some(vars) = bound.get(group) else {
                        break None;
                    };
                    if variable >= vars.len() {
                        group += 1;
                        variable = 0;
                        continue;
                    }
                    if vars[variable] {
                        variable += 1;
                        continue;
                    }
                    let slot = (group, variable);
                    variable += 1;
                    break Some(slot);
                },
            };

            let Some((g, v)) = slot else {
                continue;
            };
            if let Some(value) = self.groups[g].kind.parse(&arg.value) {
                bindings.values[g][v] = value;
            }
            bound[g][v] = true;
        }

        bindings
    }

    /// Concrete lines for one set of bindings
    pub fn render(&self, bindings: &Bindings) -> Vec<String> {
        self.lines
            .iter()
            .map(|line| {
                let mut out = String::with_capacity(line.len());
                for fragment in fragments(line) {
                    match fragment {
                        Fragment::Literal(text) => out.push_str(text),
                        Fragment::Reference { name, hex } => {
                            let rendered = self.find_variable(name).and_then(|(g, v)| {
                                bindings
                                    .get(g, v)
                                    .map(|value| self.groups[g].kind.render(value, hex))
                            });
                            out.push_str(rendered.as_deref().unwrap_or(UNDEFINED_REFERENCE));
                        }
                    }
                }
                out
            })
            .collect()
    }
}

/// Templates available to a session, looked up by name ignoring case
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MacroLibrary {
    templates: Vec<MacroTemplate>,
}

impl MacroLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a template, replacing any with the same name
    pub fn insert(&mut self, template: MacroTemplate) {
        match self
            .templates
            .iter_mut()
            .find(|t| t.name.eq_ignore_ascii_case(&template.name))
        {
            Some(existing) => *existing = template,
            None => self.templates.push(template),
        }
    }

    pub fn get(&self, name: &str) -> Option<&MacroTemplate> {
        self.templates
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name.trim()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &MacroTemplate> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl FromIterator<MacroTemplate> for MacroLibrary {
    fn from_iter<I: IntoIterator<Item = MacroTemplate>>(iter: I) -> Self {
        let mut library = Self::new();
        for template in iter {
            library.insert(template);
        }
        library
    }
}

impl EditorCore {
    /// Expand `#name(args)` text into line `id`
    pub(crate) fn expand_line(&mut self, id: LineId, text: &str) -> EditResult<UpdateOutcome> {
        let invocation = parse_invocation(text.trim_start().trim_start_matches('#'));
        let template = self
            .macros
            .get(&invocation.name)
            .cloned()
            .ok_or_else(|| EditError::UnknownMacro(invocation.name.clone()))?;
        self.expand_template(id, &template, &invocation.args)
    }

    /// Insert a new line above the cursor and expand `invocation` into it
    pub fn run_macro(&mut self, invocation: &str) -> EditResult<UpdateOutcome> {
        let cursor = self.store.cursor();
        let cursor_line = self.store.cursor_line();
        let text = format!("#{}", invocation.trim());
        let (_, outcome) = self.insert_line(cursor, cursor_line, &text, Relation::Before)?;
        Ok(outcome)
    }

    fn expand_template(
        &mut self,
        id: LineId,
        template: &MacroTemplate,
        args: &[MacroArg],
    ) -> EditResult<UpdateOutcome> {
        if self.recurse_level >= self.config.max_macro_recursion
            || self.repeat_level >= self.config.max_macro_repeat
        {
            warn!(
                name = %template.name,
                recurse_level = self.recurse_level,
                repeat_level = self.repeat_level,
                "macro guard tripped"
            );
            self.update(id, "")?;
            return Ok(UpdateOutcome::Suppressed);
        }

        let saved = self.store.get(id).cloned().ok_or(EditError::LineNotFound)?;
        let number = self.store.line_number(id).ok_or(EditError::LineNotFound)?;
        let boundary = self.store.next(id);
        let lines = template.render(&template.bind(args));

        self.recurse_level += 1;
        self.repeat_level += 1;
        let result = self.emit_lines(id, number, boundary, &lines);
        self.recurse_level -= 1;

        match result {
            Ok(count) => {
                debug!(name = %template.name, lines = count, "expanded macro");
                Ok(UpdateOutcome::Expanded { lines: count })
            }
            Err(err) => {
                self.discard_between(id, number, boundary);
                self.restore_line(id, saved);
                warn!(name = %template.name, error = %err, "macro expansion rolled back");
                Err(err)
            }
        }
    }

    /// Write `lines` into line `id` (line `number`) and above `boundary`
    ///
    /// Nested expansions only ever add lines between `id` and `boundary`,
    /// so the boundary's number follows from the line count.
    fn emit_lines(
        &mut self,
        id: LineId,
        number: usize,
        boundary: Option<LineId>,
        lines: &[String],
    ) -> EditResult<usize> {
        let count_before = self.store.line_count();
        let mut lines = lines.iter();
        let first = lines.next().map(String::as_str).unwrap_or("");
        self.update(id, first)?;

        let mut count = 1;
        for text in lines {
            match boundary {
                Some(boundary) => {
                    let boundary_number = number + 1 + self.store.line_count() - count_before;
                    self.insert_line(boundary, boundary_number, text, Relation::Before)?
                }
                None => {
                    let last = self.store.last().ok_or(EditError::LineNotFound)?;
                    let last_number = self.store.line_count();
                    self.insert_line(last, last_number, text, Relation::After)?
                }
            };
            count += 1;
        }
        Ok(count)
    }

    /// Unlink every line strictly between `id` (line `number`) and `boundary`
    fn discard_between(&mut self, id: LineId, number: usize, boundary: Option<LineId>) {
        let mut doomed = Vec::new();
        let mut current = self.store.next(id);
        while let Some(line) = current {
            if Some(line) == boundary {
                break;
            }
            doomed.push(line);
            current = self.store.next(line);
        }
        for line in doomed {
            self.store.unlink_numbered(line, number + 1);
        }
    }
}
