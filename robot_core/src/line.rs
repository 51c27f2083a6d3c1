//! Line records and their validity classification

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::codec::{encode_comment, ArgKind};

/// Longest display text a line may carry
pub const MAX_LINE_TEXT: usize = 240;

/// Longest text a comment pass-through line may carry
pub const MAX_COMMENT_TEXT: usize = 236;

/// Validity of a line's bytecode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Validity {
    /// Compiled; the stored bytecode is authoritative
    Valid,
    /// Did not compile; dropped on save, blocks a clean close
    InvalidUncertain,
    /// Did not compile; dropped on save
    InvalidDiscard,
    /// Did not compile; saved as a comment holding the literal text
    InvalidComment,
}

impl Validity {
    pub fn is_valid(self) -> bool {
        self == Validity::Valid
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Validity::Valid => "valid",
            Validity::InvalidUncertain => "ignore",
            Validity::InvalidDiscard => "delete",
            Validity::InvalidComment => "comment",
        }
    }
}

/// User-chosen handling for a line that does not compile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    Ignore,
    Delete,
    Comment,
}

impl Disposition {
    pub fn validity(self) -> Validity {
        match self {
            Disposition::Ignore => Validity::InvalidUncertain,
            Disposition::Delete => Validity::InvalidDiscard,
            Disposition::Comment => Validity::InvalidComment,
        }
    }

    /// Inverse of [`Disposition::validity`]; `None` for valid lines
    pub fn from_validity(validity: Validity) -> Option<Self> {
        match validity {
            Validity::Valid => None,
            Validity::InvalidUncertain => Some(Disposition::Ignore),
            Validity::InvalidDiscard => Some(Disposition::Delete),
            Validity::InvalidComment => Some(Disposition::Comment),
        }
    }
}

/// One source line with its paired bytecode
///
/// Fields are private: the text and the bytecode only ever change together,
/// through `EditorCore::update`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub(crate) text: String,
    pub(crate) bytecode: Vec<u8>,
    pub(crate) bytecode_length: usize,
    pub(crate) arg_types: Vec<ArgKind>,
    pub(crate) validity: Validity,
}

impl Line {
    /// Fresh line with no content, not yet routed through the codec
    pub(crate) fn empty() -> Self {
        Self {
            text: String::new(),
            bytecode: Vec::new(),
            bytecode_length: 0,
            arg_types: Vec::new(),
            validity: Validity::Valid,
        }
    }

    /// Line taken verbatim from a decoded program
    pub(crate) fn decoded(text: String, bytecode: Vec<u8>, arg_types: Vec<ArgKind>) -> Self {
        Self {
            text,
            bytecode_length: bytecode.len(),
            bytecode,
            arg_types,
            validity: Validity::Valid,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn bytecode(&self) -> &[u8] {
        &self.bytecode
    }

    /// Bytes this line contributes to the program size
    pub fn bytecode_length(&self) -> usize {
        self.bytecode_length
    }

    pub fn arg_types(&self) -> &[ArgKind] {
        &self.arg_types
    }

    pub fn validity(&self) -> Validity {
        self.validity
    }

    pub fn is_blank(&self) -> bool {
        self.text.is_empty()
    }

    /// Bytes this line contributes to a flattened program
    pub fn program_bytes(&self) -> Cow<'_, [u8]> {
        match self.validity {
            Validity::Valid => Cow::Borrowed(&self.bytecode),
            Validity::InvalidComment => Cow::Owned(encode_comment(&self.text)),
            Validity::InvalidUncertain | Validity::InvalidDiscard => Cow::Borrowed(&[]),
        }
    }
}

/// Truncate to at most `max` bytes without splitting a character
pub(crate) fn truncate_text(text: &mut String, max: usize) {
    if text.len() <= max {
        return;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text.truncate(end);
}
