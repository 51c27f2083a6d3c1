//! Edit errors

use thiserror::Error;

/// An edit that was refused; the store is left exactly as it was
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EditError {
    #[error("Program would grow to {needed} bytes (limit {max})")]
    CapacityExceeded { needed: usize, max: usize },

    #[error("Unknown macro: {0}")]
    UnknownMacro(String),

    #[error("Line no longer exists")]
    LineNotFound,

    #[error("Out of memory")]
    OutOfMemory,
}

pub type EditResult<T> = Result<T, EditError>;
