//! Command parsing and execution

use std::path::PathBuf;

use robot_core::{Disposition, ExportFormat, ExportRegion};
use thiserror::Error;

use crate::settings::QUICK_MACRO_SLOTS;

/// Command parsing error
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Invalid syntax: {0}")]
    InvalidSyntax(String),
}

/// Editor command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Store the program without closing
    Write,
    /// Close; refused while lines are unresolved
    Quit,
    /// Close regardless of unresolved lines
    ForceQuit,
    /// Store and close
    WriteQuit,
    Goto(usize),
    Find(String),
    Replace { pattern: String, replacement: String },
    ReplaceAll { pattern: String, replacement: String },
    MarkStart,
    MarkEnd,
    MarkClear,
    Copy,
    Cut,
    Clear,
    Paste,
    /// Resolve every unresolved line, or just report how many remain
    Validate(Option<Disposition>),
    /// Expand `name(args)` above the cursor
    Macro(String),
    Quick(usize),
    Import(PathBuf),
    Export {
        path: PathBuf,
        region: ExportRegion,
        format: ExportFormat,
    },
}

/// Command parser
pub struct CommandParser;

impl CommandParser {
    /// Parse a command string (without the leading ':')
    pub fn parse(cmd: &str) -> Result<Command, CommandError> {
        let trimmed = cmd.trim();
        let (head, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim_start()),
            None => (trimmed, ""),
        };

        match head {
            "w" | "write" => Ok(Command::Write),
            "q" | "quit" => Ok(Command::Quit),
            "q!" | "quit!" => Ok(Command::ForceQuit),
            "wq" | "x" => Ok(Command::WriteQuit),
            "goto" => rest
                .trim()
                .parse()
                .map(Command::Goto)
                .map_err(|_| CommandError::InvalidSyntax(format!("goto needs a line number: {}", rest))),
            "find" => Ok(Command::Find(required(head, rest)?.to_string())),
            "replace" => {
                let (pattern, replacement) = split_replace(head, rest)?;
                Ok(Command::Replace {
                    pattern,
                    replacement,
                })
            }
            "replaceall" => {
                let (pattern, replacement) = split_replace(head, rest)?;
                Ok(Command::ReplaceAll {
                    pattern,
                    replacement,
                })
            }
            "mark" => match rest.trim() {
                "start" => Ok(Command::MarkStart),
                "end" => Ok(Command::MarkEnd),
                "clear" => Ok(Command::MarkClear),
                other => Err(CommandError::InvalidSyntax(format!(
                    "mark takes start, end or clear: {}",
                    other
                ))),
            },
            "copy" => Ok(Command::Copy),
            "cut" => Ok(Command::Cut),
            "clear" => Ok(Command::Clear),
            "paste" => Ok(Command::Paste),
            "validate" => match rest.trim() {
                "" => Ok(Command::Validate(None)),
                "ignore" => Ok(Command::Validate(Some(Disposition::Ignore))),
                "delete" => Ok(Command::Validate(Some(Disposition::Delete))),
                "comment" => Ok(Command::Validate(Some(Disposition::Comment))),
                other => Err(CommandError::InvalidSyntax(format!(
                    "unknown disposition: {}",
                    other
                ))),
            },
            "macro" => Ok(Command::Macro(required(head, rest)?.to_string())),
            "quick" => match rest.trim().parse::<usize>() {
                Ok(slot) if (1..=QUICK_MACRO_SLOTS).contains(&slot) => Ok(Command::Quick(slot)),
                _ => Err(CommandError::InvalidSyntax(format!(
                    "quick takes a slot from 1 to {}",
                    QUICK_MACRO_SLOTS
                ))),
            },
            "import" => Ok(Command::Import(PathBuf::from(required(head, rest)?.trim()))),
            "export" => parse_export(rest),
            "" => Err(CommandError::InvalidSyntax("Empty command".to_string())),
            _ => Err(CommandError::UnknownCommand(trimmed.to_string())),
        }
    }
}

fn required<'a>(command: &str, rest: &'a str) -> Result<&'a str, CommandError> {
    if rest.is_empty() {
        return Err(CommandError::InvalidSyntax(format!("{} needs an argument", command)));
    }
    Ok(rest)
}

fn split_replace(command: &str, rest: &str) -> Result<(String, String), CommandError> {
    match required(command, rest)?.split_once('/') {
        Some((pattern, replacement)) if !pattern.is_empty() => {
            Ok((pattern.to_string(), replacement.to_string()))
        }
        _ => Err(CommandError::InvalidSyntax(format!(
            "{} takes PATTERN/REPLACEMENT",
            command
        ))),
    }
}

fn parse_export(rest: &str) -> Result<Command, CommandError> {
    let mut words = rest.split_whitespace();
    let path = words
        .next()
        .ok_or_else(|| CommandError::InvalidSyntax("export needs a path".to_string()))?;

    let mut region = ExportRegion::Program;
    let mut format = ExportFormat::Text;
    for word in words {
        match word {
            "block" => region = ExportRegion::Block,
            "bc" => format = ExportFormat::Bytecode,
            "txt" => format = ExportFormat::Text,
            other => {
                return Err(CommandError::InvalidSyntax(format!(
                    "unknown export option: {}",
                    other
                )))
            }
        }
    }

    Ok(Command::Export {
        path: PathBuf::from(path),
        region,
        format,
    })
}
