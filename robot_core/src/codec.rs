//! Codec seam between the editor and the robot assembler
//!
//! The editor core never interprets bytecode itself. It hands line text to a
//! [`Codec`] to compile and hands program bytes back to it to decode. The
//! only layout the core relies on is the record framing:
//!
//! ```text
//! [L][opcode][params...][L]      L = byte length of opcode + params
//! ```
//!
//! [`RobotCodec`] is a small reference assembler with that framing. It knows a
//! handful of robot commands, enough to drive the editor end-to-end.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::color::{parse_color, print_color, MAX_COLOR};

/// Opcode of a blank line
pub const BLANK_OPCODE: u8 = 47;

/// Opcode of a comment line
pub const COMMENT_OPCODE: u8 = 107;

/// Bytes a comment record adds on top of its text
/// (two length bytes, opcode, string length byte, terminator)
pub const COMMENT_OVERHEAD: usize = 5;

/// Encoded blank line
pub const BLANK_LINE: [u8; 3] = [1, BLANK_OPCODE, 1];

/// Kind of a compiled argument, used for display coloring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArgKind {
    Number,
    Word,
    Str,
    Character,
    Color,
}

/// Result of compiling one line of text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compiled {
    pub bytecode: Vec<u8>,
    /// Canonical text re-derived from the bytecode
    pub display: String,
    pub arg_types: Vec<ArgKind>,
}

/// Result of decoding one record from a program buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub display: String,
    pub consumed: usize,
    pub arg_types: Vec<ArgKind>,
}

/// Line text does not compile
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompileError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("{command}: missing argument {index}")]
    MissingArgument { command: &'static str, index: usize },

    #[error("{command}: invalid argument `{token}`")]
    InvalidArgument { command: &'static str, token: String },

    #[error("{command}: unexpected `{token}`")]
    TrailingInput { command: &'static str, token: String },

    #[error("Unterminated string")]
    UnterminatedString,

    #[error("Line too long to encode")]
    TooLong,
}

/// Program bytes could not be decoded
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("End of program")]
    EndOfProgram,

    #[error("Malformed record")]
    Malformed,
}

/// Text <-> bytecode translation, deterministic and side-effect free
pub trait Codec {
    fn compile(&self, text: &str) -> Result<Compiled, CompileError>;

    /// Decode the record at the start of `bytes`
    fn decode(&self, bytes: &[u8]) -> Result<Decoded, DecodeError>;
}

/// Encode literal text as a comment pass-through record
pub fn encode_comment(text: &str) -> Vec<u8> {
    let len = text.len();
    let mut record = Vec::with_capacity(len + COMMENT_OVERHEAD);
    record.push((len + 3) as u8);
    record.push(COMMENT_OPCODE);
    record.push((len + 1) as u8);
    record.extend_from_slice(text.as_bytes());
    record.push(0);
    record.push((len + 3) as u8);
    record
}

struct CommandDef {
    opcode: u8,
    name: &'static str,
    params: &'static [ArgKind],
}

const COMMANDS: &[CommandDef] = &[
    CommandDef { opcode: 0, name: "END", params: &[] },
    CommandDef { opcode: 1, name: "DIE", params: &[] },
    CommandDef { opcode: 2, name: "WAIT", params: &[ArgKind::Number] },
    CommandDef { opcode: 3, name: "CYCLE", params: &[ArgKind::Number] },
    CommandDef { opcode: 5, name: "CHAR", params: &[ArgKind::Character] },
    CommandDef { opcode: 6, name: "COLOR", params: &[ArgKind::Color] },
    CommandDef { opcode: 22, name: "SET", params: &[ArgKind::Word, ArgKind::Number] },
    CommandDef { opcode: 23, name: "INC", params: &[ArgKind::Word, ArgKind::Number] },
    CommandDef { opcode: 24, name: "DEC", params: &[ArgKind::Word, ArgKind::Number] },
    CommandDef { opcode: 36, name: "GOTO", params: &[ArgKind::Word] },
    CommandDef { opcode: 38, name: "SEND", params: &[ArgKind::Word, ArgKind::Word] },
    CommandDef { opcode: BLANK_OPCODE, name: "", params: &[] },
    CommandDef { opcode: 103, name: "*", params: &[ArgKind::Str] },
    CommandDef { opcode: 106, name: ":", params: &[ArgKind::Word] },
    CommandDef { opcode: COMMENT_OPCODE, name: ".", params: &[ArgKind::Str] },
];

fn command_by_name(name: &str) -> Option<&'static CommandDef> {
    COMMANDS
        .iter()
        .find(|def| !def.name.is_empty() && def.name.eq_ignore_ascii_case(name))
}

fn command_by_opcode(opcode: u8) -> Option<&'static CommandDef> {
    COMMANDS.iter().find(|def| def.opcode == opcode)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Bare(String),
    Quoted(String),
    Char(char),
}

impl Token {
    fn as_source(&self) -> String {
        match self {
            Token::Bare(s) => s.clone(),
            Token::Quoted(s) => format!("\"{}\"", s),
            Token::Char(c) => format!("'{}'", c),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, CompileError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&ch) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }

        match ch {
            '"' => {
                chars.next();
                let mut text = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some(c) => text.push(c),
                        None => return Err(CompileError::UnterminatedString),
                    }
                }
                tokens.push(Token::Quoted(text));
            }
            '\'' => {
                chars.next();
                let c = chars.next().ok_or(CompileError::UnterminatedString)?;
                if chars.next() != Some('\'') {
                    return Err(CompileError::UnterminatedString);
                }
                tokens.push(Token::Char(c));
            }
            _ => {
                let mut text = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() {
                        break;
                    }
                    text.push(c);
                    chars.next();
                }
                tokens.push(Token::Bare(text));
            }
        }
    }

    Ok(tokens)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Value {
    Number(i16),
    Text(String),
}

fn is_identifier(word: &str) -> bool {
    !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '.')
}

fn render_value(kind: ArgKind, value: &Value) -> String {
    match (kind, value) {
        (ArgKind::Character, Value::Number(n)) => {
            let code = *n as u16;
            if (32..127).contains(&code) && code != b'\'' as u16 {
                format!("'{}'", code as u8 as char)
            } else {
                code.to_string()
            }
        }
        (ArgKind::Color, Value::Number(n)) => {
            let color = *n as u16;
            if color <= MAX_COLOR {
                print_color(color)
            } else {
                n.to_string()
            }
        }
        (_, Value::Number(n)) => n.to_string(),
        (ArgKind::Word, Value::Text(s)) if is_identifier(s) => s.clone(),
        (_, Value::Text(s)) => format!("\"{}\"", s),
    }
}

fn render_line(def: &CommandDef, values: &[Value]) -> String {
    let mut line = String::from(def.name);
    for (kind, value) in def.params.iter().zip(values) {
        line.push(' ');
        line.push_str(&render_value(*kind, value));
    }
    line
}

fn encode_record(opcode: u8, values: &[Value]) -> Result<Vec<u8>, CompileError> {
    let mut body = vec![opcode];
    for value in values {
        match value {
            Value::Number(n) => {
                body.push(0);
                body.extend_from_slice(&n.to_le_bytes());
            }
            Value::Text(s) => {
                let len = s.len() + 1;
                if len > u8::MAX as usize {
                    return Err(CompileError::TooLong);
                }
                body.push(len as u8);
                body.extend_from_slice(s.as_bytes());
                body.push(0);
            }
        }
    }

    if body.len() > u8::MAX as usize {
        return Err(CompileError::TooLong);
    }

    let len = body.len() as u8;
    let mut record = Vec::with_capacity(body.len() + 2);
    record.push(len);
    record.extend_from_slice(&body);
    record.push(len);
    Ok(record)
}

fn parse_number(token: &str) -> Option<i16> {
    if let Some(hex) = token.strip_prefix('$') {
        return u16::from_str_radix(hex, 16).ok().map(|n| n as i16);
    }
    token.parse::<i16>().ok()
}

/// Reference robot assembler
#[derive(Debug, Clone, Copy, Default)]
pub struct RobotCodec;

impl RobotCodec {
    pub fn new() -> Self {
        Self
    }

    fn parse_arg(
        def: &CommandDef,
        kind: ArgKind,
        token: &Token,
    ) -> Result<Value, CompileError> {
        let invalid = || CompileError::InvalidArgument {
            command: def.name,
            token: token.as_source(),
        };

        match (kind, token) {
            (ArgKind::Number, Token::Bare(s)) => parse_number(s).map(Value::Number).ok_or_else(invalid),
            (ArgKind::Character, Token::Char(c)) if (*c as u32) < 256 => {
                Ok(Value::Number(*c as u32 as i16))
            }
            (ArgKind::Character, Token::Bare(s)) => match s.parse::<u8>() {
                Ok(code) => Ok(Value::Number(code as i16)),
                Err(_) => Err(invalid()),
            },
            (ArgKind::Color, Token::Bare(s)) => parse_color(s)
                .map(|c| Value::Number(c as i16))
                .ok_or_else(invalid),
            (ArgKind::Word, Token::Bare(s)) | (ArgKind::Word, Token::Quoted(s)) => {
                Ok(Value::Text(s.clone()))
            }
            (ArgKind::Str, Token::Quoted(s)) | (ArgKind::Str, Token::Bare(s)) => {
                Ok(Value::Text(s.clone()))
            }
            _ => Err(invalid()),
        }
    }

    fn compile_comment(rest: &str) -> Result<Compiled, CompileError> {
        let rest = rest.trim();
        let payload = if rest.len() >= 2 && rest.starts_with('"') && rest.ends_with('"') {
            &rest[1..rest.len() - 1]
        } else {
            rest
        };

        let bytecode = encode_record(COMMENT_OPCODE, &[Value::Text(payload.into())])?;
        Ok(Compiled {
            bytecode,
            display: format!(". \"{}\"", payload),
            arg_types: vec![ArgKind::Str],
        })
    }
}

impl Codec for RobotCodec {
    fn compile(&self, text: &str) -> Result<Compiled, CompileError> {
        let trimmed = text.trim();

        if trimmed.is_empty() {
            return Ok(Compiled {
                bytecode: BLANK_LINE.to_vec(),
                display: String::new(),
                arg_types: Vec::new(),
            });
        }

        if let Some(rest) = trimmed.strip_prefix('.') {
            return Self::compile_comment(rest);
        }

        // Symbol commands may be glued to their argument (`*"hi"`, `:start`)
        let (name, rest) = match trimmed.chars().next() {
            Some(sym @ ('*' | ':')) => (sym.to_string(), &trimmed[1..]),
            _ => {
                let end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
                (trimmed[..end].to_string(), &trimmed[end..])
            }
        };

        let def = command_by_name(&name).ok_or_else(|| CompileError::UnknownCommand(name.clone()))?;
        let tokens = tokenize(rest)?;

        if tokens.len() > def.params.len() {
            return Err(CompileError::TrailingInput {
                command: def.name,
                token: tokens[def.params.len()].as_source(),
            });
        }

        let mut values = Vec::with_capacity(def.params.len());
        for (index, kind) in def.params.iter().enumerate() {
            let token = tokens.get(index).ok_or(CompileError::MissingArgument {
                command: def.name,
                index: index + 1,
            })?;
            values.push(Self::parse_arg(def, *kind, token)?);
        }

        Ok(Compiled {
            bytecode: encode_record(def.opcode, &values)?,
            display: render_line(def, &values),
            arg_types: def.params.to_vec(),
        })
    }

    fn decode(&self, bytes: &[u8]) -> Result<Decoded, DecodeError> {
        let len = match bytes.first() {
            None => return Err(DecodeError::Malformed),
            Some(0) => return Err(DecodeError::EndOfProgram),
            Some(&len) => len as usize,
        };

        if bytes.len() < len + 2 || bytes[len + 1] as usize != len {
            return Err(DecodeError::Malformed);
        }

        let body = &bytes[1..=len];
        let def = command_by_opcode(body[0]).ok_or(DecodeError::Malformed)?;

        let mut values = Vec::with_capacity(def.params.len());
        let mut pos = 1;
        for kind in def.params {
            let marker = *body.get(pos).ok_or(DecodeError::Malformed)? as usize;
            match kind {
                ArgKind::Number | ArgKind::Character | ArgKind::Color => {
                    if marker != 0 || pos + 3 > body.len() {
                        return Err(DecodeError::Malformed);
                    }
                    values.push(Value::Number(i16::from_le_bytes([body[pos + 1], body[pos + 2]])));
                    pos += 3;
                }
                ArgKind::Word | ArgKind::Str => {
                    let end = pos + 1 + marker;
                    if marker == 0 || end > body.len() || body[end - 1] != 0 {
                        return Err(DecodeError::Malformed);
                    }
                    let text = String::from_utf8_lossy(&body[pos + 1..end - 1]).into_owned();
                    values.push(Value::Text(text));
                    pos = end;
                }
            }
        }

        if pos != body.len() {
            return Err(DecodeError::Malformed);
        }

        let display = match (def.opcode, values.first()) {
            (COMMENT_OPCODE, Some(Value::Text(payload))) => format!(". \"{}\"", payload),
            _ => render_line(def, &values),
        };

        Ok(Decoded {
            display,
            consumed: len + 2,
            arg_types: def.params.to_vec(),
        })
    }
}
