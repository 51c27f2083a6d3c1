//! Program storage and file import/export

use std::fs;
use std::path::{Path, PathBuf};

use robot_core::ExportFormat;
use thiserror::Error;

/// Shortest bytecode file worth decoding: prologue, one record, end marker
const MIN_BYTECODE_FILE: usize = 5;

const BYTECODE_PROLOGUE: u8 = 0xFF;

/// Program I/O error
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Malformed import: {0}")]
    MalformedImport(String),
}

impl IoError {
    fn from_std(path: &Path, err: std::io::Error) -> Self {
        let label = path.display().to_string();
        match err.kind() {
            std::io::ErrorKind::NotFound => IoError::NotFound(label),
            std::io::ErrorKind::PermissionDenied => IoError::PermissionDenied(label),
            _ => IoError::StorageError(format!("{}: {}", label, err)),
        }
    }
}

pub type IoResult<T> = Result<T, IoError>;

/// Where the edited program lives
///
/// `load` returns the flattened program the session starts from; `store`
/// receives the flattened program when the session closes.
pub trait ProgramStorage {
    fn load(&self) -> IoResult<Vec<u8>>;
    fn store(&mut self, program: &[u8]) -> IoResult<()>;
}

/// Program held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryProgramStorage {
    program: Vec<u8>,
    stores: usize,
}

impl MemoryProgramStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_program(program: Vec<u8>) -> Self {
        Self {
            program,
            stores: 0,
        }
    }

    pub fn program(&self) -> &[u8] {
        &self.program
    }

    /// Number of times a program was stored
    pub fn store_count(&self) -> usize {
        self.stores
    }
}

impl ProgramStorage for MemoryProgramStorage {
    fn load(&self) -> IoResult<Vec<u8>> {
        Ok(self.program.clone())
    }

    fn store(&mut self, program: &[u8]) -> IoResult<()> {
        self.program = program.to_vec();
        self.stores += 1;
        Ok(())
    }
}

/// Contents of an import file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportData {
    /// One entry per text line, terminators stripped
    Text(Vec<String>),
    /// Bytecode records following the prologue
    Bytecode(Vec<u8>),
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|found| found.to_str())
        .map(|found| found.eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

/// Read an import file; `.bc` (any case) is bytecode, anything else text
pub fn read_import(path: &Path) -> IoResult<ImportData> {
    let data = fs::read(path).map_err(|err| IoError::from_std(path, err))?;

    if !has_extension(path, "bc") {
        let text = String::from_utf8_lossy(&data);
        return Ok(ImportData::Text(text.lines().map(str::to_string).collect()));
    }

    if data.len() < MIN_BYTECODE_FILE {
        return Err(IoError::MalformedImport(format!(
            "{} is only {} bytes",
            path.display(),
            data.len()
        )));
    }
    match data.split_first() {
        Some((&BYTECODE_PROLOGUE, body)) => Ok(ImportData::Bytecode(body.to_vec())),
        _ => Err(IoError::MalformedImport(format!(
            "{} does not start with 0xFF",
            path.display()
        ))),
    }
}

/// Export destination with the format's extension appended if missing
pub fn export_path(path: &Path, format: ExportFormat) -> PathBuf {
    let ext = match format {
        ExportFormat::Text => "txt",
        ExportFormat::Bytecode => "bc",
    };
    if has_extension(path, ext) {
        return path.to_path_buf();
    }
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

/// Write exported bytes; returns the path actually written
pub fn write_export(path: &Path, format: ExportFormat, data: &[u8]) -> IoResult<PathBuf> {
    let target = export_path(path, format);
    fs::write(&target, data).map_err(|err| IoError::from_std(&target, err))?;
    Ok(target)
}
