//! Integration tests for the robot editor
//!
//! These tests drive complete sessions through ex commands, with programs
//! stored in and imported from real files.

use std::fs;
use std::path::PathBuf;

use robot_editor::{
    CloseOutcome, Editor, EditorAction, EditorError, EditorSettings, IoError,
    MemoryClipboard, NoClipboard, ProgramStorage,
};

/// Program storage backed by one file
struct FileStorage {
    path: PathBuf,
}

impl ProgramStorage for FileStorage {
    fn load(&self) -> Result<Vec<u8>, IoError> {
        match fs::read(&self.path) {
            Ok(data) => Ok(data),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(IoError::StorageError(err.to_string())),
        }
    }

    fn store(&mut self, program: &[u8]) -> Result<(), IoError> {
        fs::write(&self.path, program).map_err(|err| IoError::StorageError(err.to_string()))
    }
}

fn session(path: &PathBuf) -> Editor {
    Editor::open(
        Box::new(FileStorage { path: path.clone() }),
        Box::new(NoClipboard),
        EditorSettings::new(),
    )
    .unwrap()
}

#[test]
fn test_edit_close_and_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("robot.prog");

    let mut editor = session(&path);
    for text in ["wait 5", "set counter 1", "end"] {
        editor.core_mut().insert_at_cursor(text).unwrap();
    }
    let result = editor.execute("wq").unwrap();
    assert_eq!(
        result,
        EditorAction::Closed(CloseOutcome {
            program_size: 2 + 6 + 15 + 3,
            dropped_lines: 0
        })
    );

    let reopened = session(&path);
    assert_eq!(reopened.lines(), vec!["WAIT 5", "SET counter 1", "END"]);
}

#[test]
fn test_unresolved_lines_block_quit() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("robot.prog");

    let mut editor = session(&path);
    editor.core_mut().insert_at_cursor("wait 1").unwrap();
    editor.core_mut().insert_at_cursor("not a command").unwrap();

    assert!(matches!(
        editor.execute("q"),
        Err(EditorError::UnresolvedLines(1))
    ));
    assert!(!path.exists());

    editor.execute("validate comment").unwrap();
    editor.execute("q").unwrap();

    let reopened = session(&path);
    assert_eq!(reopened.lines(), vec!["WAIT 1", ". \"not a command\""]);
}

#[test]
fn test_export_then_import_text() {
    let dir = tempfile::tempdir().unwrap();
    let mut editor = session(&dir.path().join("a.prog"));
    for text in ["wait 2", "die"] {
        editor.core_mut().insert_at_cursor(text).unwrap();
    }

    let target = dir.path().join("listing");
    editor
        .execute(&format!("export {}", target.display()))
        .unwrap();
    let written = dir.path().join("listing.txt");
    assert_eq!(fs::read_to_string(&written).unwrap(), "WAIT 2\nDIE\n\n");

    let mut other = session(&dir.path().join("b.prog"));
    other
        .execute(&format!("import {}", written.display()))
        .unwrap();
    assert_eq!(other.lines(), vec!["WAIT 2", "DIE", "", ""]);
    assert_eq!(other.status_message(), "Imported 3 line(s)");
}

#[test]
fn test_export_block_as_bytecode_then_import() {
    let dir = tempfile::tempdir().unwrap();
    let mut editor = session(&dir.path().join("a.prog"));
    for text in ["wait 2", "die", "end"] {
        editor.core_mut().insert_at_cursor(text).unwrap();
    }
    editor.execute("goto 2").unwrap();
    editor.execute("mark start").unwrap();
    editor.execute("goto 3").unwrap();
    editor.execute("mark end").unwrap();

    let target = dir.path().join("block");
    editor
        .execute(&format!("export {} block bc", target.display()))
        .unwrap();
    let written = dir.path().join("block.bc");
    assert_eq!(fs::read(&written).unwrap(), vec![0xFF, 1, 1, 1, 1, 0, 1, 0]);

    let mut other = session(&dir.path().join("b.prog"));
    let summary = other.import_file(&written).unwrap();
    assert_eq!(summary.inserted, 2);
    assert_eq!(other.lines(), vec!["DIE", "END", ""]);
}

#[test]
fn test_truncated_bytecode_import_inserts_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.BC");
    fs::write(&path, [0xFF, 1, 0, 1, 4, 2, 5]).unwrap();

    let mut editor = session(&dir.path().join("a.prog"));
    let result = editor.import_file(&path);
    assert!(matches!(
        result,
        Err(EditorError::Io(IoError::MalformedImport(_)))
    ));
    assert_eq!(editor.lines(), vec![""]);
}

#[test]
fn test_search_replace_session() {
    let dir = tempfile::tempdir().unwrap();
    let mut editor = session(&dir.path().join("a.prog"));
    for text in ["wait 1", "cycle 1", "wait 1"] {
        editor.core_mut().insert_at_cursor(text).unwrap();
    }
    // Cursor sits on the trailing blank line, so the pass wraps to line 1
    editor.execute("replaceall wait/cycle").unwrap();
    assert_eq!(editor.status_message(), "Replaced 2 occurrence(s)");
    assert_eq!(editor.lines(), vec!["CYCLE 1", "CYCLE 1", "CYCLE 1", ""]);

    editor.execute("find nothing here").unwrap();
    assert_eq!(editor.status_message(), "Not found");
}

#[test]
fn test_paste_from_host_clipboard() {
    let dir = tempfile::tempdir().unwrap();
    let mut editor = Editor::open(
        Box::new(FileStorage {
            path: dir.path().join("a.prog"),
        }),
        Box::new(MemoryClipboard::with_text("wait 3\r\nend\r\n")),
        EditorSettings::new(),
    )
    .unwrap();

    editor.execute("paste").unwrap();
    assert_eq!(editor.lines(), vec!["WAIT 3", "END", ""]);
}

#[test]
fn test_macro_command_expands_from_settings() {
    let settings = robot_editor::deserialize_settings(
        br#"{
            "version": 1,
            "macros": [{
                "name": "pause",
                "groups": [{
                    "kind": {"type": "number", "min": 1, "max": 99},
                    "variables": [{"name": "t", "default": 4}]
                }],
                "lines": ["wait !t!", "wait !t!"]
            }]
        }"#,
    )
    .unwrap();
    let dir = tempfile::tempdir().unwrap();
    let mut editor = Editor::open(
        Box::new(FileStorage {
            path: dir.path().join("a.prog"),
        }),
        Box::new(NoClipboard),
        settings,
    )
    .unwrap();

    editor.execute("macro pause(150)").unwrap();
    assert_eq!(editor.lines(), vec!["WAIT 99", "WAIT 99", ""]);
}
