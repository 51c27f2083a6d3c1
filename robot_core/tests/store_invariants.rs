//! Property-based invariant tests for the line store.
//!
//! These tests verify structural invariants that must hold after any
//! sequence of edits:
//!
//! 1. The running size equals the sum of every line's bytecode length.
//! 2. The program never grows past its capacity.
//! 3. The line count matches the linked lines and never drops to zero.
//! 4. The cursor line number matches the cursor's position.
//! 5. Mark endpoints stay ordered and agree with their line numbers.
//! 6. Flattening produces exactly the accounted number of bytes.
//! 7. Reopening a flattened program reproduces it byte for byte.

use proptest::prelude::*;
use robot_core::{
    Disposition, EditCommand, EditorConfig, EditorCore, LineStore, MoveFocus, Relation,
    PROGRAM_FRAMING,
};

// ── Helpers ─────────────────────────────────────────────────────────────

const TEXTS: &[&str] = &[
    "end",
    "wait 5",
    "set counter 10",
    "bogus line",
    "",
    ". \"note\"",
    "* \"hello there\"",
    "goto \"far away\"",
];

#[derive(Debug, Clone)]
enum Op {
    InsertBefore(usize),
    InsertAfter(usize),
    SetLine(usize),
    Delete(bool),
    Move(i8),
    MarkBegin,
    MarkEnd,
    Unmark,
    Clear,
    Cut,
    Classify(u8),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..TEXTS.len()).prop_map(Op::InsertBefore),
        (0..TEXTS.len()).prop_map(Op::InsertAfter),
        (0..TEXTS.len()).prop_map(Op::SetLine),
        any::<bool>().prop_map(Op::Delete),
        (-6i8..=6).prop_map(Op::Move),
        Just(Op::MarkBegin),
        Just(Op::MarkEnd),
        Just(Op::Unmark),
        Just(Op::Clear),
        Just(Op::Cut),
        (0u8..3).prop_map(Op::Classify),
    ]
}

fn run(core: &mut EditorCore, op: &Op) {
    core.begin_command();
    let cursor = core.store().cursor();
    match op {
        Op::InsertBefore(i) => {
            let _ = core.insert(cursor, TEXTS[*i], Relation::Before);
        }
        Op::InsertAfter(i) => {
            let _ = core.insert(cursor, TEXTS[*i], Relation::After);
        }
        Op::SetLine(i) => {
            let _ = core.update(cursor, TEXTS[*i]);
        }
        Op::Delete(next) => {
            let focus = if *next { MoveFocus::Next } else { MoveFocus::Previous };
            core.delete(cursor, focus);
        }
        Op::Move(count) => core.store_mut().move_cursor(*count as isize),
        Op::MarkBegin => core.store_mut().mark_begin(),
        Op::MarkEnd => core.store_mut().mark_end(),
        Op::Unmark => core.store_mut().unmark(),
        Op::Clear => {
            core.store_mut().clear_block();
        }
        Op::Cut => {
            core.apply(EditCommand::CutBlock);
        }
        Op::Classify(choice) => {
            let disposition = match choice {
                0 => Disposition::Ignore,
                1 => Disposition::Delete,
                _ => Disposition::Comment,
            };
            let _ = core.set_validity(cursor, disposition);
        }
    }
}

fn check_invariants(store: &LineStore) -> Result<(), TestCaseError> {
    let lines: Vec<_> = store.iter().collect();

    let summed: usize = lines.iter().map(|(_, line)| line.bytecode_length()).sum();
    prop_assert_eq!(store.total_size(), summed, "running size drifted");
    prop_assert!(store.program_size() <= store.max_size(), "over capacity");
    prop_assert_eq!(store.program_size(), store.total_size() + PROGRAM_FRAMING);

    prop_assert_eq!(store.line_count(), lines.len());
    prop_assert!(store.line_count() >= 1, "store emptied");

    let cursor_pos = lines
        .iter()
        .position(|(id, _)| *id == store.cursor())
        .map(|pos| pos + 1);
    prop_assert_eq!(cursor_pos, Some(store.cursor_line()), "cursor line number drifted");

    if let Some(mark) = store.mark() {
        prop_assert!(mark.start_line <= mark.end_line, "mark out of order");
        let start_pos = lines.iter().position(|(id, _)| *id == mark.start).map(|p| p + 1);
        let end_pos = lines.iter().position(|(id, _)| *id == mark.end).map(|p| p + 1);
        prop_assert_eq!(start_pos, Some(mark.start_line), "mark start drifted");
        prop_assert_eq!(end_pos, Some(mark.end_line), "mark end drifted");
    }

    let trimmed = match lines.last() {
        Some((_, line)) if line.is_blank() => line.bytecode_length(),
        _ => 0,
    };
    prop_assert_eq!(store.flatten().len(), store.program_size() - trimmed);
    Ok(())
}

// ═════════════════════════════════════════════════════════════════════════
// 1-6. Structural invariants after every edit
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn invariants_hold_after_every_edit(ops in proptest::collection::vec(op(), 1..60)) {
        let mut core = EditorCore::new();
        check_invariants(core.store())?;
        for op in &ops {
            run(&mut core, op);
            check_invariants(core.store())?;
        }
    }

    #[test]
    fn invariants_hold_near_capacity(ops in proptest::collection::vec(op(), 1..80)) {
        let config = EditorConfig {
            max_size: 64,
            default_invalid: Disposition::Comment,
            ..EditorConfig::default()
        };
        let mut core = EditorCore::with_config(config);
        for op in &ops {
            run(&mut core, op);
            check_invariants(core.store())?;
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 7. Flatten / open round trip
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn reopen_reproduces_program(ops in proptest::collection::vec(op(), 1..40)) {
        let mut core = EditorCore::new();
        for op in &ops {
            run(&mut core, op);
        }
        let program = core.flatten();

        let mut reopened = EditorCore::new();
        let loaded = reopened.open(&program);
        check_invariants(reopened.store())?;
        if program.len() == PROGRAM_FRAMING {
            // Nothing to load: the editor seeds one blank line
            prop_assert_eq!(loaded, 1);
            prop_assert!(reopened.store().iter().all(|(_, line)| line.is_blank()));
            return Ok(());
        }
        prop_assert_eq!(reopened.store().program_size(), program.len());

        // Records come back verbatim; a trailing blank line may be trimmed
        // again on the next flatten, so compare the raw records
        let mut rebuilt = vec![0xFF];
        for (_, line) in reopened.store().iter() {
            prop_assert!(line.validity().is_valid());
            rebuilt.extend_from_slice(&line.program_bytes());
        }
        rebuilt.push(0x00);
        prop_assert_eq!(rebuilt, program);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// Fixed scenarios
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn capacity_refusal_keeps_size() {
    let config = EditorConfig {
        max_size: 20,
        ..EditorConfig::default()
    };
    let mut core = EditorCore::with_config(config);
    let cursor = core.store().cursor();
    core.update(cursor, "set counter 1").unwrap();
    assert_eq!(core.store().program_size(), 17);

    let before = core.snapshot();
    assert!(core.insert(cursor, "wait 1", Relation::After).is_err());
    assert_eq!(core.snapshot(), before);
    assert!(core.insert(cursor, "end", Relation::After).is_ok());
    assert_eq!(core.store().program_size(), 20);
}

#[test]
fn replace_all_terminates_on_growing_matches() {
    let mut core = EditorCore::new();
    let first = core.store().cursor();
    core.update(first, ": aaa").unwrap();
    let mut anchor = first;
    for _ in 0..5 {
        anchor = core.insert(anchor, ": aaa", Relation::After).unwrap();
    }
    core.store_mut().goto_line(3);

    let summary = core.replace_all("a", "aa", Default::default());
    assert!(summary.replaced >= 6);
    assert!(summary.refused.is_none());
    for (_, line) in core.store().iter() {
        assert!(line.text().starts_with(": aa"));
    }
}
