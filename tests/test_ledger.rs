//! Sidecar ledger invariants: append-only preservation, tolerant reads,
//! and cross-writer coordination through the lockfile.

mod common;

use anyhow::Result;

use common::TestWorkspace;
use warden::ledger::{append_with_lock, DecisionLog, JsonlReader};
use warden::types::{CommandClass, Decision, DecisionOutcome};

// Every append preserves all prior bytes exactly.
#[test]
fn appends_preserve_prior_lines_byte_for_byte() -> Result<()> {
    let ws = TestWorkspace::new();
    let path = &ws.paths.trace_file;

    append_with_lock(path, "{\"seq\":1}\n")?;
    let after_first = std::fs::read(path)?;

    append_with_lock(path, "{\"seq\":2}\n")?;
    let after_second = std::fs::read(path)?;

    assert_eq!(&after_second[..after_first.len()], &after_first[..]);
    assert_eq!(
        &after_second[after_first.len()..],
        "{\"seq\":2}\n".as_bytes()
    );
    Ok(())
}

// Concurrent writers through the lockfile never tear each other's lines.
#[test]
fn parallel_writers_produce_whole_lines() -> Result<()> {
    let ws = TestWorkspace::new();
    let path = ws.paths.decisions_file.clone();

    let handles: Vec<_> = (0..8)
        .map(|writer| {
            let path = path.clone();
            std::thread::spawn(move || {
                for seq in 0..10 {
                    let line = format!("{{\"writer\":{writer},\"seq\":{seq}}}\n");
                    append_with_lock(&path, &line).expect("append should succeed");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("writer thread should finish");
    }

    let reader = JsonlReader::open(&path)?;
    assert_eq!(reader.line_count(), 80);
    let parsed: Vec<serde_json::Value> = reader.entries();
    assert_eq!(parsed.len(), 80, "every line must be whole JSON");
    Ok(())
}

// A torn or corrupt line is skipped by readers, not fatal, and does not
// hide the well-formed entries around it.
#[test]
fn readers_skip_unparseable_lines() -> Result<()> {
    let ws = TestWorkspace::new();
    let log = DecisionLog::new(ws.paths.decisions_file.clone());

    log.append(
        &Decision::new("execute_command", DecisionOutcome::Approved, "destructive_command")
            .with_intent("INT-1")
            .with_command("rm tmp", CommandClass::Destructive),
    )?;
    append_with_lock(&ws.paths.decisions_file, "{\"torn\": tru")?;
    append_with_lock(&ws.paths.decisions_file, "\n")?;
    log.append(
        &Decision::new("write_file", DecisionOutcome::Rejected, "scope_violation")
            .with_intent("INT-1"),
    )?;

    let entries = log.entries()?;
    assert_eq!(entries.len(), 2);
    assert!(log.has_command_approval("execute_command", "rm tmp", "INT-1")?);
    Ok(())
}
