//! The append-only HITL decision ledger.
//!
//! Every prompt result is appended here. The gate consults the ledger
//! before prompting again: a persisted approval for the same
//! `(tool, command, intent_id)` triple is reused across turns and across
//! sessions without re-prompting.

use std::path::{Path, PathBuf};

use warden_types::{Decision, DecisionOutcome};

use crate::append::append_with_lock;
use crate::jsonl::JsonlReader;

/// Writer/query handle for `intent-decisions.jsonl`.
pub struct DecisionLog {
    path: PathBuf,
}

impl DecisionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one decision as a JSON line under the sidecar lock.
    pub fn append(&self, decision: &Decision) -> std::io::Result<()> {
        let mut line = serde_json::to_string(decision).map_err(std::io::Error::other)?;
        line.push('\n');
        append_with_lock(&self.path, &line)
    }

    /// Whether an approval is on record for this command under this intent.
    ///
    /// A later rejection for the identical triple revokes the reuse: the
    /// newest matching record wins.
    pub fn has_command_approval(
        &self,
        tool: &str,
        command: &str,
        intent_id: &str,
    ) -> std::io::Result<bool> {
        let reader = JsonlReader::open(&self.path)?;
        let newest = reader
            .entries::<Decision>()
            .into_iter()
            .rev()
            .find(|d| {
                d.tool == tool
                    && d.command.as_deref() == Some(command)
                    && d.intent_id.as_deref() == Some(intent_id)
            });
        Ok(newest.is_some_and(|d| d.decision == DecisionOutcome::Approved))
    }

    /// All persisted decisions, oldest first, unparseable lines skipped.
    pub fn entries(&self) -> std::io::Result<Vec<Decision>> {
        Ok(JsonlReader::open(&self.path)?.entries())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_types::CommandClass;

    fn log(dir: &tempfile::TempDir) -> DecisionLog {
        DecisionLog::new(dir.path().join("intent-decisions.jsonl"))
    }

    #[test]
    fn approval_is_found_for_exact_triple() {
        let dir = tempfile::tempdir().unwrap();
        let log = log(&dir);
        log.append(
            &Decision::new("execute_command", DecisionOutcome::Approved, "destructive_command")
                .with_intent("INT-1")
                .with_command("rm tmp", CommandClass::Destructive),
        )
        .unwrap();

        assert!(log.has_command_approval("execute_command", "rm tmp", "INT-1").unwrap());
        assert!(!log.has_command_approval("execute_command", "rm tmp", "INT-2").unwrap());
        assert!(!log.has_command_approval("execute_command", "rm other", "INT-1").unwrap());
    }

    #[test]
    fn newest_record_wins() {
        let dir = tempfile::tempdir().unwrap();
        let log = log(&dir);
        log.append(
            &Decision::new("execute_command", DecisionOutcome::Approved, "destructive_command")
                .with_intent("INT-1")
                .with_command("rm tmp", CommandClass::Destructive),
        )
        .unwrap();
        log.append(
            &Decision::new("execute_command", DecisionOutcome::Rejected, "destructive_command")
                .with_intent("INT-1")
                .with_command("rm tmp", CommandClass::Destructive),
        )
        .unwrap();

        assert!(!log.has_command_approval("execute_command", "rm tmp", "INT-1").unwrap());
    }

    #[test]
    fn missing_file_means_no_approvals() {
        let dir = tempfile::tempdir().unwrap();
        let log = log(&dir);
        assert!(!log.has_command_approval("execute_command", "rm tmp", "INT-1").unwrap());
        assert!(log.entries().unwrap().is_empty());
    }
}
