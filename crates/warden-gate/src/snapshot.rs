//! The snapshot pre-hook: pre-mutation content capture.
//!
//! Runs for every mutating tool after the gate has allowed the call. For
//! each target path it records what was on disk -- text content, existence,
//! and whether the bytes look binary -- keyed by the tool-call id. The
//! trace writer consumes the snapshots for range attribution; the
//! optimistic lock compares against them before any write lands.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use warden_hooks::{Hook, HookPhase, PreHookOutcome};
use warden_policy::ToolCatalog;
use warden_types::session::Snapshot;
use warden_types::{SessionState, ToolCall, WardenError};

use crate::paths::extract_targets;

/// Read one path into a snapshot record.
///
/// A file is binary iff any byte is `0x00`; binary files are captured
/// without text so they are attributed by whole-file hash only and never
/// declared stale by text comparison.
pub fn capture(path: &Path) -> Snapshot {
    match std::fs::read(path) {
        Ok(bytes) => {
            if bytes.contains(&0) {
                Snapshot {
                    before: None,
                    existed: true,
                    binary: true,
                }
            } else {
                Snapshot {
                    before: Some(String::from_utf8_lossy(&bytes).into_owned()),
                    existed: true,
                    binary: false,
                }
            }
        }
        Err(_) => Snapshot {
            before: None,
            existed: false,
            binary: false,
        },
    }
}

/// Pre-hook capturing snapshots for mutating tools.
pub struct SnapshotHook {
    catalog: Arc<ToolCatalog>,
}

impl SnapshotHook {
    pub fn new(catalog: Arc<ToolCatalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Hook for SnapshotHook {
    fn name(&self) -> &str {
        "snapshot"
    }

    fn phase(&self) -> HookPhase {
        HookPhase::Pre
    }

    fn applies_to(&self, tool: &str) -> bool {
        self.catalog.is_mutating(tool)
    }

    async fn run_pre(
        &self,
        session: &mut SessionState,
        call: &mut ToolCall,
    ) -> Result<PreHookOutcome, WardenError> {
        if call.partial {
            return Ok(PreHookOutcome::proceed());
        }

        let working_dir = session.working_dir.clone();
        for target in extract_targets(&call.args, &working_dir) {
            let on_disk = working_dir.join(&target);
            let snapshot = capture(&on_disk);
            tracing::debug!(
                call = %call.id,
                path = %target,
                existed = snapshot.existed,
                binary = snapshot.binary,
                "captured snapshot"
            );
            session.put_snapshot(&call.id, target, snapshot);
        }

        Ok(PreHookOutcome::proceed())
    }
}
