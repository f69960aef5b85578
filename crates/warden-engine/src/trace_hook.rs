//! The trace-writer post-hook.
//!
//! After every successful mutating call, assembles one trace entry --
//! resolved intent and mutation class, sanitized params, per-file content
//! hashes, and added-line ranges diffed against the snapshots -- and
//! appends it to the trace ledger. Writer failures are reported in the
//! post-hook sweep but never fail the tool call.

use std::sync::Arc;

use async_trait::async_trait;

use warden_gate::paths::extract_targets;
use warden_hooks::{Hook, HookPhase, PostHookOutcome, ToolResult};
use warden_ledger::TraceLog;
use warden_policy::ToolCatalog;
use warden_types::{MutationClass, SessionState, ToolCall, WardenError};

/// Post-hook appending trace entries for mutating tools.
pub struct TraceWriterHook {
    catalog: Arc<ToolCatalog>,
    log: Arc<TraceLog>,
}

impl TraceWriterHook {
    pub fn new(catalog: Arc<ToolCatalog>, log: Arc<TraceLog>) -> Self {
        Self { catalog, log }
    }
}

#[async_trait]
impl Hook for TraceWriterHook {
    fn name(&self) -> &str {
        "trace-writer"
    }

    fn phase(&self) -> HookPhase {
        HookPhase::Post
    }

    fn applies_to(&self, tool: &str) -> bool {
        self.catalog.is_mutating(tool)
    }

    async fn run_post(
        &self,
        session: &mut SessionState,
        call: &ToolCall,
        result: &ToolResult,
    ) -> Result<PostHookOutcome, WardenError> {
        // Snapshots are consumed either way; a failed call must not leak
        // them into the next call with the same id.
        let snapshots = session.take_snapshots(&call.id);

        if !result.success {
            tracing::debug!(call = %call.id, "skipping trace for failed call");
            return Ok(PostHookOutcome::ok());
        }

        let intent_id = call
            .args
            .intent_id()
            .map(String::from)
            .or_else(|| session.active_intent.as_ref().map(|a| a.id.clone()));
        let mutation_class = match call.args.mutation_class() {
            Some(Ok(class)) => Some(class),
            Some(Err(_)) | None => Some(MutationClass::IntentEvolution),
        };

        let working_dir = session.working_dir.clone();
        let files: Vec<(String, Vec<u8>)> = extract_targets(&call.args, &working_dir)
            .into_iter()
            .filter_map(|target| {
                std::fs::read(working_dir.join(&target))
                    .ok()
                    .map(|bytes| (target, bytes))
            })
            .collect();

        let entry = self
            .log
            .build_entry(call, intent_id, mutation_class, &files, &snapshots);

        match self.log.append(&entry) {
            Ok(()) => Ok(PostHookOutcome::ok_with_side_effect(format!(
                "trace entry {} appended",
                entry.id
            ))),
            Err(err) => Ok(PostHookOutcome::failed(format!(
                "failed to append trace entry: {err}"
            ))),
        }
    }
}
