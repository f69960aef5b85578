//! The lessons-learned post-hook.
//!
//! Runs after every tool call with no tool filter. When the session
//! carries a pending verification failure (recorded by the optimistic
//! lock), it is appended to the shared knowledge file and cleared; with
//! nothing pending the hook is a no-op.

use async_trait::async_trait;

use warden_hooks::{Hook, HookPhase, PostHookOutcome, ToolResult};
use warden_ledger::LessonsLog;
use warden_types::{SessionState, ToolCall, WardenError};

/// Post-hook flushing verification failures into the knowledge file.
pub struct LessonsHook {
    log: LessonsLog,
}

impl LessonsHook {
    pub fn new(log: LessonsLog) -> Self {
        Self { log }
    }
}

#[async_trait]
impl Hook for LessonsHook {
    fn name(&self) -> &str {
        "lessons-learned"
    }

    fn phase(&self) -> HookPhase {
        HookPhase::Post
    }

    async fn run_post(
        &self,
        session: &mut SessionState,
        _call: &ToolCall,
        _result: &ToolResult,
    ) -> Result<PostHookOutcome, WardenError> {
        let failure = match &session.last_verification_failure {
            Some(failure) => failure.clone(),
            None => return Ok(PostHookOutcome::ok()),
        };

        match self.log.append_failure(&failure) {
            Ok(()) => {
                // Cleared only once the lesson actually landed.
                session.last_verification_failure = None;
                Ok(PostHookOutcome::ok_with_side_effect(format!(
                    "lesson recorded for {}",
                    failure.path
                )))
            }
            Err(err) => Ok(PostHookOutcome::failed(format!(
                "failed to append lesson: {err}"
            ))),
        }
    }
}
