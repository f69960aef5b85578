//! The abstract human-in-the-loop confirmation seam.
//!
//! The prompt mechanism is a single asynchronous call returning a boolean;
//! any frontend (modal dialog, CLI confirmation, test stub) can satisfy it.
//! Handlers receive enough context to render a meaningful prompt but no
//! ability to alter the call.

use async_trait::async_trait;

/// Context handed to the approval frontend for one prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct ApprovalRequest {
    /// Tag naming the gate check, e.g. `scope_violation` or
    /// `destructive_command`.
    pub reason: String,
    /// Human-readable one-line summary of what is being approved.
    pub summary: String,
    pub tool: String,
    pub targets: Vec<String>,
    pub command: Option<String>,
}

impl ApprovalRequest {
    pub fn new(reason: impl Into<String>, summary: impl Into<String>, tool: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            summary: summary.into(),
            tool: tool.into(),
            targets: Vec::new(),
            command: None,
        }
    }

    #[must_use]
    pub fn with_targets(mut self, targets: Vec<String>) -> Self {
        self.targets = targets;
        self
    }

    #[must_use]
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }
}

/// Asynchronous HITL confirmation.
///
/// `true` means approved. Implementations must not block the pipeline
/// indefinitely; a frontend that cannot reach the user should return
/// `false` (deny) rather than hang.
#[async_trait]
pub trait ApprovalHandler: Send + Sync {
    async fn confirm(&self, request: &ApprovalRequest) -> bool;
}

/// Approves every prompt. Test and unattended-pipeline use only.
#[derive(Debug, Default)]
pub struct ApproveAll;

#[async_trait]
impl ApprovalHandler for ApproveAll {
    async fn confirm(&self, _request: &ApprovalRequest) -> bool {
        true
    }
}

/// Denies every prompt.
#[derive(Debug, Default)]
pub struct DenyAll;

#[async_trait]
impl ApprovalHandler for DenyAll {
    async fn confirm(&self, _request: &ApprovalRequest) -> bool {
        false
    }
}

/// Replays a scripted sequence of answers, then denies.
///
/// Records every request it sees so tests can assert on prompt order and
/// content.
#[derive(Debug, Default)]
pub struct ScriptedApprovals {
    answers: std::sync::Mutex<std::collections::VecDeque<bool>>,
    seen: std::sync::Mutex<Vec<ApprovalRequest>>,
}

impl ScriptedApprovals {
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: std::sync::Mutex::new(answers.into_iter().collect()),
            seen: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// The requests observed so far, in prompt order.
    pub fn requests(&self) -> Vec<ApprovalRequest> {
        self.seen.lock().expect("approval log poisoned").clone()
    }

    /// How many prompts have fired.
    pub fn prompt_count(&self) -> usize {
        self.seen.lock().expect("approval log poisoned").len()
    }
}

#[async_trait]
impl ApprovalHandler for ScriptedApprovals {
    async fn confirm(&self, request: &ApprovalRequest) -> bool {
        self.seen
            .lock()
            .expect("approval log poisoned")
            .push(request.clone());
        self.answers
            .lock()
            .expect("approval script poisoned")
            .pop_front()
            .unwrap_or(false)
    }
}
