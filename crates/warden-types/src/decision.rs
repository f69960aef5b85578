//! Persisted HITL approve/reject outcomes.
//!
//! Every human-in-the-loop prompt appends one [`Decision`] to the
//! `intent-decisions.jsonl` sidecar and caches it on the session. Persisted
//! approvals for an identical `(tool, command, intent_id)` triple suppress
//! re-prompting on later turns, including turns in other sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classification::{CommandClass, UserIntentVerdict};

/// Whether the human approved or rejected the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionOutcome {
    Approved,
    Rejected,
}

/// One append-only HITL decision record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent_id: Option<String>,
    pub tool: String,
    pub decision: DecisionOutcome,
    /// Tag naming the check that prompted, e.g. `scope_violation` or
    /// `safe_command`.
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub targets: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_classification: Option<CommandClass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent_classification: Option<UserIntentVerdict>,
    pub timestamp: DateTime<Utc>,
}

impl Decision {
    /// Create a decision record stamped with the current time.
    pub fn new(
        tool: impl Into<String>,
        outcome: DecisionOutcome,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            intent_id: None,
            tool: tool.into(),
            decision: outcome,
            reason: reason.into(),
            targets: None,
            command: None,
            command_classification: None,
            intent_classification: None,
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_intent(mut self, intent_id: impl Into<String>) -> Self {
        self.intent_id = Some(intent_id.into());
        self
    }

    #[must_use]
    pub fn with_targets(mut self, targets: Vec<String>) -> Self {
        self.targets = Some(targets);
        self
    }

    #[must_use]
    pub fn with_command(mut self, command: impl Into<String>, class: CommandClass) -> Self {
        self.command = Some(command.into());
        self.command_classification = Some(class);
        self
    }

    #[must_use]
    pub fn with_intent_classification(mut self, verdict: UserIntentVerdict) -> Self {
        self.intent_classification = Some(verdict);
        self
    }

    pub fn approved(&self) -> bool {
        self.decision == DecisionOutcome::Approved
    }
}
