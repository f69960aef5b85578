//! The structured veto envelope returned to the model when a gate blocks
//! a tool call.
//!
//! A [`Violation`] is the only error shape that crosses the middleware
//! boundary: pre-hook vetoes, stale-file failures, and denied HITL prompts
//! all serialize to this JSON envelope so the model can recover (re-read a
//! stale file, select a different intent, narrow scope).

use serde::{Deserialize, Serialize};

/// The taxonomy of governance failures.
///
/// Serialized as the `error_type` field of the envelope, in snake_case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// No intent id was supplied and none could be auto-selected.
    MissingIntent,
    /// A destructive tool ran without an active intent on the session.
    NoActiveIntent,
    /// The call's `intent_id` disagrees with the session's active intent.
    IntentMismatch,
    /// The call carries an unrecognized `mutation_class`.
    InvalidMetadata,
    /// A target path falls outside the active intent's owned scope.
    ScopeViolation,
    /// A mutating call whose target paths could not be determined.
    UnknownTargets,
    /// A destructive shell command was denied.
    CommandNotAuthorized,
    /// The user's message was classified destructive and the user declined.
    DestructiveIntentDenied,
    /// A delete/move payload was denied at the preflight prompt.
    DestructiveOperationDenied,
    /// The file changed on disk since its snapshot was taken.
    StaleFile,
    /// A mutation targeted a path that is stale-blocked and the override
    /// was declined.
    StaleLock,
    /// A required tool argument is absent.
    MissingParameter,
    /// A sidecar file could not be parsed.
    ParseError,
    /// The target is write-protected by policy.
    WriteProtected,
    /// The middleware could not read a file it needed.
    AccessDenied,
}

impl ViolationKind {
    /// The stable error code attached to this kind in the veto envelope.
    pub fn code(self) -> &'static str {
        match self {
            ViolationKind::ScopeViolation => "REQ-001",
            ViolationKind::UnknownTargets => "REQ-002",
            ViolationKind::NoActiveIntent => "REQ-003",
            ViolationKind::IntentMismatch => "REQ-004",
            ViolationKind::InvalidMetadata => "REQ-005",
            ViolationKind::MissingParameter => "REQ-006",
            ViolationKind::StaleFile | ViolationKind::StaleLock => "REQ-007",
            ViolationKind::DestructiveOperationDenied => "REQ-008",
            ViolationKind::DestructiveIntentDenied => "REQ-009",
            ViolationKind::CommandNotAuthorized => "CMD-001",
            ViolationKind::MissingIntent => "HOOK-INT-001",
            ViolationKind::ParseError => "HOOK-PARSE-001",
            ViolationKind::WriteProtected => "FS-001",
            ViolationKind::AccessDenied => "FS-002",
        }
    }
}

/// The structured error envelope surfaced to the model on a veto.
///
/// Only `error_type`, `code`, `tool`, and `message` are always present;
/// the remaining fields carry context specific to the failing check and
/// are omitted from the JSON when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub error_type: ViolationKind,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent_id: Option<String>,
    pub tool: String,
    pub message: String,
    /// The offending file for scope violations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// The path involved in a stale-file failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// The denied shell command.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Snapshot-time SHA-256 for stale-file failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_hash: Option<String>,
    /// On-disk SHA-256 for stale-file failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_hash: Option<String>,
    /// The rejected mutation class.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mutation_class: Option<String>,
    /// The intent id the call carried, when it disagrees with the session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provided_intent_id: Option<String>,
    /// Target paths, for prompts covering more than one file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub targets: Option<Vec<String>>,
}

impl Violation {
    /// Create a violation of the given kind with its canonical code.
    pub fn new(kind: ViolationKind, tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_type: kind,
            code: kind.code().to_string(),
            intent_id: None,
            tool: tool.into(),
            message: message.into(),
            filename: None,
            path: None,
            command: None,
            expected_hash: None,
            actual_hash: None,
            mutation_class: None,
            provided_intent_id: None,
            targets: None,
        }
    }

    /// Attach the active intent id.
    #[must_use]
    pub fn with_intent(mut self, intent_id: impl Into<String>) -> Self {
        self.intent_id = Some(intent_id.into());
        self
    }

    /// Attach the offending filename (scope violations).
    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Attach the path of a stale file.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Attach the denied command string.
    #[must_use]
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Attach expected/actual content hashes (stale-file failures).
    #[must_use]
    pub fn with_hashes(mut self, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        self.expected_hash = Some(expected.into());
        self.actual_hash = Some(actual.into());
        self
    }

    /// Attach the rejected mutation class string.
    #[must_use]
    pub fn with_mutation_class(mut self, class: impl Into<String>) -> Self {
        self.mutation_class = Some(class.into());
        self
    }

    /// Attach the intent id the call provided.
    #[must_use]
    pub fn with_provided_intent(mut self, intent_id: impl Into<String>) -> Self {
        self.provided_intent_id = Some(intent_id.into());
        self
    }

    /// Attach the full target list.
    #[must_use]
    pub fn with_targets(mut self, targets: Vec<String>) -> Self {
        self.targets = Some(targets);
        self
    }

    /// Serialize the envelope to the JSON string handed back to the model.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                "{{\"error_type\":\"{}\",\"message\":\"{}\"}}",
                self.code, self.message
            )
        })
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}
