//! Intent records and the per-session active-intent binding.
//!
//! Intents are authored externally and arrive as entries in the
//! `active_intents.yaml` sidecar. The middleware treats them as read-only:
//! it selects, renders, and enforces them but never writes them back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of an intent.
///
/// Only `IN_PROGRESS` intents may be selected as the session's active intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentStatus {
    Pending,
    InProgress,
    Done,
    Abandoned,
}

impl std::fmt::Display for IntentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntentStatus::Pending => write!(f, "PENDING"),
            IntentStatus::InProgress => write!(f, "IN_PROGRESS"),
            IntentStatus::Done => write!(f, "DONE"),
            IntentStatus::Abandoned => write!(f, "ABANDONED"),
        }
    }
}

/// A declarative record of a development goal with an owned scope.
///
/// `owned_scope` entries are either literal path prefixes (`src`) or
/// glob-capable patterns (`src/**/*.ts`); the gate decides which form
/// applies by looking for glob metacharacters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub id: String,
    pub name: String,
    pub status: IntentStatus,
    #[serde(default)]
    pub owned_scope: Vec<String>,
    #[serde(default)]
    pub constraints: Vec<String>,
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
}

impl Intent {
    /// Whether this intent may be selected as a session's active intent.
    pub fn is_selectable(&self) -> bool {
        self.status == IntentStatus::InProgress
    }
}

/// The intent bound to a session by the selection handshake.
///
/// At most one active intent exists per session; re-selection replaces it
/// and clearing the session destroys it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveIntent {
    pub id: String,
    pub selected_at: DateTime<Utc>,
    /// The rendered `<intent_context>` block injected into the conversation.
    pub context_block: String,
    /// Scope patterns copied from the intent record at selection time.
    pub owned_scope: Vec<String>,
}

impl ActiveIntent {
    /// Bind an intent to the session, capturing its scope and the rendered
    /// context block.
    pub fn bind(intent: &Intent, context_block: impl Into<String>) -> Self {
        Self {
            id: intent.id.clone(),
            selected_at: Utc::now(),
            context_block: context_block.into(),
            owned_scope: intent.owned_scope.clone(),
        }
    }
}
