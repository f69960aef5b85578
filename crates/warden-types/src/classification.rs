//! Classification verdict types shared by the policy crate and the gate.
//!
//! Three classifiers feed the scope gate: the command classifier (shell
//! strings), the tool classifier (tool names), and the user-intent
//! classifier (the most recent user message). This module holds their
//! verdict types; the classification logic lives in `warden-policy`.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Verdict of the shell-command classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandClass {
    Safe,
    Destructive,
}

impl std::fmt::Display for CommandClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandClass::Safe => write!(f, "safe"),
            CommandClass::Destructive => write!(f, "destructive"),
        }
    }
}

/// Verdict of the tool-name classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolClass {
    Safe,
    Destructive,
    Unknown,
}

/// Verdict of the user-intent classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserIntentVerdict {
    Safe,
    Destructive,
    Unknown,
}

/// Which stage produced a user-intent verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserIntentSource {
    /// The configured LLM endpoint answered.
    Llm,
    /// The keyword heuristic answered (no LLM configured, or the safety
    /// override downgraded the LLM verdict).
    Heuristic,
    /// The LLM call failed or timed out and the heuristic filled in.
    Fallback,
    /// No signal at all.
    None,
}

/// A cached classification of one user message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserIntentClassification {
    pub verdict: UserIntentVerdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Clamped to `[0, 1]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub source: UserIntentSource,
    /// SHA-256 of the originating user message; the session cache key.
    pub message_hash: String,
}

impl UserIntentClassification {
    pub fn is_destructive(&self) -> bool {
        self.verdict == UserIntentVerdict::Destructive
    }
}

/// SHA-256 over the raw bytes of a user message, hex-encoded.
pub fn hash_message(message: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(message.as_bytes());
    hex::encode(hasher.finalize())
}
