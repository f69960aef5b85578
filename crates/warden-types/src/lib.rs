//! Core types shared across all Warden crates.
//!
//! Defines intents, tool calls, session state, violation envelopes,
//! classification verdicts, and configuration used by the gate, the
//! classifiers, the ledger, and the dispatch driver.

pub mod approval;
pub mod classification;
pub mod config;
pub mod decision;
pub mod error;
pub mod intent;
pub mod session;
pub mod tool;
pub mod violation;

pub use approval::{ApprovalHandler, ApprovalRequest};
pub use classification::{
    hash_message, CommandClass, ToolClass, UserIntentClassification, UserIntentSource,
    UserIntentVerdict,
};
pub use config::{Contributor, LlmEndpointConfig, OrchestrationPaths, WardenConfig};
pub use decision::{Decision, DecisionOutcome};
pub use error::WardenError;
pub use intent::{ActiveIntent, Intent, IntentStatus};
pub use session::{SessionState, Snapshot, StaleBlock, VerificationFailure};
pub use tool::{MutationClass, ToolArgs, ToolCall, SELECT_INTENT_TOOL};
pub use violation::{Violation, ViolationKind};
