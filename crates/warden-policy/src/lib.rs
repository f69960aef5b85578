//! Classification policy for Warden.
//!
//! Three classifiers feed the scope gate:
//!
//! - [`command`] -- shell strings into `{safe, destructive}` via built-in
//!   regex tables and an optional project policy file
//! - [`tools`] -- tool names into destructive/mutating sets
//! - [`user_intent`] -- the latest user message into a safe/destructive
//!   verdict, LLM-assisted when an endpoint is configured and heuristic
//!   otherwise

pub mod command;
pub mod llm;
pub mod tools;
pub mod user_intent;

pub use command::{classify_command, CommandClassifier, CommandPolicy};
pub use tools::ToolCatalog;
pub use user_intent::UserIntentClassifier;
