//! The intent store and the `select_active_intent` handshake.
//!
//! Intents are authored externally in `active_intents.yaml` and are
//! read-only to the middleware. Selecting one binds it to the session and
//! injects a rendered context block carrying the intent specification, a
//! brief history of related trace entries, and the shared knowledge file.

pub mod context;
pub mod ignore;
pub mod selector;
pub mod store;

pub use context::render_context_block;
pub use ignore::IgnoreList;
pub use selector::SelectIntentHook;
pub use store::{IntentStore, LoadError};
