//! Warden: intent-governed tool execution middleware for AI coding agents.
//!
//! Warden sits between a language model's tool-call stream and the
//! side-effecting handlers that execute it. Every mutating action must be
//! declared against a registered intent, stay inside that intent's owned
//! scope, carry provenance metadata, survive an optimistic-concurrency check
//! against the filesystem, and leave a line in an append-only audit ledger.
//!
//! This facade crate re-exports the workspace members:
//!
//! - [`warden_types`] -- intents, tool calls, session state, veto envelopes
//! - [`warden_hooks`] -- the hook engine (ordered pre/post dispatch)
//! - [`warden_policy`] -- command, tool, and user-intent classifiers
//! - [`warden_ledger`] -- append-only trace/decision/lessons sidecars
//! - [`warden_intents`] -- the intent store and context injector
//! - [`warden_gate`] -- scope enforcement, snapshots, optimistic locking
//! - [`warden_engine`] -- the per-session dispatch driver

pub use warden_engine as engine;
pub use warden_gate as gate;
pub use warden_hooks as hooks;
pub use warden_intents as intents;
pub use warden_ledger as ledger;
pub use warden_policy as policy;
pub use warden_types as types;
