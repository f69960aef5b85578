//! Scope enforcement, pre-mutation snapshots, and optimistic locking.
//!
//! The [`enforce::ScopeGateHook`] is the central policy hook: it runs
//! before every non-partial tool call and walks a fixed sequence of
//! checks -- active-intent requirement, ignore-list bypass, user-intent
//! preflight, command authorization, stale-block override, metadata
//! injection, destructive-operation preflight, and the scope check
//! itself. Every human prompt it raises is recorded as a decision, both
//! in the session cache and in the shared decisions ledger.
//!
//! [`snapshot::SnapshotHook`] captures pre-images for mutating calls and
//! [`lock::check_optimistic_lock`] lets handlers verify, immediately
//! before writing, that the workspace still matches those pre-images.

pub mod enforce;
pub mod lock;
pub mod paths;
pub mod scope;
pub mod snapshot;

pub use enforce::ScopeGateHook;
pub use lock::check_optimistic_lock;
pub use paths::{extract_targets, normalize_path, patch_is_destructive};
pub use scope::path_in_scope;
pub use snapshot::SnapshotHook;
