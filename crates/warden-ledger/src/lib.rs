//! Append-only audit sidecars shared across sessions and processes.
//!
//! All writes serialize through [`append::append_with_lock`], which takes a
//! sidecar `<path>.lock` file with exclusive-create semantics and bounded
//! retry. Reads are lock-free and tolerate partial trailing lines, so a
//! reader racing a writer skips the incomplete entry instead of failing.

pub mod append;
pub mod decisions;
pub mod diagnostics;
pub mod jsonl;
pub mod lessons;
pub mod ranges;
pub mod trace;

pub use append::append_with_lock;
pub use decisions::DecisionLog;
pub use diagnostics::DiagnosticsLog;
pub use jsonl::JsonlReader;
pub use lessons::LessonsLog;
pub use ranges::added_ranges;
pub use trace::{Conversation, FileTrace, LineRange, Related, TraceEntry, TraceLog, VcsInfo};

/// SHA-256 over raw bytes, hex-encoded. Every content hash in the ledger
/// uses this.
pub fn content_hash(bytes: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
