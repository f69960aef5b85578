//! Per-session mutable state.
//!
//! Every hook reads and writes state through this one record; the hook
//! engine itself is stateless. Sidecar files on disk are shared across
//! sessions, but everything here is owned by a single session and dies
//! with it.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decision::Decision;
use crate::intent::ActiveIntent;
use crate::classification::UserIntentClassification;

/// Pre-mutation content capture for one `(tool_call_id, path)` pair.
///
/// Created by the snapshot pre-hook, consumed (and removed) by the
/// trace-writer post-hook. `binary` is true iff any byte of the file was
/// `0x00`; binary snapshots carry no text and are never declared stale by
/// the content-hash comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Text content at capture time, `None` for missing or binary files.
    pub before: Option<String>,
    pub existed: bool,
    pub binary: bool,
}

/// Marker that a path is known to be out of sync with its snapshot.
///
/// Set on optimistic-lock failures; cleared on explicit override approval
/// or a successful write. Keyed by the normalized POSIX path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaleBlock {
    pub timestamp: DateTime<Utc>,
    /// The tool whose lock check detected the divergence.
    pub tool: String,
}

/// The most recent stale/lock failure, pending pickup by the
/// lessons-learned post-hook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationFailure {
    pub timestamp: DateTime<Utc>,
    pub tool: String,
    pub path: String,
    pub expected_hash: String,
    pub actual_hash: String,
}

/// All mutable state owned by one session.
///
/// The session serves exactly one in-flight tool call at a time; the driver
/// enforces this through [`SessionState::begin_dispatch`].
#[derive(Debug)]
pub struct SessionState {
    pub session_id: String,
    /// Working directory all path normalization is relative to.
    pub working_dir: PathBuf,
    pub active_intent: Option<ActiveIntent>,
    /// `tool_call_id -> normalized path -> snapshot`.
    pub snapshots: HashMap<String, HashMap<String, Snapshot>>,
    /// Normalized POSIX path -> stale marker.
    pub stale_blocks: HashMap<String, StaleBlock>,
    /// HITL decisions cached for reuse within the session, keyed by the
    /// prompt's dedup key.
    pub decision_cache: HashMap<String, Decision>,
    /// `(intent_id, command)` keys already approved this session.
    pub approved_commands: HashSet<String>,
    /// Dedup keys of destructive-operation approvals granted this session.
    pub destructive_approvals: HashSet<String>,
    pub last_verification_failure: Option<VerificationFailure>,
    /// User-intent classifications keyed by SHA-256 of the user message.
    pub user_intent_cache: HashMap<String, UserIntentClassification>,
    /// The most recent user message, classified by the preflight checks.
    pub last_user_message: Option<String>,
    in_flight: bool,
}

impl SessionState {
    pub fn new(session_id: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            session_id: session_id.into(),
            working_dir: working_dir.into(),
            active_intent: None,
            snapshots: HashMap::new(),
            stale_blocks: HashMap::new(),
            decision_cache: HashMap::new(),
            approved_commands: HashSet::new(),
            destructive_approvals: HashSet::new(),
            last_verification_failure: None,
            user_intent_cache: HashMap::new(),
            last_user_message: None,
            in_flight: false,
        }
    }

    /// Mark the session as serving a tool call. Returns `false` when a call
    /// is already in flight, in which case the caller must not dispatch.
    pub fn begin_dispatch(&mut self) -> bool {
        if self.in_flight {
            return false;
        }
        self.in_flight = true;
        true
    }

    /// Release the single-flight flag after pre-hooks, handler, and
    /// post-hooks have completed.
    pub fn end_dispatch(&mut self) {
        self.in_flight = false;
    }

    /// Store a snapshot for a call/path pair.
    pub fn put_snapshot(&mut self, call_id: &str, path: impl Into<String>, snapshot: Snapshot) {
        self.snapshots
            .entry(call_id.to_string())
            .or_default()
            .insert(path.into(), snapshot);
    }

    /// Remove and return every snapshot captured for a call.
    pub fn take_snapshots(&mut self, call_id: &str) -> HashMap<String, Snapshot> {
        self.snapshots.remove(call_id).unwrap_or_default()
    }

    /// Mark a path stale-blocked.
    pub fn block_stale(&mut self, path: impl Into<String>, tool: impl Into<String>) {
        self.stale_blocks.insert(
            path.into(),
            StaleBlock {
                timestamp: Utc::now(),
                tool: tool.into(),
            },
        );
    }

    /// Clear a stale block after an explicit override or a successful write.
    pub fn clear_stale(&mut self, path: &str) -> Option<StaleBlock> {
        self.stale_blocks.remove(path)
    }

    /// Drop the active intent and all per-intent caches. Used when the host
    /// ends or resets the session.
    pub fn clear(&mut self) {
        self.active_intent = None;
        self.snapshots.clear();
        self.stale_blocks.clear();
        self.decision_cache.clear();
        self.approved_commands.clear();
        self.destructive_approvals.clear();
        self.last_verification_failure = None;
        self.user_intent_cache.clear();
        self.last_user_message = None;
        self.in_flight = false;
    }
}
