//! Optimistic locking against the snapshot map.
//!
//! Handlers call [`check_optimistic_lock`] before mutating a path and
//! again immediately before the final write, closing the
//! time-of-check/time-of-use window as far as the filesystem allows. A
//! failure records the divergence (for the lessons-learned post-hook) and
//! stale-blocks the path so further mutations are held behind an explicit
//! override.

use chrono::Utc;

use warden_ledger::content_hash;
use warden_types::session::{Snapshot, VerificationFailure};
use warden_types::{SessionState, Violation, ViolationKind};

use crate::paths::lookup_candidates;

/// Verify that `path` still matches the snapshot taken for `call_id`.
///
/// Stale iff existence disagrees with the snapshot or, for text files,
/// the content hash differs. Binary snapshots are never declared stale
/// here. A missing snapshot passes: a path the snapshot hook never saw
/// has nothing to be compared against.
pub fn check_optimistic_lock(
    session: &mut SessionState,
    call_id: &str,
    path: &str,
    tool: &str,
) -> Result<(), Violation> {
    let working_dir = session.working_dir.clone();
    let candidates = lookup_candidates(path, &working_dir);
    let normalized = candidates[0].clone();

    let snapshot = candidates
        .iter()
        .find_map(|key| {
            session
                .snapshots
                .get(call_id)
                .and_then(|by_path| by_path.get(key))
        })
        .cloned();

    let snapshot = match snapshot {
        Some(s) => s,
        None => return Ok(()),
    };

    if snapshot.binary {
        return Ok(());
    }

    let on_disk = working_dir.join(&normalized);
    let current = std::fs::read(&on_disk).ok();

    match verify(&snapshot, current.as_deref()) {
        Ok(()) => Ok(()),
        Err((expected, actual)) => {
            tracing::warn!(
                path = %normalized,
                tool,
                expected = %expected,
                actual = %actual,
                "optimistic lock failed"
            );

            session.last_verification_failure = Some(VerificationFailure {
                timestamp: Utc::now(),
                tool: tool.to_string(),
                path: normalized.clone(),
                expected_hash: expected.clone(),
                actual_hash: actual.clone(),
            });
            session.block_stale(normalized.clone(), tool);

            Err(Violation::new(
                ViolationKind::StaleFile,
                tool,
                format!("{normalized} changed on disk since it was read; re-read before editing"),
            )
            .with_path(normalized)
            .with_hashes(expected, actual))
        }
    }
}

/// Compare a snapshot against current bytes. `Err` carries
/// `(expected_hash, actual_hash)`.
fn verify(snapshot: &Snapshot, current: Option<&[u8]>) -> Result<(), (String, String)> {
    let expected = snapshot
        .before
        .as_deref()
        .map(|text| content_hash(text.as_bytes()));

    match (snapshot.existed, current) {
        (false, None) => Ok(()),
        (false, Some(bytes)) => Err(("<absent>".to_string(), content_hash(bytes))),
        (true, None) => Err((
            expected.unwrap_or_else(|| "<unknown>".to_string()),
            "<absent>".to_string(),
        )),
        (true, Some(bytes)) => {
            let expected = expected.unwrap_or_else(|| "<unknown>".to_string());
            let actual = content_hash(bytes);
            if expected == actual {
                Ok(())
            } else {
                Err((expected, actual))
            }
        }
    }
}
