//! Line-range attribution: which lines of the post-image were added by
//! this mutation.
//!
//! The trace ledger records, per file, the runs of lines the tool added,
//! each with a SHA-256 over the concatenated added text. Removed and
//! unchanged runs only advance counters; they are never attributed.

use diffy::Line;

use crate::content_hash;
use warden_types::session::Snapshot;

/// One attributed run of added lines.
///
/// `start_line`/`end_line` are 1-indexed positions in the post-image;
/// `content_hash` covers the added text exactly as it appears there.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AddedRange {
    pub start_line: usize,
    pub end_line: usize,
    pub content_hash: String,
}

/// Compute the added line ranges between a snapshot's text and the current
/// text.
///
/// Line endings are normalized to LF before diffing so a CRLF rewrite does
/// not attribute the whole file. A file that did not exist before (or was
/// binary at snapshot time) attributes everything.
pub fn added_ranges(before: Option<&str>, after: &str) -> Vec<AddedRange> {
    let after_norm = normalize_eol(after);
    let before_norm = before.map(normalize_eol).unwrap_or_default();

    if before.is_none() || before_norm.is_empty() {
        return whole_file_range(&after_norm);
    }

    let patch = diffy::create_patch(&before_norm, &after_norm);
    let mut ranges = Vec::new();

    for hunk in patch.hunks() {
        let mut new_line = hunk.new_range().start();
        let mut run_start: Option<usize> = None;
        let mut run_text = String::new();

        for line in hunk.lines() {
            match line {
                Line::Insert(text) => {
                    run_start.get_or_insert(new_line);
                    run_text.push_str(text);
                    new_line += 1;
                }
                Line::Delete(_) => {
                    flush_run(&mut ranges, &mut run_start, &mut run_text, new_line);
                }
                Line::Context(_) => {
                    flush_run(&mut ranges, &mut run_start, &mut run_text, new_line);
                    new_line += 1;
                }
            }
        }
        flush_run(&mut ranges, &mut run_start, &mut run_text, new_line);
    }

    ranges
}

fn flush_run(
    ranges: &mut Vec<AddedRange>,
    run_start: &mut Option<usize>,
    run_text: &mut String,
    next_line: usize,
) {
    if let Some(start) = run_start.take() {
        ranges.push(AddedRange {
            start_line: start,
            end_line: next_line - 1,
            content_hash: content_hash(run_text.as_bytes()),
        });
        run_text.clear();
    }
}

fn whole_file_range(after: &str) -> Vec<AddedRange> {
    if after.is_empty() {
        return Vec::new();
    }
    let line_count = after.lines().count();
    vec![AddedRange {
        start_line: 1,
        end_line: line_count.max(1),
        content_hash: content_hash(after.as_bytes()),
    }]
}

/// Added ranges for a snapshot, honoring the binary rule: binary files
/// carry a whole-file hash only and an empty range list.
pub fn ranges_for_snapshot(snapshot: Option<&Snapshot>, after_bytes: &[u8]) -> Vec<AddedRange> {
    if after_bytes.contains(&0) {
        return Vec::new();
    }
    let after = String::from_utf8_lossy(after_bytes);
    match snapshot {
        Some(s) if s.binary => Vec::new(),
        Some(s) => added_ranges(s.before.as_deref(), &after),
        None => added_ranges(None, &after),
    }
}

fn normalize_eol(text: &str) -> String {
    text.replace("\r\n", "\n")
}
