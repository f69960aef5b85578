//! The append-only trace ledger: one entry per mutating tool call.
//!
//! Each entry links an intent, a tool invocation, and the content hashes of
//! every affected file. Text files additionally carry the line ranges the
//! call added, so later readers can attribute individual lines to the
//! contributor that wrote them. Patch and diff bodies never reach the
//! ledger; they are redacted before the entry is assembled.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use warden_types::session::Snapshot;
use warden_types::{Contributor, MutationClass, ToolCall};

use crate::append::append_with_lock;
use crate::ranges::{ranges_for_snapshot, AddedRange};
use crate::{content_hash, jsonl::JsonlReader};

/// Argument keys copied into a trace entry's `params`.
const PARAM_ALLOW_LIST: &[&str] = &[
    "path",
    "file_path",
    "intent_id",
    "mutation_class",
    "command",
    "prompt",
    "image",
];

/// Argument keys whose values are replaced by `"[redacted]"`.
const PARAM_REDACT_LIST: &[&str] = &["patch", "diff", "old_string", "new_string"];

/// A link from a conversation to a related entity (an intent, a ticket).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Related {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

impl Related {
    pub fn intent(id: impl Into<String>) -> Self {
        Self {
            kind: "intent".into(),
            value: id.into(),
        }
    }
}

/// One contributor's attributed changes within a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub contributor: Contributor,
    #[serde(default)]
    pub related: Vec<Related>,
    #[serde(default)]
    pub ranges: Vec<LineRange>,
}

/// Re-export of the range shape under the name the ledger format uses.
pub type LineRange = AddedRange;

/// Per-file record inside a trace entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileTrace {
    pub relative_path: String,
    /// SHA-256 over the file's raw bytes at the instant of write.
    pub content_hash: String,
    #[serde(default)]
    pub conversations: Vec<Conversation>,
}

/// Version-control position of the workspace when the entry was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct VcsInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision_id: Option<String>,
}

/// One append-only audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mutation_class: Option<MutationClass>,
    pub tool: String,
    pub tool_use_id: String,
    pub params: serde_json::Map<String, Value>,
    pub contributor: Contributor,
    #[serde(default)]
    pub vcs: VcsInfo,
    #[serde(default)]
    pub files: Vec<FileTrace>,
}

impl TraceEntry {
    /// Whether this entry relates to the given intent, either via its
    /// top-level `intent_id` or any conversation's `related` links.
    pub fn relates_to(&self, intent_id: &str) -> bool {
        if self.intent_id.as_deref() == Some(intent_id) {
            return true;
        }
        self.files.iter().any(|f| {
            f.conversations.iter().any(|c| {
                c.related
                    .iter()
                    .any(|r| r.kind == "intent" && r.value == intent_id)
            })
        })
    }
}

/// Reduce a raw argument map to the allow-listed subset, redacting bulky
/// payload keys.
pub fn sanitize_params(raw: &serde_json::Map<String, Value>) -> serde_json::Map<String, Value> {
    let mut out = serde_json::Map::new();
    for (key, value) in raw {
        if PARAM_ALLOW_LIST.contains(&key.as_str()) {
            out.insert(key.clone(), value.clone());
        } else if PARAM_REDACT_LIST.contains(&key.as_str()) {
            out.insert(key.clone(), Value::String("[redacted]".into()));
        }
    }
    out
}

/// Writer handle for `agent_trace.jsonl`.
pub struct TraceLog {
    path: PathBuf,
    contributor: Contributor,
    vcs_revision: Option<String>,
}

impl TraceLog {
    pub fn new(path: impl Into<PathBuf>, contributor: Contributor, vcs_revision: Option<String>) -> Self {
        Self {
            path: path.into(),
            contributor,
            vcs_revision,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Assemble a trace entry for a completed mutating call.
    ///
    /// `files` maps each normalized target path to its current raw bytes
    /// (missing targets, e.g. deleted files, are simply not listed);
    /// `snapshots` supplies the pre-images for range attribution.
    pub fn build_entry(
        &self,
        call: &ToolCall,
        intent_id: Option<String>,
        mutation_class: Option<MutationClass>,
        files: &[(String, Vec<u8>)],
        snapshots: &HashMap<String, Snapshot>,
    ) -> TraceEntry {
        let raw_params = match serde_json::to_value(&call.args) {
            Ok(Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        };

        let related: Vec<Related> = intent_id.iter().map(Related::intent).collect();

        let file_traces = files
            .iter()
            .map(|(path, bytes)| {
                let ranges = ranges_for_snapshot(snapshots.get(path), bytes);
                FileTrace {
                    relative_path: path.clone(),
                    content_hash: content_hash(bytes),
                    conversations: vec![Conversation {
                        contributor: self.contributor.clone(),
                        related: related.clone(),
                        ranges,
                    }],
                }
            })
            .collect();

        TraceEntry {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            intent_id,
            mutation_class,
            tool: call.name.clone(),
            tool_use_id: call.id.clone(),
            params: sanitize_params(&raw_params),
            contributor: self.contributor.clone(),
            vcs: VcsInfo {
                revision_id: self.vcs_revision.clone(),
            },
            files: file_traces,
        }
    }

    /// Append one entry as a JSON line under the sidecar lock.
    pub fn append(&self, entry: &TraceEntry) -> std::io::Result<()> {
        let mut line = serde_json::to_string(entry).map_err(std::io::Error::other)?;
        line.push('\n');
        append_with_lock(&self.path, &line)
    }

    /// The newest `n` entries related to an intent, oldest first.
    pub fn recent_for_intent(&self, intent_id: &str, n: usize) -> std::io::Result<Vec<TraceEntry>> {
        let reader = JsonlReader::open(&self.path)?;
        let mut related: Vec<TraceEntry> = reader
            .entries::<TraceEntry>()
            .into_iter()
            .filter(|e| e.relates_to(intent_id))
            .collect();
        if related.len() > n {
            related.drain(..related.len() - n);
        }
        Ok(related)
    }
}
