//! Structured debug events in `agent-diagnostics.jsonl`.
//!
//! Gate verdicts and classifier branches land here as JSON events so an
//! operator can reconstruct why a call was allowed or vetoed without
//! turning on process-level logging. Diagnostics writes are best-effort:
//! callers log and move on when an append fails.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::append::append_with_lock;
use crate::jsonl::JsonlReader;

/// One structured diagnostic event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticEvent {
    pub timestamp: DateTime<Utc>,
    /// Emitting component, e.g. `scope_gate` or `command_classifier`.
    pub component: String,
    /// Event tag, e.g. `veto`, `bypass`, `classified`.
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent_id: Option<String>,
    /// Free-form context payload.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub detail: serde_json::Map<String, serde_json::Value>,
}

/// Writer handle for the diagnostics sidecar.
pub struct DiagnosticsLog {
    path: PathBuf,
}

impl DiagnosticsLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one event. Failures are logged at warn and swallowed.
    pub fn record(&self, component: &str, event: &str, tool: Option<&str>, intent_id: Option<&str>) {
        self.record_detailed(component, event, tool, intent_id, serde_json::Map::new());
    }

    /// Append one event with extra context.
    pub fn record_detailed(
        &self,
        component: &str,
        event: &str,
        tool: Option<&str>,
        intent_id: Option<&str>,
        detail: serde_json::Map<String, serde_json::Value>,
    ) {
        let entry = DiagnosticEvent {
            timestamp: Utc::now(),
            component: component.into(),
            event: event.into(),
            tool: tool.map(String::from),
            intent_id: intent_id.map(String::from),
            detail,
        };
        let line = match serde_json::to_string(&entry) {
            Ok(mut s) => {
                s.push('\n');
                s
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to serialize diagnostic event");
                return;
            }
        };
        if let Err(err) = append_with_lock(&self.path, &line) {
            tracing::warn!(path = %self.path.display(), error = %err, "diagnostics append failed");
        }
    }

    /// All recorded events, oldest first.
    pub fn entries(&self) -> std::io::Result<Vec<DiagnosticEvent>> {
        Ok(JsonlReader::open(&self.path)?.entries())
    }
}
