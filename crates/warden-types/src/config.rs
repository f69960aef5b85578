//! Middleware configuration and the orchestration-directory layout.
//!
//! The orchestration directory is derived from the session's working
//! directory; no environment variables are required. All sidecar file
//! names are fixed here so every crate agrees on the layout.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Directory under the working directory holding all sidecar files.
pub const ORCHESTRATION_DIR: &str = ".warden";

/// `{active_intents: [Intent, ...]}` mapping, authored externally.
pub const INTENTS_FILENAME: &str = "active_intents.yaml";
/// Newline-separated intent ids exempt from gate checks.
pub const IGNORE_FILENAME: &str = ".intentignore";
/// Append-only trace ledger, one `TraceEntry` JSON line each.
pub const TRACE_FILENAME: &str = "agent_trace.jsonl";
/// Append-only HITL decision ledger.
pub const DECISIONS_FILENAME: &str = "intent-decisions.jsonl";
/// Append-only structured debug events.
pub const DIAGNOSTICS_FILENAME: &str = "agent-diagnostics.jsonl";
/// Human-readable shared knowledge; lessons are appended here.
pub const KNOWLEDGE_FILENAME: &str = "AGENT.md";
/// Optional project command-classification policy (JSON form).
pub const COMMAND_POLICY_JSON: &str = "command-policy.json";
/// Optional project command-classification policy (YAML form).
pub const COMMAND_POLICY_YAML: &str = "command-policy.yaml";

/// Provenance identity stamped on every trace entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    pub model_identifier: String,
    pub task_id: String,
    pub instance_id: String,
}

impl Default for Contributor {
    fn default() -> Self {
        Self {
            model_identifier: "unknown".into(),
            task_id: "unknown".into(),
            instance_id: "unknown".into(),
        }
    }
}

/// Configuration for the optional LLM-assisted user-intent classifier.
///
/// The API key is read from `api_key_env` at request time and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmEndpointConfig {
    pub endpoint_url: String,
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Seconds before the call is abandoned in favor of the heuristic.
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

fn default_llm_timeout() -> u64 {
    10
}

/// Resolved paths of every sidecar file under the orchestration directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestrationPaths {
    pub root: PathBuf,
    pub intents_file: PathBuf,
    pub ignore_file: PathBuf,
    pub trace_file: PathBuf,
    pub decisions_file: PathBuf,
    pub diagnostics_file: PathBuf,
    pub knowledge_file: PathBuf,
    pub command_policy_json: PathBuf,
    pub command_policy_yaml: PathBuf,
}

impl OrchestrationPaths {
    /// Derive the sidecar layout from a session working directory.
    pub fn for_working_dir(working_dir: &Path) -> Self {
        let root = working_dir.join(ORCHESTRATION_DIR);
        Self {
            intents_file: root.join(INTENTS_FILENAME),
            ignore_file: root.join(IGNORE_FILENAME),
            trace_file: root.join(TRACE_FILENAME),
            decisions_file: root.join(DECISIONS_FILENAME),
            diagnostics_file: root.join(DIAGNOSTICS_FILENAME),
            knowledge_file: root.join(KNOWLEDGE_FILENAME),
            command_policy_json: root.join(COMMAND_POLICY_JSON),
            command_policy_yaml: root.join(COMMAND_POLICY_YAML),
            root,
        }
    }
}

/// Top-level middleware configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WardenConfig {
    /// The session working directory; all normalization and the
    /// orchestration directory derive from it.
    pub working_dir: PathBuf,
    #[serde(default)]
    pub contributor: Contributor,
    /// VCS revision recorded on trace entries, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vcs_revision: Option<String>,
    /// LLM endpoint for user-intent classification; heuristics-only when
    /// absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm: Option<LlmEndpointConfig>,
}

impl WardenConfig {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            contributor: Contributor::default(),
            vcs_revision: None,
            llm: None,
        }
    }

    #[must_use]
    pub fn with_contributor(mut self, contributor: Contributor) -> Self {
        self.contributor = contributor;
        self
    }

    #[must_use]
    pub fn with_vcs_revision(mut self, revision: impl Into<String>) -> Self {
        self.vcs_revision = Some(revision.into());
        self
    }

    #[must_use]
    pub fn with_llm(mut self, llm: LlmEndpointConfig) -> Self {
        self.llm = Some(llm);
        self
    }

    /// The sidecar layout for this configuration's working directory.
    pub fn paths(&self) -> OrchestrationPaths {
        OrchestrationPaths::for_working_dir(&self.working_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_derive_from_working_dir() {
        let paths = OrchestrationPaths::for_working_dir(Path::new("/work/project"));
        assert_eq!(paths.root, PathBuf::from("/work/project/.warden"));
        assert_eq!(
            paths.intents_file,
            PathBuf::from("/work/project/.warden/active_intents.yaml")
        );
        assert_eq!(
            paths.decisions_file,
            PathBuf::from("/work/project/.warden/intent-decisions.jsonl")
        );
        assert_eq!(
            paths.knowledge_file,
            PathBuf::from("/work/project/.warden/AGENT.md")
        );
    }

    #[test]
    fn config_builder() {
        let config = WardenConfig::new("/work/project")
            .with_vcs_revision("abc123")
            .with_contributor(Contributor {
                model_identifier: "model-x".into(),
                task_id: "task-7".into(),
                instance_id: "inst-1".into(),
            });
        assert_eq!(config.vcs_revision.as_deref(), Some("abc123"));
        assert_eq!(config.contributor.task_id, "task-7");
        assert_eq!(config.paths().root, PathBuf::from("/work/project/.warden"));
    }

    #[test]
    fn llm_timeout_defaults() {
        let json = r#"{"endpoint_url":"https://api.example.com","model":"m","api_key_env":"KEY"}"#;
        let llm: LlmEndpointConfig = serde_json::from_str(json).unwrap();
        assert_eq!(llm.timeout_secs, 10);
    }
}
