//! Tool calls as seen by the middleware pipeline.
//!
//! The LLM layer hands over a parsed [`ToolCall`] whose arguments are a
//! per-tool tagged variant rather than an untyped bag. Host-specific tools
//! the middleware does not know about land in [`ToolArgs::Unknown`], which
//! preserves the raw argument map so the gate can still extract target
//! paths and metadata from recognized keys.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name of the intent-selection handshake tool.
pub const SELECT_INTENT_TOOL: &str = "select_active_intent";

/// The two allowed mutation classes.
///
/// `AstRefactor` marks semantics-preserving refactors; `IntentEvolution`
/// marks intent-advancing changes and is the injected default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MutationClass {
    AstRefactor,
    IntentEvolution,
}

impl std::fmt::Display for MutationClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MutationClass::AstRefactor => write!(f, "AST_REFACTOR"),
            MutationClass::IntentEvolution => write!(f, "INTENT_EVOLUTION"),
        }
    }
}

impl std::str::FromStr for MutationClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AST_REFACTOR" => Ok(MutationClass::AstRefactor),
            "INTENT_EVOLUTION" => Ok(MutationClass::IntentEvolution),
            other => Err(format!("invalid mutation class: {other:?}")),
        }
    }
}

/// Per-tool tagged arguments with an [`Unknown`](ToolArgs::Unknown) fallback
/// for forward compatibility.
///
/// Deserialization is untagged: argument maps that fit a known shape parse
/// into the typed variant, everything else (including maps carrying an
/// unrecognized `mutation_class` string) falls through to `Unknown` with the
/// raw map intact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolArgs {
    /// Whole-file write.
    Write {
        path: String,
        body: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        intent_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mutation_class: Option<MutationClass>,
    },
    /// Structured patch application (`*** Add File:` / `*** Update File:` /
    /// `*** Delete File:` / `*** Move to:` headers).
    ApplyPatch {
        patch: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        intent_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mutation_class: Option<MutationClass>,
    },
    /// Shell command execution.
    ExecuteCommand { command: String },
    /// The intent-selection handshake.
    SelectIntent {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        intent_id: Option<String>,
    },
    /// Host-specific tool whose raw argument map is preserved.
    Unknown(serde_json::Map<String, Value>),
}

impl ToolArgs {
    /// The declared intent id, if the call carries one.
    pub fn intent_id(&self) -> Option<&str> {
        match self {
            ToolArgs::Write { intent_id, .. }
            | ToolArgs::ApplyPatch { intent_id, .. }
            | ToolArgs::SelectIntent { intent_id } => intent_id.as_deref(),
            ToolArgs::Unknown(map) => map.get("intent_id").and_then(Value::as_str),
            _ => None,
        }
    }

    /// The declared mutation class, if present and recognized.
    ///
    /// Returns `Some(Err(raw))` when an Unknown-map call carries an
    /// unrecognized class string, so the gate can veto it rather than
    /// silently defaulting.
    pub fn mutation_class(&self) -> Option<Result<MutationClass, String>> {
        match self {
            ToolArgs::Write { mutation_class, .. } | ToolArgs::ApplyPatch { mutation_class, .. } => {
                (*mutation_class).map(Ok)
            }
            ToolArgs::Unknown(map) => map
                .get("mutation_class")
                .and_then(Value::as_str)
                .map(|raw| raw.parse::<MutationClass>().map_err(|_| raw.to_string())),
            _ => None,
        }
    }

    /// Fill in missing provenance metadata. Existing values are kept.
    pub fn inject_metadata(&mut self, id: &str, class: MutationClass) {
        match self {
            ToolArgs::Write {
                intent_id,
                mutation_class,
                ..
            }
            | ToolArgs::ApplyPatch {
                intent_id,
                mutation_class,
                ..
            } => {
                intent_id.get_or_insert_with(|| id.to_string());
                mutation_class.get_or_insert(class);
            }
            ToolArgs::Unknown(map) => {
                map.entry("intent_id")
                    .or_insert_with(|| Value::String(id.to_string()));
                map.entry("mutation_class")
                    .or_insert_with(|| Value::String(class.to_string()));
            }
            _ => {}
        }
    }

    /// The shell command string, for command-execution calls.
    pub fn command(&self) -> Option<&str> {
        match self {
            ToolArgs::ExecuteCommand { command } => Some(command),
            ToolArgs::Unknown(map) => map.get("command").and_then(Value::as_str),
            _ => None,
        }
    }

    /// The patch or diff payload, if the call carries one.
    pub fn patch_body(&self) -> Option<&str> {
        match self {
            ToolArgs::ApplyPatch { patch, .. } => Some(patch),
            ToolArgs::Unknown(map) => map
                .get("patch")
                .or_else(|| map.get("diff"))
                .and_then(Value::as_str),
            _ => None,
        }
    }

    /// Collect path strings under the recognized argument keys
    /// (`path`, `file_path`, `files`). Patch-header scanning is layered on
    /// top of this by the gate.
    pub fn raw_path_values(&self) -> Vec<String> {
        match self {
            ToolArgs::Write { path, .. } => vec![path.clone()],
            ToolArgs::Unknown(map) => {
                let mut out = Vec::new();
                for key in ["path", "file_path"] {
                    if let Some(s) = map.get(key).and_then(Value::as_str) {
                        out.push(s.to_string());
                    }
                }
                if let Some(files) = map.get("files").and_then(Value::as_array) {
                    out.extend(files.iter().filter_map(Value::as_str).map(String::from));
                }
                out
            }
            _ => Vec::new(),
        }
    }
}

/// A parsed tool call flowing through the pipeline.
///
/// `partial` is true while the LLM is still streaming arguments; hooks that
/// examine argument content skip partial calls entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Stable call identifier provided by the LLM layer.
    pub id: String,
    /// Tool identifier, e.g. `write_file` or `execute_command`.
    pub name: String,
    pub args: ToolArgs,
    #[serde(default)]
    pub partial: bool,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, args: ToolArgs) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            args,
            partial: false,
        }
    }

    /// Mark the call as still streaming.
    #[must_use]
    pub fn partial(mut self) -> Self {
        self.partial = true;
        self
    }
}
