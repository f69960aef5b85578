//! Shared helpers for integration tests.
//!
//! Each integration test file compiles common/ as its own module, so not
//! every helper is used in every file.
#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;

use warden::engine::{build_driver, Driver};
use warden::policy::ToolCatalog;
use warden::types::approval::ScriptedApprovals;
use warden::types::{
    ApprovalHandler, OrchestrationPaths, SessionState, ToolArgs, ToolCall, WardenConfig,
};

/// A workspace directory with the orchestration sidecar layout created.
pub struct TestWorkspace {
    pub dir: TempDir,
    pub paths: OrchestrationPaths,
}

impl TestWorkspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("should create temp workspace");
        let paths = OrchestrationPaths::for_working_dir(dir.path());
        std::fs::create_dir_all(&paths.root).expect("should create orchestration dir");
        Self { dir, paths }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write the intents file with one in-progress intent owning `scope`.
    pub fn with_intent(self, id: &str, scope: &[&str]) -> Self {
        let scope_yaml: String = scope
            .iter()
            .map(|s| format!("      - \"{s}\"\n"))
            .collect();
        let yaml = format!(
            "active_intents:\n  - id: {id}\n    name: integration test intent\n    status: IN_PROGRESS\n    owned_scope:\n{scope_yaml}"
        );
        std::fs::write(&self.paths.intents_file, yaml).expect("should write intents file");
        self
    }

    /// Write a workspace file relative to the root.
    pub fn write_file(&self, rel: &str, content: &str) {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("should create parent dirs");
        }
        std::fs::write(path, content).expect("should write workspace file");
    }

    pub fn read_file(&self, rel: &str) -> Option<String> {
        std::fs::read_to_string(self.dir.path().join(rel)).ok()
    }

    pub fn config(&self) -> WardenConfig {
        WardenConfig::new(self.dir.path())
    }

    pub fn session(&self) -> SessionState {
        SessionState::new("test-session", self.dir.path())
    }

    /// Build the standard driver with the given approval handler.
    pub fn driver(&self, approval: Arc<dyn ApprovalHandler>) -> Driver {
        build_driver(&self.config(), Arc::new(ToolCatalog::new()), approval)
    }

    /// Build the standard driver with a scripted approval handler, keeping
    /// a handle on the script for assertions.
    pub fn driver_scripted(
        &self,
        answers: impl IntoIterator<Item = bool>,
    ) -> (Driver, Arc<ScriptedApprovals>) {
        let approvals = Arc::new(ScriptedApprovals::new(answers));
        (self.driver(approvals.clone()), approvals)
    }
}

pub fn select_intent_call(id: &str, intent_id: Option<&str>) -> ToolCall {
    ToolCall::new(
        id,
        "select_active_intent",
        ToolArgs::SelectIntent {
            intent_id: intent_id.map(String::from),
        },
    )
}

pub fn write_call(id: &str, path: &str, body: &str) -> ToolCall {
    ToolCall::new(
        id,
        "write_file",
        ToolArgs::Write {
            path: path.into(),
            body: body.into(),
            intent_id: None,
            mutation_class: None,
        },
    )
}

pub fn patch_call(id: &str, patch: &str) -> ToolCall {
    ToolCall::new(
        id,
        "apply_patch",
        ToolArgs::ApplyPatch {
            patch: patch.into(),
            intent_id: None,
            mutation_class: None,
        },
    )
}

pub fn command_call(id: &str, command: &str) -> ToolCall {
    ToolCall::new(
        id,
        "execute_command",
        ToolArgs::ExecuteCommand {
            command: command.into(),
        },
    )
}
