//! Tool-name classification.
//!
//! Two runtime-mutable sets: destructive tools (anything with side
//! effects, including the shell) and mutating tools (the subset that
//! writes to the workspace filesystem). The command-execution tool is
//! destructive but not mutating -- its effects are governed by the command
//! classifier instead of path checks.

use std::collections::HashSet;
use std::sync::RwLock;

use warden_types::ToolClass;

/// Name of the shell-execution tool.
pub const COMMAND_TOOL: &str = "execute_command";

const DEFAULT_MUTATING: &[&str] = &["write_file", "apply_patch", "delete_file", "create_file"];

/// Registry of tool classifications, shared across hooks.
///
/// Interior mutability lets the host add or remove tools at runtime while
/// hooks hold shared references.
pub struct ToolCatalog {
    mutating: RwLock<HashSet<String>>,
    command_tool: String,
}

impl ToolCatalog {
    /// The default catalog: the built-in mutating tools plus the standard
    /// command tool.
    pub fn new() -> Self {
        Self {
            mutating: RwLock::new(DEFAULT_MUTATING.iter().map(|s| s.to_string()).collect()),
            command_tool: COMMAND_TOOL.to_string(),
        }
    }

    /// A catalog with a host-specific command tool name.
    pub fn with_command_tool(command_tool: impl Into<String>) -> Self {
        Self {
            mutating: RwLock::new(DEFAULT_MUTATING.iter().map(|s| s.to_string()).collect()),
            command_tool: command_tool.into(),
        }
    }

    pub fn command_tool(&self) -> &str {
        &self.command_tool
    }

    /// Register a host tool as mutating (and therefore destructive).
    pub fn add_mutating(&self, name: impl Into<String>) {
        self.mutating
            .write()
            .expect("tool catalog poisoned")
            .insert(name.into());
    }

    /// Remove a tool from the mutating set.
    pub fn remove_mutating(&self, name: &str) {
        self.mutating
            .write()
            .expect("tool catalog poisoned")
            .remove(name);
    }

    /// Any tool that writes to the workspace filesystem.
    pub fn is_mutating(&self, name: &str) -> bool {
        self.mutating
            .read()
            .expect("tool catalog poisoned")
            .contains(name)
    }

    /// Any mutating tool, plus the shell-execution tool.
    pub fn is_destructive(&self, name: &str) -> bool {
        name == self.command_tool || self.is_mutating(name)
    }

    pub fn classify(&self, name: &str) -> ToolClass {
        if self.is_destructive(name) {
            ToolClass::Destructive
        } else if KNOWN_SAFE.contains(&name) {
            ToolClass::Safe
        } else {
            ToolClass::Unknown
        }
    }
}

/// Read-only tools the middleware knows about.
const KNOWN_SAFE: &[&str] = &["read_file", "list_files", "search", "select_active_intent"];

impl Default for ToolCatalog {
    fn default() -> Self {
        Self::new()
    }
}
