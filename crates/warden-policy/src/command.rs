//! Shell-command classification.
//!
//! A pure function from a command string to `{safe, destructive}`. The
//! project can override the built-ins with a `command-policy.json` or
//! `command-policy.yaml` file in the orchestration directory; project
//! patterns take precedence. Anything unmatched defaults to destructive.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use warden_types::config::{COMMAND_POLICY_JSON, COMMAND_POLICY_YAML};
use warden_types::CommandClass;

/// Read-only commands and queries that never mutate the workspace.
const BUILTIN_SAFE: &[&str] = &[
    r"^ls(\s|$)",
    r"^dir(\s|$)",
    r"^pwd$",
    r"^whoami$",
    r"^which\s",
    r"^cat\s",
    r"^head(\s|$)",
    r"^tail(\s|$)",
    r"^wc(\s|$)",
    r"^stat\s",
    r"^file\s",
    r"^tree(\s|$)",
    r"^du(\s|$)",
    r"^df(\s|$)",
    r"^grep\s",
    r"^rg\s",
    r"^find\s+\S+\s*(-name|-type|-maxdepth|$)",
    r"^echo(\s|$)",
    r"^printf\s",
    r"^env$",
    r"^printenv(\s|$)",
    r"^uname(\s|$)",
    r"^date(\s|$)",
    r"^git\s+status(\s|$)",
    r"^git\s+diff(\s|$)",
    r"^git\s+log(\s|$)",
    r"^git\s+show(\s|$)",
    r"^git\s+branch$",
    r"^git\s+remote(\s+-v)?$",
];

/// Mutating, package-touching, build-running, or otherwise side-effecting
/// commands.
const BUILTIN_DESTRUCTIVE: &[&str] = &[
    r"\brm\s",
    r"\brmdir\s",
    r"\bdel\s",
    r"\bmv\s",
    r"\bmove\s",
    r"\bcp\s",
    r"\bcopy\s",
    r"\bdd\s",
    r"\bmkfs",
    r"\bchmod\s",
    r"\bchown\s",
    r"\btouch\s",
    r"\bln\s",
    r"\btruncate\s",
    r"\bnpm\s+(install|uninstall|update|run)\b",
    r"\byarn\s+(add|remove|install)\b",
    r"\bpnpm\s+(add|remove|install)\b",
    r"\bpip\d?\s+(install|uninstall)\b",
    r"\bcargo\s+(add|remove|install|build|run|publish)\b",
    r"\bapt(-get)?\s+(install|remove|purge)\b",
    r"\bbrew\s+(install|uninstall)\b",
    r"\bmake(\s|$)",
    r"\bgit\s+(push|reset|clean|rebase|checkout|restore|stash|merge|commit|cherry-pick|am)\b",
    r"\bsed\s+[^|]*-i",
    r"\bperl\s+[^|]*-i",
    r"\bsudo\s",
    r"\bcurl\s+[^|]*(-o|-O)\b",
    r"\bwget\s",
];

/// Optional project overrides loaded from the orchestration directory.
///
/// Both keys are lists of regex strings. Invalid regexes are skipped with
/// a warning rather than failing classification.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandPolicy {
    #[serde(default)]
    pub safe: Vec<String>,
    #[serde(default)]
    pub destructive: Vec<String>,
}

impl CommandPolicy {
    /// Load `command-policy.json` or `command-policy.yaml` from the
    /// orchestration directory, JSON preferred when both exist. Returns
    /// `None` when neither file is present or neither parses.
    pub fn load(orchestration_dir: &Path) -> Option<Self> {
        let json_path = orchestration_dir.join(COMMAND_POLICY_JSON);
        if let Ok(text) = std::fs::read_to_string(&json_path) {
            match serde_json::from_str(&text) {
                Ok(policy) => return Some(policy),
                Err(err) => {
                    tracing::warn!(path = %json_path.display(), error = %err, "bad command policy");
                }
            }
        }
        let yaml_path = orchestration_dir.join(COMMAND_POLICY_YAML);
        if let Ok(text) = std::fs::read_to_string(&yaml_path) {
            match serde_yaml::from_str(&text) {
                Ok(policy) => return Some(policy),
                Err(err) => {
                    tracing::warn!(path = %yaml_path.display(), error = %err, "bad command policy");
                }
            }
        }
        None
    }
}

struct RuleSet {
    safe: Vec<Regex>,
    destructive: Vec<Regex>,
}

fn compile(patterns: &[String]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|p| match Regex::new(p) {
            Ok(re) => Some(re),
            Err(err) => {
                tracing::warn!(pattern = %p, error = %err, "skipping invalid policy regex");
                None
            }
        })
        .collect()
}

fn builtin_rules() -> &'static RuleSet {
    static RULES: OnceLock<RuleSet> = OnceLock::new();
    RULES.get_or_init(|| RuleSet {
        safe: BUILTIN_SAFE
            .iter()
            .map(|p| Regex::new(p).expect("builtin safe pattern"))
            .collect(),
        destructive: BUILTIN_DESTRUCTIVE
            .iter()
            .map(|p| Regex::new(p).expect("builtin destructive pattern"))
            .collect(),
    })
}

/// Shell-command classifier with optional project overrides.
pub struct CommandClassifier {
    project: Option<RuleSet>,
}

impl CommandClassifier {
    /// Built-ins only.
    pub fn builtin() -> Self {
        Self { project: None }
    }

    /// Built-ins plus the project policy file, when one exists.
    pub fn load(orchestration_dir: &Path) -> Self {
        let project = CommandPolicy::load(orchestration_dir).map(|policy| RuleSet {
            safe: compile(&policy.safe),
            destructive: compile(&policy.destructive),
        });
        Self { project }
    }

    /// Classify a command string.
    pub fn classify(&self, command: &str) -> CommandClass {
        self.classify_inner(command, false)
    }

    /// Classify and emit one `tracing` line per decision branch.
    pub fn classify_debug(&self, command: &str) -> CommandClass {
        self.classify_inner(command, true)
    }

    fn classify_inner(&self, command: &str, debug: bool) -> CommandClass {
        let normalized = command.trim().to_lowercase();

        // Redirection targets are unknowable statically.
        if normalized.contains('<') || normalized.contains('>') {
            if debug {
                tracing::debug!(command, branch = "redirection", "command classified destructive");
            }
            return CommandClass::Destructive;
        }

        if let Some(project) = &self.project {
            if let Some(re) = project.safe.iter().find(|re| re.is_match(&normalized)) {
                if debug {
                    tracing::debug!(command, pattern = re.as_str(), branch = "project_safe", "command classified safe");
                }
                return CommandClass::Safe;
            }
            if let Some(re) = project.destructive.iter().find(|re| re.is_match(&normalized)) {
                if debug {
                    tracing::debug!(command, pattern = re.as_str(), branch = "project_destructive", "command classified destructive");
                }
                return CommandClass::Destructive;
            }
        }

        let builtin = builtin_rules();
        if let Some(re) = builtin.safe.iter().find(|re| re.is_match(&normalized)) {
            if debug {
                tracing::debug!(command, pattern = re.as_str(), branch = "builtin_safe", "command classified safe");
            }
            return CommandClass::Safe;
        }
        if let Some(re) = builtin.destructive.iter().find(|re| re.is_match(&normalized)) {
            if debug {
                tracing::debug!(command, pattern = re.as_str(), branch = "builtin_destructive", "command classified destructive");
            }
            return CommandClass::Destructive;
        }

        if debug {
            tracing::debug!(command, branch = "default", "command classified destructive");
        }
        CommandClass::Destructive
    }
}

/// Classify one command against the built-ins plus any policy file found
/// in the orchestration directory.
pub fn classify_command(command: &str, orchestration_dir: &Path) -> CommandClass {
    CommandClassifier::load(orchestration_dir).classify(command)
}

/// Strip one level of shell wrapper, e.g.
/// `bash -c "git status"` or `pwsh -Command "ls"` down to the inner
/// command. Returns the input unchanged when no wrapper is recognized.
pub fn unwrap_shell_wrapper(command: &str) -> &str {
    let trimmed = command.trim();
    let lower = trimmed.to_lowercase();

    const WRAPPERS: &[(&str, &str)] = &[
        ("sh", "-c"),
        ("bash", "-c"),
        ("zsh", "-c"),
        ("dash", "-c"),
        ("pwsh", "-command"),
        ("powershell", "-command"),
        ("powershell.exe", "-command"),
        ("cmd", "/c"),
        ("cmd.exe", "/c"),
    ];

    for (shell, flag) in WRAPPERS {
        let prefix = format!("{shell} {flag} ");
        if lower.starts_with(&prefix) {
            let inner = trimmed[prefix.len()..].trim();
            return strip_matching_quotes(inner);
        }
    }
    trimmed
}

fn strip_matching_quotes(s: &str) -> &str {
    let bytes = s.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
            return &s[1..s.len() - 1];
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builtin() -> CommandClassifier {
        CommandClassifier::builtin()
    }

    #[test]
    fn read_only_commands_are_safe() {
        let c = builtin();
        for cmd in ["ls -la", "git status", "git diff HEAD~1", "cat src/main.rs", "pwd", "grep -r foo src"] {
            assert_eq!(c.classify(cmd), CommandClass::Safe, "{cmd}");
        }
    }

    #[test]
    fn mutating_commands_are_destructive() {
        let c = builtin();
        for cmd in [
            "rm -rf build",
            "mv a b",
            "cp -r src dst",
            "npm install left-pad",
            "cargo build",
            "git push --force",
            "git reset --hard",
            "sed -i s/a/b/ file.txt",
            "sudo systemctl restart nginx",
        ] {
            assert_eq!(c.classify(cmd), CommandClass::Destructive, "{cmd}");
        }
    }

    #[test]
    fn redirection_is_always_destructive() {
        let c = builtin();
        assert_eq!(c.classify("echo hi > out.txt"), CommandClass::Destructive);
        assert_eq!(c.classify("sort < input.txt"), CommandClass::Destructive);
        // Even for otherwise-safe commands.
        assert_eq!(c.classify("git status > snapshot"), CommandClass::Destructive);
    }

    #[test]
    fn unmatched_defaults_to_destructive() {
        assert_eq!(builtin().classify("frobnicate --all"), CommandClass::Destructive);
    }

    #[test]
    fn empty_command_defaults_to_destructive() {
        // The gate skips empty command strings before classification; the
        // classifier itself has no carve-out and falls through to the
        // default like any other unmatched input.
        assert_eq!(builtin().classify(""), CommandClass::Destructive);
        assert_eq!(builtin().classify("   "), CommandClass::Destructive);
    }

    #[test]
    fn classification_is_case_insensitive() {
        assert_eq!(builtin().classify("  GIT STATUS  "), CommandClass::Safe);
        assert_eq!(builtin().classify("RM -rf /"), CommandClass::Destructive);
    }

    #[test]
    fn project_policy_overrides_builtins() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(COMMAND_POLICY_JSON),
            r#"{"safe": ["^make test$"], "destructive": ["^git log"]}"#,
        )
        .unwrap();

        let c = CommandClassifier::load(dir.path());
        // Built-in says destructive; project says safe.
        assert_eq!(c.classify("make test"), CommandClass::Safe);
        // Built-in says safe; project says destructive.
        assert_eq!(c.classify("git log --oneline"), CommandClass::Destructive);
        // Untouched commands still hit built-ins.
        assert_eq!(c.classify("git status"), CommandClass::Safe);
    }

    #[test]
    fn yaml_policy_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(COMMAND_POLICY_YAML),
            "safe:\n  - '^terraform plan'\n",
        )
        .unwrap();
        let c = CommandClassifier::load(dir.path());
        assert_eq!(c.classify("terraform plan -out x"), CommandClass::Safe);
    }

    #[test]
    fn invalid_policy_regex_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(COMMAND_POLICY_JSON),
            r#"{"safe": ["[unclosed", "^true$"]}"#,
        )
        .unwrap();
        let c = CommandClassifier::load(dir.path());
        assert_eq!(c.classify("true"), CommandClass::Safe);
    }

    #[test]
    fn unwrap_recognized_wrappers() {
        assert_eq!(unwrap_shell_wrapper(r#"bash -c "git status""#), "git status");
        assert_eq!(unwrap_shell_wrapper("sh -c 'ls -la'"), "ls -la");
        assert_eq!(
            unwrap_shell_wrapper(r#"pwsh -Command "Get-ChildItem""#),
            "Get-ChildItem"
        );
        assert_eq!(unwrap_shell_wrapper("cmd /C \"dir\""), "dir");
    }

    #[test]
    fn unwrap_leaves_plain_commands_alone() {
        assert_eq!(unwrap_shell_wrapper("git status"), "git status");
        assert_eq!(unwrap_shell_wrapper("bash script.sh"), "bash script.sh");
    }

    #[test]
    fn wrapped_safe_command_classifies_safe() {
        let inner = unwrap_shell_wrapper(r#"bash -c "git status""#);
        assert_eq!(builtin().classify(inner), CommandClass::Safe);
    }

    #[test]
    fn debug_variant_matches_plain_variant() {
        let c = builtin();
        for cmd in ["ls", "rm -rf /", "mystery-tool", "echo hi > f", ""] {
            assert_eq!(c.classify(cmd), c.classify_debug(cmd), "{cmd:?}");
        }
    }
}
