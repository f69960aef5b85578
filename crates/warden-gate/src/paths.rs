//! The single path normalizer, and target extraction from tool calls.
//!
//! Scope matching, stale-block lookup, and snapshot lookup all key on the
//! same normalized form: POSIX separators, relative to the session working
//! directory, leading `./` stripped. Lookup helpers additionally tolerate
//! the raw spellings a model may emit (`./src\a.ts`) by generating
//! candidate sets from one normalizer instead of scattering ad-hoc fixups.

use std::path::Path;

use warden_types::ToolArgs;

/// Patch header markers that name a file.
const PATCH_PATH_MARKERS: &[&str] = &[
    "*** Add File:",
    "*** Update File:",
    "*** Delete File:",
    "*** Move to:",
];

/// Patch header markers that indicate deletion or relocation.
const PATCH_DESTRUCTIVE_MARKERS: &[&str] = &["*** Delete File:", "*** Move to:"];

/// Normalize a path string to the canonical form used across the
/// middleware.
pub fn normalize_path(raw: &str, working_dir: &Path) -> String {
    let mut s = raw.trim().replace('\\', "/");

    // Make absolute paths inside the workspace relative to it.
    let workdir = working_dir.to_string_lossy().replace('\\', "/");
    if !workdir.is_empty() {
        if let Some(rest) = s.strip_prefix(&workdir) {
            s = rest.trim_start_matches('/').to_string();
        }
    }

    while let Some(rest) = s.strip_prefix("./") {
        s = rest.to_string();
    }

    // Collapse duplicate separators; "src//a.ts" and "src/a.ts" must agree.
    while s.contains("//") {
        s = s.replace("//", "/");
    }

    s.trim_end_matches('/').to_string()
}

/// The spellings under which a snapshot or stale block for `raw` may have
/// been stored. The normalized form comes first.
pub fn lookup_candidates(raw: &str, working_dir: &Path) -> Vec<String> {
    let normalized = normalize_path(raw, working_dir);
    let mut candidates = vec![
        normalized.clone(),
        raw.trim().to_string(),
        format!("./{normalized}"),
        normalized.replace('/', "\\"),
    ];
    candidates.dedup();
    candidates
}

/// Paths named by patch header markers, in payload order.
pub fn extract_patch_paths(patch: &str) -> Vec<String> {
    let mut out = Vec::new();
    for line in patch.lines() {
        let trimmed = line.trim();
        for marker in PATCH_PATH_MARKERS {
            if let Some(rest) = trimmed.strip_prefix(marker) {
                let path = rest.trim();
                if !path.is_empty() {
                    out.push(path.to_string());
                }
            }
        }
    }
    out
}

/// Whether a patch payload deletes or moves files.
pub fn patch_is_destructive(patch: &str) -> bool {
    patch
        .lines()
        .map(str::trim)
        .any(|line| PATCH_DESTRUCTIVE_MARKERS.iter().any(|m| line.starts_with(m)))
}

/// All normalized target paths of a tool call: recognized argument keys
/// plus patch header markers, deduplicated, empties dropped.
pub fn extract_targets(args: &ToolArgs, working_dir: &Path) -> Vec<String> {
    let mut raw = args.raw_path_values();
    if let Some(patch) = args.patch_body() {
        raw.extend(extract_patch_paths(patch));
    }

    let mut seen = std::collections::HashSet::new();
    raw.iter()
        .map(|p| normalize_path(p, working_dir))
        .filter(|p| !p.is_empty())
        .filter(|p| seen.insert(p.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn workdir() -> PathBuf {
        PathBuf::from("/work/project")
    }

    #[test]
    fn normalizes_separators_and_dot_prefix() {
        assert_eq!(normalize_path("./src/a.ts", &workdir()), "src/a.ts");
        assert_eq!(normalize_path("src\\sub\\a.ts", &workdir()), "src/sub/a.ts");
        assert_eq!(normalize_path("././src/a.ts", &workdir()), "src/a.ts");
        assert_eq!(normalize_path("src//a.ts", &workdir()), "src/a.ts");
        assert_eq!(normalize_path("  src/a.ts  ", &workdir()), "src/a.ts");
    }

    #[test]
    fn absolute_workspace_paths_become_relative() {
        assert_eq!(
            normalize_path("/work/project/src/a.ts", &workdir()),
            "src/a.ts"
        );
        // Outside the workspace: left absolute.
        assert_eq!(normalize_path("/etc/passwd", &workdir()), "/etc/passwd");
    }

    #[test]
    fn candidates_cover_raw_spellings() {
        let candidates = lookup_candidates("./src\\a.ts", &workdir());
        assert_eq!(candidates[0], "src/a.ts");
        assert!(candidates.contains(&"./src/a.ts".to_string()));
        assert!(candidates.contains(&"src\\a.ts".to_string()));
    }

    #[test]
    fn patch_paths_from_all_markers() {
        let patch = "\
*** Add File: src/new.ts
+line
*** Update File: src/old.ts
@@ -1 +1 @@
*** Delete File: src/dead.ts
*** Move to: src/renamed.ts
";
        assert_eq!(
            extract_patch_paths(patch),
            vec!["src/new.ts", "src/old.ts", "src/dead.ts", "src/renamed.ts"]
        );
    }

    #[test]
    fn destructive_markers_detected() {
        assert!(patch_is_destructive("*** Delete File: src/x.ts"));
        assert!(patch_is_destructive("context\n  *** Move to: b.ts\n"));
        assert!(!patch_is_destructive("*** Update File: src/x.ts\n+new line"));
    }

    #[test]
    fn extract_targets_dedupes_and_normalizes() {
        let args = ToolArgs::ApplyPatch {
            patch: "*** Update File: ./src/a.ts\n*** Delete File: src/a.ts\n*** Add File: src/b.ts"
                .into(),
            intent_id: None,
            mutation_class: None,
        };
        assert_eq!(
            extract_targets(&args, &workdir()),
            vec!["src/a.ts", "src/b.ts"]
        );
    }

    #[test]
    fn extract_targets_from_write_args() {
        let args = ToolArgs::Write {
            path: "./src/a.ts".into(),
            body: "x".into(),
            intent_id: None,
            mutation_class: None,
        };
        assert_eq!(extract_targets(&args, &workdir()), vec!["src/a.ts"]);
    }

    #[test]
    fn command_args_have_no_targets() {
        let args = ToolArgs::ExecuteCommand {
            command: "rm src/a.ts".into(),
        };
        assert!(extract_targets(&args, &workdir()).is_empty());
    }
}
