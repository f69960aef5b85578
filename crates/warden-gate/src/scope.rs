//! Owned-scope matching.
//!
//! A scope entry containing glob metacharacters (`*`, `?`, `[`, `]`) is
//! matched as a gitignore-style pattern against the normalized relative
//! path. Any other entry is a literal prefix: it matches exactly or at a
//! separator boundary, so `src` owns `src/a.ts` but not `srctool.ts`.

use glob::{MatchOptions, Pattern};

fn has_glob_meta(entry: &str) -> bool {
    entry.contains(['*', '?', '[', ']'])
}

fn glob_matches(entry: &str, rel_path: &str) -> bool {
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: false,
        require_literal_leading_dot: false,
    };
    match Pattern::new(entry) {
        Ok(pattern) => {
            if pattern.matches_with(rel_path, options) {
                return true;
            }
            // A bare-name pattern like "*.lock" also matches by basename,
            // mirroring gitignore semantics for slash-free patterns.
            if !entry.contains('/') {
                if let Some(basename) = rel_path.rsplit('/').next() {
                    return pattern.matches_with(basename, options);
                }
            }
            false
        }
        // An invalid pattern can never authorize anything.
        Err(err) => {
            tracing::warn!(pattern = entry, error = %err, "invalid scope pattern");
            false
        }
    }
}

fn prefix_matches(entry: &str, rel_path: &str) -> bool {
    let entry = entry.trim_end_matches('/');
    if entry.is_empty() {
        return false;
    }
    rel_path == entry || rel_path.starts_with(&format!("{entry}/"))
}

/// Whether one scope entry owns the normalized relative path.
pub fn entry_matches(entry: &str, rel_path: &str) -> bool {
    if has_glob_meta(entry) {
        glob_matches(entry, rel_path)
    } else {
        prefix_matches(entry, rel_path)
    }
}

/// Whether any entry of the owned scope covers the path.
pub fn path_in_scope(owned_scope: &[String], rel_path: &str) -> bool {
    owned_scope.iter().any(|entry| entry_matches(entry, rel_path))
}
