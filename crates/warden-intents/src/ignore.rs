//! The `.intentignore` file: intent ids exempt from gate checks.
//!
//! One id per line; blank lines and `#` comments are skipped. An inline
//! `#` starts a comment as well, so `INT-1  # migration` lists `INT-1`.

use std::collections::HashSet;
use std::path::Path;

/// Parsed ignore list.
#[derive(Debug, Clone, Default)]
pub struct IgnoreList {
    ids: HashSet<String>,
}

impl IgnoreList {
    /// Load the ignore file; a missing file yields an empty list.
    pub fn load(path: &Path) -> Self {
        let text = std::fs::read_to_string(path).unwrap_or_default();
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Self {
        let ids = text
            .lines()
            .map(|line| line.split('#').next().unwrap_or("").trim())
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect();
        Self { ids }
    }

    pub fn contains(&self, intent_id: &str) -> bool {
        self.ids.contains(intent_id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ids_and_strips_comments() {
        let list = IgnoreList::parse("# exempt during migration\nINT-1\n\nINT-2  # temporary\n");
        assert!(list.contains("INT-1"));
        assert!(list.contains("INT-2"));
        assert!(!list.contains("INT-3"));
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let list = IgnoreList::load(&dir.path().join(".intentignore"));
        assert!(list.is_empty());
    }

    #[test]
    fn comment_only_file_is_empty() {
        let list = IgnoreList::parse("# nothing\n# here\n");
        assert!(list.is_empty());
    }
}
