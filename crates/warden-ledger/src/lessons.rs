//! Lessons-learned appends to the shared knowledge file.
//!
//! When an optimistic-lock check catches a file changing underneath the
//! agent, the failure is summarized as a short Markdown block in `AGENT.md`
//! so every future session selecting any intent sees it in its context.

use std::path::{Path, PathBuf};

use warden_types::session::VerificationFailure;

use crate::append::append_with_lock;

/// The fixed guidance appended with every verification failure.
const LESSON_TEXT: &str =
    "Re-read the file and re-apply the change; the workspace was modified outside this session.";

/// Writer handle for the shared knowledge file.
pub struct LessonsLog {
    path: PathBuf,
}

impl LessonsLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one verification failure as a Markdown block.
    pub fn append_failure(&self, failure: &VerificationFailure) -> std::io::Result<()> {
        let block = format!(
            "\n## Verification failure -- {}\n\n\
             - Tool: `{}`\n\
             - Path: `{}`\n\
             - Expected hash: `{}`\n\
             - Actual hash: `{}`\n\n\
             Lesson: {}\n",
            failure.timestamp.to_rfc3339(),
            failure.tool,
            failure.path,
            failure.expected_hash,
            failure.actual_hash,
            LESSON_TEXT,
        );
        append_with_lock(&self.path, &block)
    }

    /// The whole knowledge file, or an empty string when it does not exist
    /// yet.
    pub fn read_all(&self) -> String {
        std::fs::read_to_string(&self.path).unwrap_or_default()
    }
}
