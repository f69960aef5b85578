//! Lock-free JSONL reads over the shared sidecars.
//!
//! Reads memory-map the file for zero-copy access. The mapping is a
//! point-in-time snapshot: because the sidecars are append-only, bytes
//! already written are never modified in place, so the mapping stays valid
//! while a writer appends past its end. Unparseable lines (a writer's
//! partial flush, a corrupted tail) are skipped, never fatal.

use std::fs::File;
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use serde::de::DeserializeOwned;

/// Memory-mapped reader for one JSONL sidecar.
pub struct JsonlReader {
    path: PathBuf,
    mmap: Option<Mmap>,
}

impl JsonlReader {
    /// Map the file's current contents. A missing file yields an empty
    /// reader rather than an error -- sidecars appear lazily on first write.
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut reader = Self { path, mmap: None };
        reader.remap()?;
        Ok(reader)
    }

    /// Refresh the mapping to include data appended since the last map.
    pub fn remap(&mut self) -> std::io::Result<()> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                self.mmap = None;
                return Ok(());
            }
            Err(err) => return Err(err),
        };
        if file.metadata()?.len() == 0 {
            self.mmap = None;
            return Ok(());
        }
        // SAFETY: the mapping is read-only and the file is append-only, so
        // the mapped region is never modified in place. Appends land beyond
        // the mapping and become visible on the next remap().
        let mmap = unsafe { Mmap::map(&file)? };
        self.mmap = Some(mmap);
        Ok(())
    }

    /// The last `n` well-formed lines, oldest first.
    pub fn tail_lines(&self, n: usize) -> Vec<&str> {
        let data = match self.utf8() {
            Some(d) => d,
            None => return Vec::new(),
        };

        let mut lines: Vec<&str> = Vec::with_capacity(n);
        let mut end = data.len();
        if end > 0 && data.as_bytes()[end - 1] == b'\n' {
            end -= 1;
        }
        while lines.len() < n && end > 0 {
            let start = data[..end].rfind('\n').map(|i| i + 1).unwrap_or(0);
            let line = &data[start..end];
            if !line.is_empty() {
                lines.push(line);
            }
            end = if start > 0 { start - 1 } else { 0 };
        }
        lines.reverse();
        lines
    }

    /// Deserialize the last `n` entries that parse as `T`, oldest first.
    ///
    /// Scans backwards far enough to cover `n` parseable entries even when
    /// unparseable lines are interleaved.
    pub fn tail<T: DeserializeOwned>(&self, n: usize) -> Vec<T> {
        let mut entries: Vec<T> = self
            .all_lines()
            .rev()
            .filter_map(|line| serde_json::from_str::<T>(line).ok())
            .take(n)
            .collect();
        entries.reverse();
        entries
    }

    /// Deserialize every entry that parses as `T`, oldest first.
    pub fn entries<T: DeserializeOwned>(&self) -> Vec<T> {
        self.all_lines()
            .filter_map(|line| serde_json::from_str::<T>(line).ok())
            .collect()
    }

    /// Total number of lines in the mapping.
    pub fn line_count(&self) -> usize {
        match &self.mmap {
            Some(m) => m.as_ref().iter().filter(|&&b| b == b'\n').count(),
            None => 0,
        }
    }

    fn utf8(&self) -> Option<&str> {
        self.mmap
            .as_ref()
            .and_then(|m| std::str::from_utf8(m.as_ref()).ok())
    }

    fn all_lines(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.utf8()
            .unwrap_or("")
            .lines()
            .filter(|l| !l.trim().is_empty())
    }
}
