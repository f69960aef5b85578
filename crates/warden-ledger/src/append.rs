//! Cross-process exclusive append via a sidecar lockfile.
//!
//! `O_EXCL|O_CREAT` on `<path>.lock` is the only coordination primitive the
//! sidecars need: it works on POSIX and Windows, and the lock is never held
//! across anything slower than one append-and-flush.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Attempts before a held lock is reported to the caller.
const MAX_LOCK_ATTEMPTS: u32 = 8;

/// Linear backoff step; attempt `n` sleeps `n * 25ms`.
const BACKOFF_STEP: Duration = Duration::from_millis(25);

/// RAII guard for the sidecar lockfile; unlinks on drop.
struct LockFile {
    path: PathBuf,
}

impl LockFile {
    /// Take the lock, backing off while another process holds it.
    fn acquire(target: &Path) -> std::io::Result<Self> {
        let path = lock_path(target);
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(_file) => return Ok(Self { path }),
                Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                    if attempt >= MAX_LOCK_ATTEMPTS {
                        tracing::warn!(
                            lock = %path.display(),
                            attempts = attempt,
                            "giving up on sidecar lock"
                        );
                        return Err(err);
                    }
                    std::thread::sleep(BACKOFF_STEP * attempt);
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

fn lock_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".lock");
    target.with_file_name(name)
}

/// Append `content` to `path` under the sidecar lock.
///
/// Creates the parent directory if needed. The content is written as-is;
/// callers appending JSONL include their own trailing newline. Prior bytes
/// are never touched (append-only, no truncation).
pub fn append_with_lock(path: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let _lock = LockFile::acquire(path)?;

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(content.as_bytes())?;
    file.flush()
}
