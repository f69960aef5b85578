//! Loading and querying the `active_intents.yaml` sidecar.

use std::path::Path;

use serde::Deserialize;

use warden_types::{Intent, WardenError};

/// Files larger than this are rejected rather than parsed.
const MAX_INTENTS_FILE_SIZE: u64 = 1024 * 1024;

/// Why the intents file could not be loaded.
///
/// The selector maps the two cases to different veto kinds, so they are
/// kept distinct instead of collapsing into one error string.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("cannot read intents file {path}: {detail}")]
    Unreadable { path: String, detail: String },
    #[error("cannot parse intents file {path}: {detail}")]
    Unparseable { path: String, detail: String },
}

impl From<LoadError> for WardenError {
    fn from(err: LoadError) -> Self {
        WardenError::IntentError(err.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct IntentsFile {
    #[serde(default)]
    active_intents: Vec<Intent>,
}

/// An in-memory view of the intents file.
///
/// The store is loaded fresh on every selection so externally-authored
/// status changes take effect without a restart.
#[derive(Debug, Clone)]
pub struct IntentStore {
    intents: Vec<Intent>,
}

impl IntentStore {
    /// Parse the intents file.
    ///
    /// Distinguishes an unreadable file (I/O) from an unparseable one
    /// (YAML) so the selector can surface the right failure to the model.
    /// A missing file loads as an empty store.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let metadata = match std::fs::metadata(path) {
            Ok(m) => m,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self { intents: Vec::new() });
            }
            Err(err) => {
                return Err(LoadError::Unreadable {
                    path: path.display().to_string(),
                    detail: err.to_string(),
                });
            }
        };
        if metadata.len() > MAX_INTENTS_FILE_SIZE {
            return Err(LoadError::Unreadable {
                path: path.display().to_string(),
                detail: format!("file exceeds {MAX_INTENTS_FILE_SIZE} bytes"),
            });
        }

        let text = std::fs::read_to_string(path).map_err(|err| LoadError::Unreadable {
            path: path.display().to_string(),
            detail: err.to_string(),
        })?;

        let parsed: IntentsFile = serde_yaml::from_str(&text).map_err(|err| LoadError::Unparseable {
            path: path.display().to_string(),
            detail: err.to_string(),
        })?;

        Ok(Self {
            intents: parsed.active_intents,
        })
    }

    pub fn find(&self, id: &str) -> Option<&Intent> {
        self.intents.iter().find(|i| i.id == id)
    }

    /// All intents currently in progress, in file order.
    pub fn in_progress(&self) -> Vec<&Intent> {
        self.intents.iter().filter(|i| i.is_selectable()).collect()
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }
}
