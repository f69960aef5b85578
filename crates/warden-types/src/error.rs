//! Error types shared across all Warden crates.

/// Errors that can occur across the Warden middleware.
///
/// Each variant corresponds to a different subsystem: the intent store,
/// the hook engine, the ledger sidecars, the classifiers, or configuration.
#[derive(Debug, thiserror::Error)]
pub enum WardenError {
    /// Intent file loading or validation failure.
    #[error("intent store error: {0}")]
    IntentError(String),

    /// Hook registration or dispatch failure.
    #[error("hook engine error: {0}")]
    HookError(String),

    /// Ledger sidecar (trace, decisions, lessons) read/write failure.
    #[error("ledger error: {0}")]
    LedgerError(String),

    /// Command, tool, or user-intent classification failure.
    #[error("classification error: {0}")]
    ClassifyError(String),

    /// Session state violation (e.g., concurrent dispatch on one session).
    #[error("session error: {0}")]
    SessionError(String),

    /// Configuration loading or validation error.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Underlying filesystem I/O failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
