//! Tool handlers: the side-effecting half of the pipeline.
//!
//! The host supplies its own handlers for its tool surface; the trait here
//! is the seam. Two built-ins ship with the middleware: the
//! intent-selection acknowledgement and a filesystem write handler that
//! performs the final optimistic re-check immediately before the bytes
//! land, closing the time-of-check/time-of-use window.

use async_trait::async_trait;

use warden_gate::check_optimistic_lock;
use warden_gate::paths::normalize_path;
use warden_types::{SessionState, ToolArgs, ToolCall, Violation, ViolationKind};

/// One tool's execution logic.
///
/// Handlers run only after every pre-hook allowed the call. A handler
/// error is returned to the model as a structured violation and still
/// triggers the post-hook sweep.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn handle(&self, session: &mut SessionState, call: &ToolCall)
        -> Result<String, Violation>;
}

/// Acknowledges the intent-selection handshake.
///
/// The selection itself happens in the pre-hook; by the time the handler
/// runs the session already carries the active intent and the injected
/// context block.
#[derive(Debug, Default)]
pub struct SelectIntentHandler;

#[async_trait]
impl ToolHandler for SelectIntentHandler {
    async fn handle(
        &self,
        session: &mut SessionState,
        call: &ToolCall,
    ) -> Result<String, Violation> {
        match &session.active_intent {
            Some(active) => Ok(format!("Active intent set to {}", active.id)),
            None => Err(Violation::new(
                ViolationKind::MissingIntent,
                &call.name,
                "no intent was bound to the session",
            )),
        }
    }
}

/// Whole-file write with the final stale re-check.
#[derive(Debug, Default)]
pub struct WriteFileHandler;

#[async_trait]
impl ToolHandler for WriteFileHandler {
    async fn handle(
        &self,
        session: &mut SessionState,
        call: &ToolCall,
    ) -> Result<String, Violation> {
        let (path, body) = match &call.args {
            ToolArgs::Write { path, body, .. } => (path.clone(), body.clone()),
            _ => {
                return Err(Violation::new(
                    ViolationKind::MissingParameter,
                    &call.name,
                    "write_file requires path and body arguments",
                ));
            }
        };

        // Final read-and-compare just before writing. Another agent may
        // have touched the file since the snapshot hook ran.
        check_optimistic_lock(session, &call.id, &path, &call.name)?;

        let normalized = normalize_path(&path, &session.working_dir);
        let on_disk = session.working_dir.join(&normalized);
        if let Some(parent) = on_disk.parent() {
            if let Err(err) = std::fs::create_dir_all(parent) {
                return Err(Violation::new(
                    ViolationKind::AccessDenied,
                    &call.name,
                    format!("cannot create {}: {err}", parent.display()),
                ));
            }
        }
        if let Err(err) = std::fs::write(&on_disk, &body) {
            return Err(Violation::new(
                ViolationKind::WriteProtected,
                &call.name,
                format!("cannot write {normalized}: {err}"),
            )
            .with_path(normalized));
        }

        // A successful write brings the path back in sync.
        session.clear_stale(&normalized);
        tracing::debug!(path = %normalized, bytes = body.len(), "file written");
        Ok(format!("Wrote {normalized}"))
    }
}
