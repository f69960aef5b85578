//! The per-session dispatch loop.
//!
//! One call at a time: pre-hooks, then the handler, then the post-hook
//! sweep. A pre-hook veto returns the structured violation as the tool
//! result without invoking the handler or the post-hooks; a handler error
//! still triggers the post-hooks. Cancellation is the host simply ceasing
//! to dispatch further calls.

use std::collections::HashMap;
use std::sync::Arc;

use warden_hooks::{HookRegistry, PostHookReport, ToolResult};
use warden_types::{SessionState, ToolCall, Violation, ViolationKind, WardenError};

use crate::handlers::ToolHandler;

/// Everything one dispatch produced.
#[derive(Debug)]
pub struct DispatchOutcome {
    pub result: ToolResult,
    /// Context injected by pre-hooks, for the host to place into the
    /// conversation (the intent-selection handshake uses this).
    pub injected_context: Option<String>,
    /// Per-hook reports from the post sweep; empty when the call was
    /// vetoed before the handler ran.
    pub post_reports: Vec<PostHookReport>,
}

/// The dispatch driver: hook registry plus the tool handler table.
pub struct Driver {
    registry: HookRegistry,
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
}

impl Driver {
    pub fn new(registry: HookRegistry) -> Self {
        Self {
            registry,
            handlers: HashMap::new(),
        }
    }

    pub fn register_handler(&mut self, tool: impl Into<String>, handler: Arc<dyn ToolHandler>) {
        self.handlers.insert(tool.into(), handler);
    }

    pub fn has_handler(&self, tool: &str) -> bool {
        self.handlers.contains_key(tool)
    }

    /// Dispatch one tool call through the pipeline.
    ///
    /// Returns an error only for host misuse (a second in-flight call on
    /// the same session, an unregistered tool); governance failures are
    /// carried inside the returned [`ToolResult`].
    pub async fn dispatch(
        &self,
        session: &mut SessionState,
        call: ToolCall,
    ) -> Result<DispatchOutcome, WardenError> {
        if !session.begin_dispatch() {
            return Err(WardenError::SessionError(format!(
                "session {} already has a tool call in flight",
                session.session_id
            )));
        }
        let outcome = self.dispatch_locked(session, call).await;
        session.end_dispatch();
        outcome
    }

    async fn dispatch_locked(
        &self,
        session: &mut SessionState,
        mut call: ToolCall,
    ) -> Result<DispatchOutcome, WardenError> {
        tracing::debug!(tool = %call.name, call = %call.id, partial = call.partial, "dispatching");

        let pre = self.registry.execute_pre(session, &mut call).await;
        if !pre.proceed {
            let violation = pre.error.unwrap_or_else(|| {
                Violation::new(ViolationKind::AccessDenied, &call.name, "call was vetoed")
            });
            tracing::info!(
                tool = %call.name,
                code = %violation.code,
                vetoed_by = pre.vetoed_by.as_deref().unwrap_or("unknown"),
                "tool call vetoed"
            );
            return Ok(DispatchOutcome {
                result: ToolResult::error(&call.id, violation),
                injected_context: pre.injected_context,
                post_reports: Vec::new(),
            });
        }

        // Partial calls never reach handlers; the host re-dispatches the
        // completed call when streaming finishes.
        if call.partial {
            return Ok(DispatchOutcome {
                result: ToolResult::ok(&call.id, ""),
                injected_context: pre.injected_context,
                post_reports: Vec::new(),
            });
        }

        let handler = self.handlers.get(&call.name).ok_or_else(|| {
            WardenError::HookError(format!("no handler registered for tool {:?}", call.name))
        })?;

        let result = match handler.handle(session, &call).await {
            Ok(output) => ToolResult::ok(&call.id, output),
            Err(violation) => {
                tracing::info!(tool = %call.name, code = %violation.code, "handler failed");
                ToolResult::error(&call.id, violation)
            }
        };

        let post_reports = self.registry.execute_post(session, &call, &result).await;

        Ok(DispatchOutcome {
            result,
            injected_context: pre.injected_context,
            post_reports,
        })
    }
}
