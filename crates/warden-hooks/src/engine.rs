//! Hook trait, registry, and the dispatch contract.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use warden_types::{SessionState, ToolCall, Violation, ViolationKind, WardenError};

/// Which side of the tool handler a hook runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPhase {
    Pre,
    Post,
}

/// What a pre-hook decided about the call.
///
/// Hooks mutate the call in place (metadata injection); `injected_context`
/// strings from successive hooks are concatenated by the engine.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PreHookOutcome {
    pub proceed: bool,
    pub error: Option<Violation>,
    pub injected_context: Option<String>,
}

impl PreHookOutcome {
    /// Let the call continue.
    pub fn proceed() -> Self {
        Self {
            proceed: true,
            error: None,
            injected_context: None,
        }
    }

    /// Continue and hand a context string to the conversation.
    pub fn proceed_with_context(context: impl Into<String>) -> Self {
        Self {
            proceed: true,
            error: None,
            injected_context: Some(context.into()),
        }
    }

    /// Stop the call with a structured violation.
    pub fn veto(violation: Violation) -> Self {
        Self {
            proceed: false,
            error: Some(violation),
            injected_context: None,
        }
    }
}

/// What a post-hook reported after the handler ran.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PostHookOutcome {
    pub success: bool,
    pub error: Option<String>,
    pub side_effects: Vec<String>,
}

impl PostHookOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
            side_effects: Vec::new(),
        }
    }

    pub fn ok_with_side_effect(side_effect: impl Into<String>) -> Self {
        Self {
            success: true,
            error: None,
            side_effects: vec![side_effect.into()],
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            side_effects: Vec::new(),
        }
    }
}

/// The result of one tool invocation, as seen by post-hooks and the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub call_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Violation>,
}

impl ToolResult {
    pub fn ok(call_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            success: true,
            output: Some(output.into()),
            error: None,
        }
    }

    pub fn error(call_id: impl Into<String>, violation: Violation) -> Self {
        Self {
            call_id: call_id.into(),
            success: false,
            output: None,
            error: Some(violation),
        }
    }
}

/// A middleware hook.
///
/// A hook declares its phase and an optional tool filter; the default
/// filter matches every tool. Hooks with `Pre` phase implement `run_pre`,
/// hooks with `Post` phase implement `run_post`; the unused method's
/// default is a no-op so single-phase hooks stay small.
#[async_trait]
pub trait Hook: Send + Sync {
    fn name(&self) -> &str;

    fn phase(&self) -> HookPhase;

    /// Whether this hook applies to calls of the given tool.
    fn applies_to(&self, _tool: &str) -> bool {
        true
    }

    async fn run_pre(
        &self,
        _session: &mut SessionState,
        _call: &mut ToolCall,
    ) -> Result<PreHookOutcome, WardenError> {
        Ok(PreHookOutcome::proceed())
    }

    async fn run_post(
        &self,
        _session: &mut SessionState,
        _call: &ToolCall,
        _result: &ToolResult,
    ) -> Result<PostHookOutcome, WardenError> {
        Ok(PostHookOutcome::ok())
    }
}

/// The aggregated result of the pre-hook chain.
#[derive(Debug, Clone, PartialEq)]
pub struct PreDispatch {
    pub proceed: bool,
    pub error: Option<Violation>,
    /// Context strings from all hooks that injected one, concatenated in
    /// hook order and separated by newlines.
    pub injected_context: Option<String>,
    /// Name of the hook that vetoed, when `proceed` is false.
    pub vetoed_by: Option<String>,
}

/// Per-hook record from the post-hook sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct PostHookReport {
    pub hook: String,
    pub outcome: PostHookOutcome,
}

/// Ordered hook registry.
///
/// Registration order is execution order within each phase.
#[derive(Default)]
pub struct HookRegistry {
    hooks: Vec<Arc<dyn Hook>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    pub fn register(&mut self, hook: Arc<dyn Hook>) {
        tracing::debug!(hook = hook.name(), "registered hook");
        self.hooks.push(hook);
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    /// Run all matching pre-hooks in order.
    ///
    /// Stops at the first veto and surfaces its violation without invoking
    /// later hooks. A hook returning `Err` is treated as a veto with a
    /// synthesized message. Injected context accumulates across hooks;
    /// argument modifications are applied in place, so a later hook
    /// overwrites an earlier one's changes.
    pub async fn execute_pre(&self, session: &mut SessionState, call: &mut ToolCall) -> PreDispatch {
        let mut context: Vec<String> = Vec::new();
        let tool = call.name.clone();

        for hook in self.matching(HookPhase::Pre, &tool) {
            let outcome = match hook.run_pre(session, call).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    tracing::warn!(hook = hook.name(), error = %err, "pre-hook failed");
                    PreHookOutcome::veto(Violation::new(
                        ViolationKind::AccessDenied,
                        call.name.clone(),
                        format!("hook '{}' failed: {err}", hook.name()),
                    ))
                }
            };

            if let Some(ctx) = outcome.injected_context {
                context.push(ctx);
            }

            if !outcome.proceed {
                let violation = outcome.error.unwrap_or_else(|| {
                    Violation::new(
                        ViolationKind::AccessDenied,
                        call.name.clone(),
                        format!("hook '{}' vetoed the call", hook.name()),
                    )
                });
                tracing::debug!(
                    hook = hook.name(),
                    tool = %call.name,
                    code = %violation.code,
                    "pre-hook veto"
                );
                return PreDispatch {
                    proceed: false,
                    error: Some(violation),
                    injected_context: joined(context),
                    vetoed_by: Some(hook.name().to_string()),
                };
            }
        }

        PreDispatch {
            proceed: true,
            error: None,
            injected_context: joined(context),
            vetoed_by: None,
        }
    }

    /// Run all matching post-hooks unconditionally, collecting one report
    /// per hook. Failures are logged but never fail the tool call.
    pub async fn execute_post(
        &self,
        session: &mut SessionState,
        call: &ToolCall,
        result: &ToolResult,
    ) -> Vec<PostHookReport> {
        let mut reports = Vec::new();

        for hook in self.matching(HookPhase::Post, &call.name) {
            let outcome = match hook.run_post(session, call, result).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    tracing::warn!(hook = hook.name(), error = %err, "post-hook failed");
                    PostHookOutcome::failed(err.to_string())
                }
            };
            if !outcome.success {
                tracing::warn!(
                    hook = hook.name(),
                    tool = %call.name,
                    error = outcome.error.as_deref().unwrap_or("unknown"),
                    "post-hook reported failure"
                );
            }
            reports.push(PostHookReport {
                hook: hook.name().to_string(),
                outcome,
            });
        }

        reports
    }

    fn matching<'a>(&'a self, phase: HookPhase, tool: &'a str) -> impl Iterator<Item = &'a Arc<dyn Hook>> + 'a {
        self.hooks
            .iter()
            .filter(move |h| h.phase() == phase && h.applies_to(tool))
    }
}

fn joined(context: Vec<String>) -> Option<String> {
    if context.is_empty() {
        None
    } else {
        Some(context.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use warden_types::{ToolArgs, ViolationKind};

    fn call(name: &str) -> ToolCall {
        ToolCall::new("call-1", name, ToolArgs::ExecuteCommand { command: "ls".into() })
    }

    fn session() -> SessionState {
        SessionState::new("s1", "/tmp/ws")
    }

    struct RecordingHook {
        name: String,
        phase: HookPhase,
        outcome: PreHookOutcome,
        runs: AtomicUsize,
        only_tool: Option<String>,
    }

    impl RecordingHook {
        fn pre(name: &str, outcome: PreHookOutcome) -> Self {
            Self {
                name: name.into(),
                phase: HookPhase::Pre,
                outcome,
                runs: AtomicUsize::new(0),
                only_tool: None,
            }
        }
    }

    #[async_trait]
    impl Hook for RecordingHook {
        fn name(&self) -> &str {
            &self.name
        }

        fn phase(&self) -> HookPhase {
            self.phase
        }

        fn applies_to(&self, tool: &str) -> bool {
            self.only_tool.as_deref().map_or(true, |t| t == tool)
        }

        async fn run_pre(
            &self,
            _session: &mut SessionState,
            _call: &mut ToolCall,
        ) -> Result<PreHookOutcome, WardenError> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(self.outcome.clone())
        }
    }

    struct FailingHook;

    #[async_trait]
    impl Hook for FailingHook {
        fn name(&self) -> &str {
            "failing"
        }

        fn phase(&self) -> HookPhase {
            HookPhase::Pre
        }

        async fn run_pre(
            &self,
            _session: &mut SessionState,
            _call: &mut ToolCall,
        ) -> Result<PreHookOutcome, WardenError> {
            Err(WardenError::HookError("boom".into()))
        }
    }

    #[tokio::test]
    async fn pre_hooks_run_in_registration_order_and_accumulate_context() {
        let mut registry = HookRegistry::new();
        registry.register(Arc::new(RecordingHook::pre(
            "first",
            PreHookOutcome::proceed_with_context("alpha"),
        )));
        registry.register(Arc::new(RecordingHook::pre(
            "second",
            PreHookOutcome::proceed_with_context("beta"),
        )));

        let mut session = session();
        let mut call = call("execute_command");
        let dispatch = registry.execute_pre(&mut session, &mut call).await;

        assert!(dispatch.proceed);
        assert_eq!(dispatch.injected_context.as_deref(), Some("alpha\nbeta"));
    }

    #[tokio::test]
    async fn first_veto_short_circuits() {
        let veto = PreHookOutcome::veto(Violation::new(
            ViolationKind::ScopeViolation,
            "execute_command",
            "nope",
        ));
        let after = Arc::new(RecordingHook::pre("after", PreHookOutcome::proceed()));

        let mut registry = HookRegistry::new();
        registry.register(Arc::new(RecordingHook::pre("vetoer", veto)));
        registry.register(after.clone());

        let mut session = session();
        let mut call = call("execute_command");
        let dispatch = registry.execute_pre(&mut session, &mut call).await;

        assert!(!dispatch.proceed);
        assert_eq!(dispatch.vetoed_by.as_deref(), Some("vetoer"));
        assert_eq!(dispatch.error.unwrap().code, "REQ-001");
        assert_eq!(after.runs.load(Ordering::SeqCst), 0, "later hooks must not run");
    }

    #[tokio::test]
    async fn hook_error_becomes_synthesized_veto() {
        let mut registry = HookRegistry::new();
        registry.register(Arc::new(FailingHook));

        let mut session = session();
        let mut call = call("execute_command");
        let dispatch = registry.execute_pre(&mut session, &mut call).await;

        assert!(!dispatch.proceed);
        let violation = dispatch.error.unwrap();
        assert!(violation.message.contains("failing"));
        assert!(violation.message.contains("boom"));
    }

    #[tokio::test]
    async fn tool_filter_skips_non_matching_hooks() {
        let filtered = Arc::new(RecordingHook {
            name: "filtered".into(),
            phase: HookPhase::Pre,
            outcome: PreHookOutcome::proceed(),
            runs: AtomicUsize::new(0),
            only_tool: Some("write_file".into()),
        });
        let mut registry = HookRegistry::new();
        registry.register(filtered.clone());

        let mut session = session();
        let mut call = call("execute_command");
        registry.execute_pre(&mut session, &mut call).await;
        assert_eq!(filtered.runs.load(Ordering::SeqCst), 0);

        let mut write_call = call_for_write();
        registry.execute_pre(&mut session, &mut write_call).await;
        assert_eq!(filtered.runs.load(Ordering::SeqCst), 1);
    }

    fn call_for_write() -> ToolCall {
        ToolCall::new(
            "call-2",
            "write_file",
            ToolArgs::Write {
                path: "a".into(),
                body: "b".into(),
                intent_id: None,
                mutation_class: None,
            },
        )
    }

    struct PostHookStub {
        outcome: PostHookOutcome,
    }

    #[async_trait]
    impl Hook for PostHookStub {
        fn name(&self) -> &str {
            "post-stub"
        }

        fn phase(&self) -> HookPhase {
            HookPhase::Post
        }

        async fn run_post(
            &self,
            _session: &mut SessionState,
            _call: &ToolCall,
            _result: &ToolResult,
        ) -> Result<PostHookOutcome, WardenError> {
            Ok(self.outcome.clone())
        }
    }

    #[tokio::test]
    async fn post_hooks_collect_reports_and_never_fail_the_call() {
        let mut registry = HookRegistry::new();
        registry.register(Arc::new(PostHookStub {
            outcome: PostHookOutcome::failed("ledger unavailable"),
        }));
        registry.register(Arc::new(PostHookStub {
            outcome: PostHookOutcome::ok_with_side_effect("trace appended"),
        }));

        let mut session = session();
        let call = call("execute_command");
        let result = ToolResult::ok("call-1", "done");
        let reports = registry.execute_post(&mut session, &call, &result).await;

        assert_eq!(reports.len(), 2);
        assert!(!reports[0].outcome.success);
        assert!(reports[1].outcome.success);
        assert_eq!(reports[1].outcome.side_effects, vec!["trace appended"]);
    }
}
