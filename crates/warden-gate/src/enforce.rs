//! The scope-enforcement gate: the central policy pre-hook.
//!
//! Runs before every non-partial tool call and applies, in order: the
//! active-intent requirement, the ignore-list bypass, the user-intent
//! preflight, command authorization, stale-block overrides, metadata
//! injection and validation, the destructive-operation preflight, the
//! unknown-targets prompt, and the owned-scope check. The first failing
//! check vetoes the call with a structured violation; every human prompt
//! leaves a decision record in the session cache and the shared ledger.

use std::sync::Arc;

use async_trait::async_trait;

use warden_hooks::{Hook, HookPhase, PreHookOutcome};
use warden_intents::IgnoreList;
use warden_ledger::{DecisionLog, DiagnosticsLog};
use warden_policy::command::{unwrap_shell_wrapper, CommandClassifier};
use warden_policy::{ToolCatalog, UserIntentClassifier};
use warden_types::{
    ApprovalHandler, ApprovalRequest, CommandClass, Decision, DecisionOutcome, MutationClass,
    OrchestrationPaths, SessionState, ToolCall, Violation, ViolationKind, WardenError,
    SELECT_INTENT_TOOL,
};

use crate::paths::{extract_targets, patch_is_destructive};
use crate::scope::path_in_scope;

/// The central policy hook.
pub struct ScopeGateHook {
    catalog: Arc<ToolCatalog>,
    approval: Arc<dyn ApprovalHandler>,
    user_intent: UserIntentClassifier,
    paths: OrchestrationPaths,
}

impl ScopeGateHook {
    pub fn new(
        catalog: Arc<ToolCatalog>,
        approval: Arc<dyn ApprovalHandler>,
        user_intent: UserIntentClassifier,
        paths: OrchestrationPaths,
    ) -> Self {
        Self {
            catalog,
            approval,
            user_intent,
            paths,
        }
    }

    /// Prompt the human, then record the outcome in the shared decisions
    /// ledger and the session cache under `cache_key`.
    async fn prompt_and_record(
        &self,
        session: &mut SessionState,
        cache_key: String,
        request: ApprovalRequest,
        mut decision: Decision,
    ) -> bool {
        let approved = self.approval.confirm(&request).await;
        decision.decision = if approved {
            DecisionOutcome::Approved
        } else {
            DecisionOutcome::Rejected
        };

        if let Err(err) = DecisionLog::new(self.paths.decisions_file.clone()).append(&decision) {
            tracing::warn!(error = %err, "failed to persist HITL decision");
        }
        session.decision_cache.insert(cache_key, decision);
        approved
    }

    fn diagnostics(&self) -> DiagnosticsLog {
        DiagnosticsLog::new(self.paths.diagnostics_file.clone())
    }

    /// Step 5: the command-execution branch.
    async fn check_command(
        &self,
        session: &mut SessionState,
        call: &ToolCall,
        intent_id: &str,
    ) -> Result<PreHookOutcome, WardenError> {
        let command = call.args.command().unwrap_or("").trim().to_string();
        if command.is_empty() {
            return Ok(PreHookOutcome::proceed());
        }

        let inner = unwrap_shell_wrapper(&command).to_string();
        let class = CommandClassifier::load(&self.paths.root).classify_debug(&inner);
        let cache_key = format!("cmd|{intent_id}|{command}");

        if class == CommandClass::Safe {
            session.approved_commands.insert(cache_key.clone());
            let decision = Decision::new(&call.name, DecisionOutcome::Approved, "safe_command")
                .with_intent(intent_id)
                .with_command(&command, CommandClass::Safe);
            if let Err(err) = DecisionLog::new(self.paths.decisions_file.clone()).append(&decision) {
                tracing::warn!(error = %err, "failed to persist safe-command decision");
            }
            session.decision_cache.insert(cache_key, decision);
            return Ok(PreHookOutcome::proceed());
        }

        // Destructive: reuse an earlier approval for the identical
        // (intent, command) pair before prompting.
        if session.approved_commands.contains(&cache_key) {
            return Ok(PreHookOutcome::proceed());
        }
        let persisted = DecisionLog::new(self.paths.decisions_file.clone())
            .has_command_approval(&call.name, &command, intent_id)
            .unwrap_or(false);
        if persisted {
            tracing::debug!(command = %command, "reusing persisted command approval");
            session.approved_commands.insert(cache_key);
            return Ok(PreHookOutcome::proceed());
        }

        let request = ApprovalRequest::new(
            "destructive_command",
            format!("Run destructive command: {command}"),
            &call.name,
        )
        .with_command(&command);
        let decision = Decision::new(&call.name, DecisionOutcome::Rejected, "destructive_command")
            .with_intent(intent_id)
            .with_command(&command, CommandClass::Destructive);

        if self
            .prompt_and_record(session, cache_key.clone(), request, decision)
            .await
        {
            session.approved_commands.insert(cache_key);
            Ok(PreHookOutcome::proceed())
        } else {
            self.diagnostics().record(
                "scope_gate",
                "command_denied",
                Some(&call.name),
                Some(intent_id),
            );
            Ok(PreHookOutcome::veto(
                Violation::new(
                    ViolationKind::CommandNotAuthorized,
                    &call.name,
                    format!("command {command:?} was not authorized"),
                )
                .with_intent(intent_id)
                .with_command(command),
            ))
        }
    }
}

#[async_trait]
impl Hook for ScopeGateHook {
    fn name(&self) -> &str {
        "scope-gate"
    }

    fn phase(&self) -> HookPhase {
        HookPhase::Pre
    }

    async fn run_pre(
        &self,
        session: &mut SessionState,
        call: &mut ToolCall,
    ) -> Result<PreHookOutcome, WardenError> {
        // Step 1: partial calls and the handshake itself pass through.
        if call.partial || call.name == SELECT_INTENT_TOOL {
            return Ok(PreHookOutcome::proceed());
        }

        let tool = call.name.clone();
        let is_command = tool == self.catalog.command_tool();
        let destructive_tool = self.catalog.is_destructive(&tool);
        let mutating = self.catalog.is_mutating(&tool);
        let active = session.active_intent.clone();

        // Step 2: destructive tools require an active intent.
        if destructive_tool && active.is_none() {
            return Ok(PreHookOutcome::veto(Violation::new(
                ViolationKind::NoActiveIntent,
                &tool,
                "no active intent; call select_active_intent before mutating the workspace",
            )));
        }

        // Step 3: intents on the ignore list bypass all remaining checks.
        if let Some(active) = &active {
            if IgnoreList::load(&self.paths.ignore_file).contains(&active.id) {
                self.diagnostics()
                    .record("scope_gate", "ignore_bypass", Some(&tool), Some(&active.id));
                return Ok(PreHookOutcome::proceed());
            }
        }

        let working_dir = session.working_dir.clone();
        let targets = extract_targets(&call.args, &working_dir);

        // Step 4: user-intent preflight for non-destructive, non-command
        // tools. Destructive tools get the same signal in step 8.
        if !destructive_tool && !is_command {
            if let Some(message) = session.last_user_message.clone() {
                let classification = self.user_intent.classify(session, &message).await;
                if classification.is_destructive() {
                    let cache_key = format!(
                        "{}|{}:{}",
                        classification.message_hash,
                        tool,
                        targets.join(",")
                    );
                    let approved = match session.decision_cache.get(&cache_key) {
                        Some(cached) => cached.approved(),
                        None => {
                            let request = ApprovalRequest::new(
                                "destructive_intent",
                                format!("The request was classified destructive; allow {tool}?"),
                                &tool,
                            )
                            .with_targets(targets.clone());
                            let decision =
                                Decision::new(&tool, DecisionOutcome::Rejected, "destructive_intent")
                                    .with_targets(targets.clone())
                                    .with_intent_classification(classification.verdict);
                            self.prompt_and_record(session, cache_key, request, decision)
                                .await
                        }
                    };
                    if !approved {
                        return Ok(PreHookOutcome::veto(
                            Violation::new(
                                ViolationKind::DestructiveIntentDenied,
                                &tool,
                                "the user's request was classified destructive and was not approved",
                            )
                            .with_targets(targets),
                        ));
                    }
                }
            }
            return Ok(PreHookOutcome::proceed());
        }

        // Only destructive tools get past step 4, and step 2 vetoed any
        // destructive call without an intent. An `Err` here surfaces as a
        // synthesized veto, so a catalog change that breaks the invariant
        // fails loudly instead of slipping through.
        let active = match active {
            Some(active) => active,
            None => {
                return Err(WardenError::HookError(format!(
                    "gate invariant broken: destructive tool {tool:?} reached scope checks \
                     without an active intent"
                )));
            }
        };

        // Step 5: the command tool is governed by command classification,
        // not path checks.
        if is_command {
            return self.check_command(session, call, &active.id).await;
        }

        // With the command branch gone, a destructive tool must be
        // mutating (destructive = mutating plus the command tool).
        if !mutating {
            return Err(WardenError::HookError(format!(
                "gate invariant broken: {tool:?} is destructive but neither mutating nor \
                 the command tool"
            )));
        }

        // Step 6: stale-blocked paths need an explicit override.
        for target in &targets {
            if session.stale_blocks.contains_key(target) {
                let cache_key = format!("stale|{target}");
                let request = ApprovalRequest::new(
                    "stale_override",
                    format!("{target} is out of sync with its last snapshot; mutate anyway?"),
                    &tool,
                )
                .with_targets(vec![target.clone()]);
                let decision = Decision::new(&tool, DecisionOutcome::Rejected, "stale_override")
                    .with_intent(&active.id)
                    .with_targets(vec![target.clone()]);

                if self
                    .prompt_and_record(session, cache_key, request, decision)
                    .await
                {
                    session.clear_stale(target);
                } else {
                    return Ok(PreHookOutcome::veto(
                        Violation::new(
                            ViolationKind::StaleLock,
                            &tool,
                            format!("{target} is stale-blocked; re-read it before mutating"),
                        )
                        .with_intent(&active.id)
                        .with_path(target.clone()),
                    ));
                }
            }
        }

        // Step 7: provenance metadata. Reject bad values, inject defaults,
        // and enforce agreement with the session's active intent.
        if let Some(Err(raw)) = call.args.mutation_class() {
            return Ok(PreHookOutcome::veto(
                Violation::new(
                    ViolationKind::InvalidMetadata,
                    &tool,
                    format!("mutation_class {raw:?} is not one of AST_REFACTOR, INTENT_EVOLUTION"),
                )
                .with_intent(&active.id)
                .with_mutation_class(raw),
            ));
        }
        if let Some(provided) = call.args.intent_id() {
            if provided != active.id {
                return Ok(PreHookOutcome::veto(
                    Violation::new(
                        ViolationKind::IntentMismatch,
                        &tool,
                        format!(
                            "call declares intent {provided:?} but the active intent is {:?}",
                            active.id
                        ),
                    )
                    .with_intent(&active.id)
                    .with_provided_intent(provided),
                ));
            }
        }
        call.args
            .inject_metadata(&active.id, MutationClass::IntentEvolution);

        // Step 8: deletion/move payloads and destructive user intent need a
        // preflight prompt regardless of scope.
        let payload_destructive = call
            .args
            .patch_body()
            .is_some_and(patch_is_destructive);
        let message_destructive = match session.last_user_message.clone() {
            Some(message) => {
                self.user_intent
                    .classify(session, &message)
                    .await
                    .is_destructive()
            }
            None => false,
        };
        if payload_destructive || message_destructive {
            let cache_key = format!("destructive|{}|{}|{}", active.id, tool, targets.join(","));
            if !session.destructive_approvals.contains(&cache_key) {
                let summary = if payload_destructive {
                    format!("The payload deletes or moves files: {}", targets.join(", "))
                } else {
                    format!("The request was classified destructive; allow {tool}?")
                };
                let request = ApprovalRequest::new("destructive_operation", summary, &tool)
                    .with_targets(targets.clone());
                let decision =
                    Decision::new(&tool, DecisionOutcome::Rejected, "destructive_operation")
                        .with_intent(&active.id)
                        .with_targets(targets.clone());

                if self
                    .prompt_and_record(session, cache_key.clone(), request, decision)
                    .await
                {
                    session.destructive_approvals.insert(cache_key);
                } else {
                    return Ok(PreHookOutcome::veto(
                        Violation::new(
                            ViolationKind::DestructiveOperationDenied,
                            &tool,
                            "destructive operation was not approved",
                        )
                        .with_intent(&active.id)
                        .with_targets(targets),
                    ));
                }
            }
        }

        // Step 9: a mutating call with no recognizable targets cannot be
        // scope-checked; ask.
        if targets.is_empty() {
            let cache_key = format!("unknown_targets|{tool}");
            let approved = match session.decision_cache.get(&cache_key) {
                Some(cached) => cached.approved(),
                None => {
                    let request = ApprovalRequest::new(
                        "unknown_targets",
                        format!("{tool} mutates the workspace but its targets are unknown; allow?"),
                        &tool,
                    );
                    let decision =
                        Decision::new(&tool, DecisionOutcome::Rejected, "unknown_targets")
                            .with_intent(&active.id);
                    self.prompt_and_record(session, cache_key, request, decision)
                        .await
                }
            };
            if approved {
                return Ok(PreHookOutcome::proceed());
            }
            return Ok(PreHookOutcome::veto(
                Violation::new(
                    ViolationKind::UnknownTargets,
                    &tool,
                    "target paths could not be determined for a mutating call",
                )
                .with_intent(&active.id),
            ));
        }

        // Step 10: every target must fall inside the owned scope.
        for target in &targets {
            if path_in_scope(&active.owned_scope, target) {
                continue;
            }
            let cache_key = format!("scope|{}|{target}", active.id);
            let approved = match session.decision_cache.get(&cache_key) {
                Some(cached) => cached.approved(),
                None => {
                    let request = ApprovalRequest::new(
                        "scope_violation",
                        format!("{target} is outside the scope of intent {}; allow?", active.id),
                        &tool,
                    )
                    .with_targets(vec![target.clone()]);
                    let decision =
                        Decision::new(&tool, DecisionOutcome::Rejected, "scope_violation")
                            .with_intent(&active.id)
                            .with_targets(vec![target.clone()]);
                    self.prompt_and_record(session, cache_key, request, decision)
                        .await
                }
            };
            if !approved {
                self.diagnostics().record(
                    "scope_gate",
                    "scope_violation",
                    Some(&tool),
                    Some(&active.id),
                );
                return Ok(PreHookOutcome::veto(
                    Violation::new(
                        ViolationKind::ScopeViolation,
                        &tool,
                        format!("{target} is outside the owned scope of intent {}", active.id),
                    )
                    .with_intent(&active.id)
                    .with_filename(target.clone()),
                ));
            }
        }

        Ok(PreHookOutcome::proceed())
    }
}
