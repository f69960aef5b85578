//! The `select_active_intent` pre-hook.
//!
//! Resolves the requested intent, requires it to be in progress, renders
//! the context block, and binds it to the session. When the call omits the
//! id but exactly one intent is in progress, that intent is auto-selected;
//! any other omission is a structured `missing_intent` veto.

use async_trait::async_trait;

use warden_hooks::{Hook, HookPhase, PreHookOutcome};
use warden_ledger::{LessonsLog, TraceLog};
use warden_types::{
    ActiveIntent, Contributor, OrchestrationPaths, SessionState, ToolCall, Violation,
    ViolationKind, WardenError, SELECT_INTENT_TOOL,
};

use crate::context::{render_context_block, BRIEF_HISTORY_LEN};
use crate::store::IntentStore;

/// Pre-hook bound to the intent-selection tool.
pub struct SelectIntentHook {
    paths: OrchestrationPaths,
    contributor: Contributor,
}

impl SelectIntentHook {
    pub fn new(paths: OrchestrationPaths, contributor: Contributor) -> Self {
        Self { paths, contributor }
    }

    fn veto(&self, kind: ViolationKind, message: String) -> PreHookOutcome {
        PreHookOutcome::veto(Violation::new(kind, SELECT_INTENT_TOOL, message))
    }
}

#[async_trait]
impl Hook for SelectIntentHook {
    fn name(&self) -> &str {
        "intent-selector"
    }

    fn phase(&self) -> HookPhase {
        HookPhase::Pre
    }

    fn applies_to(&self, tool: &str) -> bool {
        tool == SELECT_INTENT_TOOL
    }

    async fn run_pre(
        &self,
        session: &mut SessionState,
        call: &mut ToolCall,
    ) -> Result<PreHookOutcome, WardenError> {
        if call.partial {
            return Ok(PreHookOutcome::proceed());
        }

        let store = match IntentStore::load(&self.paths.intents_file) {
            Ok(store) => store,
            Err(err @ crate::store::LoadError::Unparseable { .. }) => {
                return Ok(self.veto(ViolationKind::ParseError, err.to_string()));
            }
            Err(err) => {
                return Ok(self.veto(ViolationKind::AccessDenied, err.to_string()));
            }
        };

        let requested = call.args.intent_id().map(String::from);
        let intent = match requested {
            Some(id) => match store.find(&id) {
                Some(intent) => intent.clone(),
                None => {
                    return Ok(self.veto(
                        ViolationKind::MissingIntent,
                        format!("no intent with id {id:?} is registered"),
                    ));
                }
            },
            None => {
                // Soft fallback: a lone in-progress intent selects itself.
                let in_progress = store.in_progress();
                match in_progress.as_slice() {
                    [only] => {
                        tracing::debug!(intent = %only.id, "auto-selected sole in-progress intent");
                        (*only).clone()
                    }
                    _ => {
                        return Ok(self.veto(
                            ViolationKind::MissingIntent,
                            format!(
                                "intent_id is required ({} intents are in progress)",
                                in_progress.len()
                            ),
                        ));
                    }
                }
            }
        };

        if !intent.is_selectable() {
            return Ok(self.veto(
                ViolationKind::InvalidMetadata,
                format!(
                    "intent {} has status {} and cannot be selected",
                    intent.id, intent.status
                ),
            ));
        }

        let trace = TraceLog::new(self.paths.trace_file.clone(), self.contributor.clone(), None);
        let history = trace
            .recent_for_intent(&intent.id, BRIEF_HISTORY_LEN)
            .unwrap_or_default();
        let knowledge = LessonsLog::new(self.paths.knowledge_file.clone()).read_all();

        let block = render_context_block(&intent, &history, &knowledge);
        session.active_intent = Some(ActiveIntent::bind(&intent, block.clone()));

        tracing::info!(intent = %intent.id, session = %session.session_id, "intent selected");
        Ok(PreHookOutcome::proceed_with_context(block))
    }
}
