//! Default middleware assembly.
//!
//! Wires the standard hook order the pipeline depends on: the intent
//! selector and the scope gate must precede snapshot capture (a vetoed
//! call takes no snapshots), and the trace writer consumes snapshots
//! before the lessons hook inspects the session.

use std::sync::Arc;

use warden_gate::{ScopeGateHook, SnapshotHook};
use warden_hooks::HookRegistry;
use warden_intents::SelectIntentHook;
use warden_ledger::{LessonsLog, TraceLog};
use warden_policy::{ToolCatalog, UserIntentClassifier};
use warden_types::{ApprovalHandler, WardenConfig, SELECT_INTENT_TOOL};

use crate::driver::Driver;
use crate::handlers::{SelectIntentHandler, WriteFileHandler};
use crate::lessons_hook::LessonsHook;
use crate::trace_hook::TraceWriterHook;

/// Build a driver with the standard hooks and the built-in handlers.
///
/// The host registers its own handlers for the rest of its tool surface
/// on the returned driver.
pub fn build_driver(
    config: &WardenConfig,
    catalog: Arc<ToolCatalog>,
    approval: Arc<dyn ApprovalHandler>,
) -> Driver {
    let paths = config.paths();

    let trace_log = Arc::new(TraceLog::new(
        paths.trace_file.clone(),
        config.contributor.clone(),
        config.vcs_revision.clone(),
    ));

    let mut registry = HookRegistry::new();
    registry.register(Arc::new(SelectIntentHook::new(
        paths.clone(),
        config.contributor.clone(),
    )));
    registry.register(Arc::new(ScopeGateHook::new(
        catalog.clone(),
        approval,
        UserIntentClassifier::from_config(config.llm.clone()),
        paths.clone(),
    )));
    registry.register(Arc::new(SnapshotHook::new(catalog.clone())));
    registry.register(Arc::new(TraceWriterHook::new(catalog.clone(), trace_log)));
    registry.register(Arc::new(LessonsHook::new(LessonsLog::new(
        paths.knowledge_file.clone(),
    ))));

    let mut driver = Driver::new(registry);
    driver.register_handler(SELECT_INTENT_TOOL, Arc::new(SelectIntentHandler));
    driver.register_handler("write_file", Arc::new(WriteFileHandler));
    driver
}
