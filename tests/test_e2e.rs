//! End-to-end pipeline scenarios: select an intent, dispatch tool calls
//! through the full hook chain, and check what reached the filesystem and
//! the ledgers.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use common::{command_call, patch_call, select_intent_call, write_call, TestWorkspace};
use warden::engine::ToolHandler;
use warden::ledger::{content_hash, JsonlReader, TraceEntry};
use warden::types::{SessionState, ToolCall, Violation, ViolationKind};

/// Stub shell handler counting invocations; commands never actually run.
struct StubCommandHandler {
    invocations: AtomicUsize,
}

impl StubCommandHandler {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            invocations: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl ToolHandler for StubCommandHandler {
    async fn handle(
        &self,
        _session: &mut SessionState,
        _call: &ToolCall,
    ) -> Result<String, Violation> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        Ok("exit 0".into())
    }
}

// Scenario 1: a write inside the owned scope flows through with injected
// metadata and leaves a fully-attributed trace entry.
#[tokio::test]
async fn happy_write_injects_metadata_and_traces() {
    let ws = TestWorkspace::new().with_intent("INT-1", &["src"]);
    let (driver, approvals) = ws.driver_scripted([]);
    let mut session = ws.session();

    let outcome = driver
        .dispatch(&mut session, select_intent_call("c0", Some("INT-1")))
        .await
        .unwrap();
    assert!(outcome.result.success);
    assert!(outcome
        .injected_context
        .as_deref()
        .unwrap()
        .contains("<id>INT-1</id>"));

    let outcome = driver
        .dispatch(&mut session, write_call("c1", "src/a.ts", "x"))
        .await
        .unwrap();
    assert!(outcome.result.success, "{:?}", outcome.result.error);
    assert_eq!(ws.read_file("src/a.ts").as_deref(), Some("x"));
    assert_eq!(approvals.prompt_count(), 0, "in-scope write must not prompt");

    let entries: Vec<TraceEntry> = JsonlReader::open(&ws.paths.trace_file).unwrap().entries();
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.intent_id.as_deref(), Some("INT-1"));
    assert_eq!(entry.tool, "write_file");
    assert_eq!(entry.tool_use_id, "c1");
    assert_eq!(entry.files.len(), 1);
    assert_eq!(entry.files[0].relative_path, "src/a.ts");
    assert_eq!(entry.files[0].content_hash, content_hash(b"x"));
    let ranges = &entry.files[0].conversations[0].ranges;
    assert_eq!(ranges.len(), 1);
    assert_eq!((ranges[0].start_line, ranges[0].end_line), (1, 1));
    assert_eq!(ranges[0].content_hash, content_hash(b"x"));
}

// Scenario 2: an out-of-scope write denied at the prompt produces the
// REQ-001 envelope, writes nothing, and traces nothing.
#[tokio::test]
async fn out_of_scope_denial_is_req_001() {
    let ws = TestWorkspace::new().with_intent("INT-1", &["src"]);
    let (driver, approvals) = ws.driver_scripted([false]);
    let mut session = ws.session();

    driver
        .dispatch(&mut session, select_intent_call("c0", Some("INT-1")))
        .await
        .unwrap();
    let outcome = driver
        .dispatch(&mut session, write_call("c1", "other/a.ts", "x"))
        .await
        .unwrap();

    assert!(!outcome.result.success);
    let violation = outcome.result.error.unwrap();
    assert_eq!(violation.error_type, ViolationKind::ScopeViolation);
    assert_eq!(violation.code, "REQ-001");
    assert_eq!(violation.intent_id.as_deref(), Some("INT-1"));
    assert_eq!(violation.filename.as_deref(), Some("other/a.ts"));
    assert_eq!(approvals.prompt_count(), 1);

    assert!(ws.read_file("other/a.ts").is_none(), "no write may happen");
    assert_eq!(
        JsonlReader::open(&ws.paths.trace_file).unwrap().line_count(),
        0,
        "no trace may be appended"
    );
}

// Scenario 3: a sibling process rewrites the file between snapshot and
// write; the final check aborts with the expected/actual hashes and a
// lesson lands in the knowledge file.
#[tokio::test]
async fn optimistic_lock_aborts_stale_write() {
    use warden::engine::{LessonsHook, WriteFileHandler};
    use warden::hooks::{Hook, ToolResult};
    use warden::ledger::LessonsLog;
    use warden::types::session::Snapshot;

    let ws = TestWorkspace::new().with_intent("INT-1", &["src"]);
    ws.write_file("src/a.ts", "A");

    let mut session = ws.session();
    // The snapshot hook saw "A"...
    session.put_snapshot(
        "c1",
        "src/a.ts",
        Snapshot {
            before: Some("A".into()),
            existed: true,
            binary: false,
        },
    );
    // ...then a sibling process rewrote the file.
    ws.write_file("src/a.ts", "B");

    let call = write_call("c1", "src/a.ts", "C");
    let violation = WriteFileHandler
        .handle(&mut session, &call)
        .await
        .unwrap_err();

    assert_eq!(violation.error_type, ViolationKind::StaleFile);
    assert_eq!(violation.expected_hash.as_deref(), Some(content_hash(b"A").as_str()));
    assert_eq!(violation.actual_hash.as_deref(), Some(content_hash(b"B").as_str()));
    assert_eq!(ws.read_file("src/a.ts").as_deref(), Some("B"), "no clobber");
    assert!(session.stale_blocks.contains_key("src/a.ts"));

    // The lessons post-hook flushes the failure into shared knowledge.
    let lessons = LessonsHook::new(LessonsLog::new(ws.paths.knowledge_file.clone()));
    let result = ToolResult::error("c1", violation);
    lessons.run_post(&mut session, &call, &result).await.unwrap();

    let knowledge = ws.read_file(".warden/AGENT.md").unwrap();
    assert!(knowledge.contains("Verification failure"));
    assert!(knowledge.contains("src/a.ts"));
    assert!(session.last_verification_failure.is_none());
}

// Scenario 4: a safe command passes without any prompt and the handler
// runs.
#[tokio::test]
async fn safe_command_passes_without_prompt() {
    let ws = TestWorkspace::new().with_intent("INT-1", &["src"]);
    let (mut driver, approvals) = ws.driver_scripted([]);
    let handler = StubCommandHandler::new();
    driver.register_handler("execute_command", handler.clone());

    let mut session = ws.session();
    driver
        .dispatch(&mut session, select_intent_call("c0", Some("INT-1")))
        .await
        .unwrap();
    let outcome = driver
        .dispatch(&mut session, command_call("c1", "git status"))
        .await
        .unwrap();

    assert!(outcome.result.success);
    assert_eq!(handler.invocations.load(Ordering::SeqCst), 1);
    assert_eq!(approvals.prompt_count(), 0);
}

// Scenario 5: a destructive command approved once is not re-prompted for
// the identical call in a brand-new session.
#[tokio::test]
async fn destructive_command_approval_survives_sessions() {
    let ws = TestWorkspace::new().with_intent("INT-1", &["src"]);
    let (mut driver, approvals) = ws.driver_scripted([true]);
    let handler = StubCommandHandler::new();
    driver.register_handler("execute_command", handler.clone());

    let mut first = ws.session();
    driver
        .dispatch(&mut first, select_intent_call("c0", Some("INT-1")))
        .await
        .unwrap();
    let outcome = driver
        .dispatch(&mut first, command_call("c1", "rm tmp"))
        .await
        .unwrap();
    assert!(outcome.result.success);
    assert_eq!(approvals.prompt_count(), 1);
    assert_eq!(handler.invocations.load(Ordering::SeqCst), 1);

    // New session, same workspace: the persisted decision is reused.
    let mut second = SessionState::new("second-session", ws.root());
    driver
        .dispatch(&mut second, select_intent_call("c2", Some("INT-1")))
        .await
        .unwrap();
    let outcome = driver
        .dispatch(&mut second, command_call("c3", "rm tmp"))
        .await
        .unwrap();
    assert!(outcome.result.success);
    assert_eq!(approvals.prompt_count(), 1, "no second prompt");
    assert_eq!(handler.invocations.load(Ordering::SeqCst), 2);
}

// Scenario 6: a delete-via-patch payload needs the destructive-operation
// preflight even when the path is inside the owned scope.
#[tokio::test]
async fn delete_patch_preflight_denial_is_req_008() {
    let ws = TestWorkspace::new().with_intent("INT-1", &["src"]);
    ws.write_file("src/x.ts", "doomed");
    let (driver, approvals) = ws.driver_scripted([false]);

    let mut session = ws.session();
    driver
        .dispatch(&mut session, select_intent_call("c0", Some("INT-1")))
        .await
        .unwrap();
    let outcome = driver
        .dispatch(&mut session, patch_call("c1", "*** Delete File: src/x.ts"))
        .await
        .unwrap();

    assert!(!outcome.result.success);
    let violation = outcome.result.error.unwrap();
    assert_eq!(violation.error_type, ViolationKind::DestructiveOperationDenied);
    assert_eq!(violation.code, "REQ-008");
    assert_eq!(approvals.prompt_count(), 1);
    assert_eq!(approvals.requests()[0].reason, "destructive_operation");
    assert_eq!(ws.read_file("src/x.ts").as_deref(), Some("doomed"));
}

// A mutating call before any intent selection never reaches the handler.
#[tokio::test]
async fn write_without_intent_is_vetoed() {
    let ws = TestWorkspace::new().with_intent("INT-1", &["src"]);
    let (driver, _) = ws.driver_scripted([]);
    let mut session = ws.session();

    let outcome = driver
        .dispatch(&mut session, write_call("c1", "src/a.ts", "x"))
        .await
        .unwrap();
    assert!(!outcome.result.success);
    assert_eq!(
        outcome.result.error.unwrap().error_type,
        ViolationKind::NoActiveIntent
    );
    assert!(ws.read_file("src/a.ts").is_none());
}
