//! Rendering the `<intent_context>` block injected at selection time.
//!
//! The block embeds the intent specification, the last five trace entries
//! related to the intent, and the shared knowledge file. It is the only
//! channel through which the model learns its scope and constraints, so
//! the shape is stable and everything user-authored is XML-escaped.

use warden_ledger::TraceEntry;
use warden_types::Intent;

/// How many related trace entries the brief history carries.
pub const BRIEF_HISTORY_LEN: usize = 5;

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Render the full context block.
///
/// `history` is expected oldest-first and is truncated to the newest
/// [`BRIEF_HISTORY_LEN`] entries; `shared_knowledge` is the raw contents
/// of the knowledge file.
pub fn render_context_block(
    intent: &Intent,
    history: &[TraceEntry],
    shared_knowledge: &str,
) -> String {
    let mut out = String::with_capacity(1024);
    out.push_str("<intent_context>\n");

    out.push_str("  <intent_specification>\n");
    out.push_str(&format!("    <id>{}</id>\n", escape(&intent.id)));
    out.push_str(&format!("    <name>{}</name>\n", escape(&intent.name)));
    out.push_str(&format!("    <status>{}</status>\n", intent.status));

    out.push_str("    <owned_scope>\n");
    for path in &intent.owned_scope {
        out.push_str(&format!("      <path>{}</path>\n", escape(path)));
    }
    out.push_str("    </owned_scope>\n");

    out.push_str("    <constraints>\n");
    for constraint in &intent.constraints {
        out.push_str(&format!("      <constraint>{}</constraint>\n", escape(constraint)));
    }
    out.push_str("    </constraints>\n");

    out.push_str("    <acceptance_criteria>\n");
    for criteria in &intent.acceptance_criteria {
        out.push_str(&format!("      <criteria>{}</criteria>\n", escape(criteria)));
    }
    out.push_str("    </acceptance_criteria>\n");
    out.push_str("  </intent_specification>\n");

    out.push_str("  <brief_history>\n");
    let skip = history.len().saturating_sub(BRIEF_HISTORY_LEN);
    for entry in &history[skip..] {
        let files: Vec<&str> = entry
            .files
            .iter()
            .map(|f| f.relative_path.as_str())
            .collect();
        out.push_str(&format!(
            "    <trace_entry timestamp=\"{}\" tool=\"{}\" files=\"{}\"/>\n",
            entry.timestamp.to_rfc3339(),
            escape(&entry.tool),
            escape(&files.join(",")),
        ));
    }
    out.push_str("  </brief_history>\n");

    out.push_str("  <shared_knowledge>\n");
    if !shared_knowledge.is_empty() {
        out.push_str(&escape(shared_knowledge.trim_end()));
        out.push('\n');
    }
    out.push_str("  </shared_knowledge>\n");

    out.push_str("</intent_context>");
    out
}
