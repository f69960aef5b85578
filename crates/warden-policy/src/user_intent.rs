//! User-intent classification: is the user asking for something
//! destructive?
//!
//! Two stages. A keyword heuristic always runs and is always available as
//! the fallback. When an LLM endpoint is configured, a single-shot
//! classification call refines the verdict, with one safety override: if
//! the model says destructive but the heuristic found a safe keyword and
//! no destructive keyword, the heuristic wins. This keeps routine edit
//! requests from being escalated by an over-cautious model.
//!
//! Results are cached per session keyed by the SHA-256 of the message.

use serde::Deserialize;

use warden_types::{
    hash_message, LlmEndpointConfig, SessionState, UserIntentClassification, UserIntentSource,
    UserIntentVerdict,
};

use crate::llm::LlmClient;

/// Heuristic verdicts carry this confidence.
const HEURISTIC_CONFIDENCE: f64 = 0.4;

const SAFE_KEYWORDS: &[&str] = &[
    "read", "list", "view", "show", "explain", "describe", "inspect", "create", "add",
    "edit", "update", "refactor", "implement", "fix", "write", "document", "test",
];

const DESTRUCTIVE_KEYWORDS: &[&str] = &[
    "delete", "remove", "wipe", "drop", "erase", "destroy", "overwrite", "rename",
    "purge", "uninstall", "revert", "truncate", "clean up", "get rid of",
];

/// The JSON contract the classification prompt fixes for the model.
#[derive(Debug, Deserialize)]
struct LlmVerdict {
    verdict: String,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
}

fn classification_prompt(message: &str) -> String {
    format!(
        "Classify the intent of this user request to a coding agent as \
         \"safe\" (reading, creating, or editing code) or \"destructive\" \
         (deleting, removing, or overwriting existing work). Respond with \
         exactly one JSON object of the shape \
         {{\"verdict\": \"safe\"|\"destructive\", \"reason\": string, \
         \"confidence\": number}} and nothing else.\n\nRequest:\n{message}"
    )
}

fn contains_keyword(message: &str, keywords: &[&'static str]) -> Option<&'static str> {
    let lower = message.to_lowercase();
    keywords.iter().find(|k| lower.contains(*k)).copied()
}

/// The keyword pass. Destructive keywords dominate safe ones.
fn heuristic_verdict(message: &str) -> (UserIntentVerdict, Option<String>, UserIntentSource) {
    if let Some(word) = contains_keyword(message, DESTRUCTIVE_KEYWORDS) {
        return (
            UserIntentVerdict::Destructive,
            Some(format!("destructive keyword: {word:?}")),
            UserIntentSource::Heuristic,
        );
    }
    if let Some(word) = contains_keyword(message, SAFE_KEYWORDS) {
        return (
            UserIntentVerdict::Safe,
            Some(format!("safe keyword: {word:?}")),
            UserIntentSource::Heuristic,
        );
    }
    (UserIntentVerdict::Unknown, None, UserIntentSource::None)
}

/// Classifier over the most recent user message.
pub struct UserIntentClassifier {
    llm: Option<LlmClient>,
}

impl UserIntentClassifier {
    /// Heuristics-only classifier.
    pub fn heuristic_only() -> Self {
        Self { llm: None }
    }

    /// LLM-assisted when a config is given, heuristics-only otherwise.
    /// A client that fails to construct degrades to heuristics with a
    /// warning rather than blocking the pipeline.
    pub fn from_config(config: Option<LlmEndpointConfig>) -> Self {
        let llm = config.and_then(|c| match LlmClient::new(c) {
            Ok(client) => Some(client),
            Err(err) => {
                tracing::warn!(error = %err, "LLM classifier unavailable, using heuristics");
                None
            }
        });
        Self { llm }
    }

    /// Classify a message, consulting and updating the session cache.
    pub async fn classify(
        &self,
        session: &mut SessionState,
        message: &str,
    ) -> UserIntentClassification {
        let message_hash = hash_message(message);
        if let Some(cached) = session.user_intent_cache.get(&message_hash) {
            return cached.clone();
        }

        let classification = self.classify_uncached(message, message_hash.clone()).await;
        session
            .user_intent_cache
            .insert(message_hash, classification.clone());
        classification
    }

    async fn classify_uncached(
        &self,
        message: &str,
        message_hash: String,
    ) -> UserIntentClassification {
        let (heuristic, heuristic_reason, heuristic_source) = heuristic_verdict(message);

        let llm = match &self.llm {
            Some(client) => client,
            None => {
                return UserIntentClassification {
                    verdict: heuristic,
                    reason: heuristic_reason,
                    confidence: (heuristic_source == UserIntentSource::Heuristic)
                        .then_some(HEURISTIC_CONFIDENCE),
                    source: heuristic_source,
                    message_hash,
                };
            }
        };

        let llm_result = tokio::time::timeout(
            llm.timeout(),
            llm.complete(&classification_prompt(message)),
        )
        .await;

        match llm_result {
            Ok(Ok(text)) => match parse_llm_verdict(&text) {
                Some(parsed) => {
                    let verdict = match parsed.verdict.as_str() {
                        "safe" => UserIntentVerdict::Safe,
                        "destructive" => UserIntentVerdict::Destructive,
                        _ => UserIntentVerdict::Unknown,
                    };

                    // Safety override: the model may not escalate a message
                    // the heuristic considers safe and that carries no
                    // destructive keyword.
                    if verdict == UserIntentVerdict::Destructive
                        && heuristic == UserIntentVerdict::Safe
                        && contains_keyword(message, DESTRUCTIVE_KEYWORDS).is_none()
                    {
                        tracing::debug!("downgrading LLM destructive verdict to heuristic safe");
                        return UserIntentClassification {
                            verdict: UserIntentVerdict::Safe,
                            reason: heuristic_reason,
                            confidence: Some(HEURISTIC_CONFIDENCE),
                            source: UserIntentSource::Heuristic,
                            message_hash,
                        };
                    }

                    UserIntentClassification {
                        verdict,
                        reason: parsed.reason,
                        confidence: parsed.confidence.map(|c| c.clamp(0.0, 1.0)),
                        source: UserIntentSource::Llm,
                        message_hash,
                    }
                }
                None => fallback(heuristic, heuristic_reason, message_hash),
            },
            Ok(Err(err)) => {
                tracing::debug!(error = %err, "LLM classification failed, using heuristic");
                fallback(heuristic, heuristic_reason, message_hash)
            }
            Err(_elapsed) => {
                tracing::debug!("LLM classification timed out, using heuristic");
                fallback(heuristic, heuristic_reason, message_hash)
            }
        }
    }
}

fn fallback(
    verdict: UserIntentVerdict,
    reason: Option<String>,
    message_hash: String,
) -> UserIntentClassification {
    UserIntentClassification {
        verdict,
        reason,
        confidence: Some(HEURISTIC_CONFIDENCE),
        source: UserIntentSource::Fallback,
        message_hash,
    }
}

/// Extract the JSON verdict object from a completion, tolerating leading
/// or trailing prose around the braces.
fn parse_llm_verdict(text: &str) -> Option<LlmVerdict> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> SessionState {
        SessionState::new("s1", "/tmp/ws")
    }

    #[tokio::test]
    async fn destructive_keyword_wins() {
        let classifier = UserIntentClassifier::heuristic_only();
        let mut session = session();
        let result = classifier
            .classify(&mut session, "please delete the old test files")
            .await;
        assert_eq!(result.verdict, UserIntentVerdict::Destructive);
        assert_eq!(result.source, UserIntentSource::Heuristic);
        assert_eq!(result.confidence, Some(0.4));
    }

    #[tokio::test]
    async fn safe_keyword_classifies_safe() {
        let classifier = UserIntentClassifier::heuristic_only();
        let mut session = session();
        let result = classifier
            .classify(&mut session, "refactor the parser module")
            .await;
        assert_eq!(result.verdict, UserIntentVerdict::Safe);
    }

    #[tokio::test]
    async fn destructive_beats_safe_when_both_present() {
        let classifier = UserIntentClassifier::heuristic_only();
        let mut session = session();
        let result = classifier
            .classify(&mut session, "update the config and remove the legacy flag")
            .await;
        assert_eq!(result.verdict, UserIntentVerdict::Destructive);
    }

    #[tokio::test]
    async fn no_keywords_is_unknown() {
        let classifier = UserIntentClassifier::heuristic_only();
        let mut session = session();
        let result = classifier.classify(&mut session, "hmm").await;
        assert_eq!(result.verdict, UserIntentVerdict::Unknown);
        assert_eq!(result.source, UserIntentSource::None);
        assert_eq!(result.confidence, None);
    }

    #[tokio::test]
    async fn cache_hits_by_message_hash() {
        let classifier = UserIntentClassifier::heuristic_only();
        let mut session = session();
        let first = classifier.classify(&mut session, "wipe the database").await;
        assert_eq!(session.user_intent_cache.len(), 1);

        let second = classifier.classify(&mut session, "wipe the database").await;
        assert_eq!(first, second);
        assert_eq!(session.user_intent_cache.len(), 1);
    }

    #[test]
    fn verdict_parser_tolerates_prose() {
        let parsed = parse_llm_verdict(
            "Sure, here is the classification:\n{\"verdict\": \"destructive\", \"reason\": \"asks to drop a table\", \"confidence\": 0.9}\nDone.",
        )
        .unwrap();
        assert_eq!(parsed.verdict, "destructive");
        assert_eq!(parsed.confidence, Some(0.9));
    }

    #[test]
    fn verdict_parser_rejects_garbage() {
        assert!(parse_llm_verdict("no json here").is_none());
        assert!(parse_llm_verdict("}{").is_none());
    }

    #[test]
    fn prompt_fixes_output_shape() {
        let prompt = classification_prompt("delete everything");
        assert!(prompt.contains("\"verdict\""));
        assert!(prompt.contains("delete everything"));
    }
}
