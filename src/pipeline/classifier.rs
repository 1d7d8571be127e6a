//! Intent Classifier
//!
//! Maps a free-form follow-up instruction onto the closed [`Intent`]
//! vocabulary. Classification is total: adapter failures and responses
//! outside the vocabulary degrade through a keyword fallback down to
//! `Unknown`, never to an error. The orchestrator routes `Unknown` to the
//! question handler so every turn still gets a textual response.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::prompts;
use crate::ai::provider::SharedProvider;
use crate::ai::retry::{RetryPolicy, with_retries};
use crate::types::{
    Category, ConversationState, Intent, PlaceChange, ReorderBy, Selector,
};

/// Classifies follow-up instructions into intents
pub struct IntentClassifier {
    provider: SharedProvider,
    retry: RetryPolicy,
}

impl IntentClassifier {
    pub fn new(provider: SharedProvider, retry: RetryPolicy) -> Self {
        Self { provider, retry }
    }

    /// Classify one instruction against the current state. Total.
    #[instrument(skip(self, instruction, state), fields(len = instruction.len()))]
    pub async fn classify(&self, instruction: &str, state: &ConversationState) -> Intent {
        let prompt = prompts::classification_prompt(instruction, state);
        let schema = prompts::classification_schema();

        let response = with_retries(&self.retry, "completion", || {
            self.provider.complete(&prompt, &schema)
        })
        .await;

        let intent = match response {
            Ok(value) => Self::coerce(value, instruction),
            Err(err) => {
                warn!(error = %err, "Classification unavailable, using keyword fallback");
                keyword_fallback(instruction)
            }
        };
        debug!(intent = intent.label(), "Instruction classified");
        intent
    }

    /// Coerce a schema-shaped response; anything malformed degrades
    fn coerce(value: Value, instruction: &str) -> Intent {
        let Ok(draft) = serde_json::from_value::<ClassificationDraft>(value) else {
            return keyword_fallback(instruction);
        };

        match draft.intent.as_deref() {
            Some("add") => {
                let description = draft
                    .description
                    .filter(|d| !d.trim().is_empty())
                    .unwrap_or_else(|| instruction.to_string());
                Intent::Add(description)
            }
            Some("remove") => match draft.target.as_ref().and_then(parse_selector) {
                Some(selector) => Intent::Remove(selector),
                None => Intent::Unknown,
            },
            Some("modify") => match draft.target.as_ref().and_then(parse_selector) {
                Some(selector) => {
                    let change = draft.change.map(ChangeDraft::into_change).unwrap_or_default();
                    Intent::Modify(selector, change)
                }
                None => Intent::Unknown,
            },
            Some("reorder") => {
                let criterion = match draft.criterion.as_deref() {
                    Some("name") => ReorderBy::Name,
                    _ => ReorderBy::Category,
                };
                Intent::Reorder(criterion)
            }
            Some("question") => {
                let question = draft
                    .question
                    .filter(|q| !q.trim().is_empty())
                    .unwrap_or_else(|| instruction.to_string());
                Intent::Question(question)
            }
            Some("regenerate") => Intent::Regenerate,
            _ => Intent::Unknown,
        }
    }
}

/// Parse a target field into a selector.
///
/// Numbers are 1-based positions from the numbered list the prompt showed.
/// Category keywords select the first place of that category; anything else
/// is a name match.
fn parse_selector(target: &Value) -> Option<Selector> {
    match target {
        Value::Number(n) => {
            let n = n.as_u64()?;
            if n >= 1 { Some(Selector::Index(n as usize - 1)) } else { None }
        }
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            if let Ok(n) = trimmed.parse::<usize>() {
                return if n >= 1 { Some(Selector::Index(n - 1)) } else { None };
            }
            if let Some(category) = category_keyword(trimmed) {
                return Some(Selector::Category {
                    category,
                    ordinal: 0,
                });
            }
            Some(Selector::Name(trimmed.to_string()))
        }
        _ => None,
    }
}

/// Exact category words only; "the museum" is a name, "museum" a category
fn category_keyword(target: &str) -> Option<Category> {
    match target.to_lowercase().as_str() {
        "food" | "restaurant" | "cafe" | "dining" => Some(Category::Food),
        "art" | "museum" | "gallery" => Some(Category::Art),
        "sightseeing" | "sight" | "landmark" | "attraction" => Some(Category::Sightseeing),
        "other" => Some(Category::Other),
        _ => None,
    }
}

/// Last-resort classification when the completion service is unreachable.
///
/// Interrogative openers and a trailing question mark classify as a
/// question; everything else is `Unknown`.
fn keyword_fallback(instruction: &str) -> Intent {
    let lower = instruction.trim().to_lowercase();
    const OPENERS: [&str; 12] = [
        "what", "where", "when", "how", "why", "who", "which", "can ", "could ", "is ",
        "are ", "do ",
    ];
    if lower.ends_with('?') || OPENERS.iter().any(|o| lower.starts_with(o)) {
        Intent::Question(instruction.trim().to_string())
    } else {
        Intent::Unknown
    }
}

#[derive(Debug, Deserialize)]
struct ClassificationDraft {
    #[serde(default)]
    intent: Option<String>,
    #[serde(default)]
    target: Option<Value>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    change: Option<ChangeDraft>,
    #[serde(default)]
    criterion: Option<String>,
    #[serde(default)]
    question: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChangeDraft {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    neighborhood: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

impl ChangeDraft {
    fn into_change(self) -> PlaceChange {
        PlaceChange {
            name: self.name.filter(|s| !s.trim().is_empty()),
            neighborhood: self.neighborhood.filter(|s| !s.trim().is_empty()),
            category: self
                .category
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .map(Category::from_tag),
            address: self.address.filter(|s| !s.trim().is_empty()),
            notes: self.notes.filter(|s| !s.trim().is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::ScriptedProvider;
    use crate::types::{DestinationType, ExtractedParams, Itinerary, Place};
    use serde_json::json;

    fn state() -> ConversationState {
        let s = ConversationState::new(ExtractedParams::new(
            "Barcelona",
            DestinationType::City,
            vec!["art".into(), "food".into()],
            2,
        ));
        s.with_itinerary(Itinerary::from_candidates(vec![
            Place::new("Museu Picasso", Category::Art),
            Place::new("El Xampanyet", Category::Food),
        ]))
    }

    fn classifier(provider: SharedProvider) -> IntentClassifier {
        IntentClassifier::new(provider, RetryPolicy::no_retries())
    }

    #[tokio::test]
    async fn test_classify_add() {
        let provider = ScriptedProvider::shared(vec![Ok(json!({
            "intent": "add",
            "description": "a tapas bar near the old town"
        }))]);
        let intent = classifier(provider).classify("add a tapas bar", &state()).await;
        assert_eq!(intent, Intent::Add("a tapas bar near the old town".into()));
    }

    #[tokio::test]
    async fn test_classify_remove_by_number_is_one_based() {
        let provider = ScriptedProvider::shared(vec![Ok(json!({
            "intent": "remove",
            "target": "2"
        }))]);
        let intent = classifier(provider).classify("take out number 2", &state()).await;
        assert_eq!(intent, Intent::Remove(Selector::Index(1)));
    }

    #[tokio::test]
    async fn test_classify_remove_by_name() {
        let provider = ScriptedProvider::shared(vec![Ok(json!({
            "intent": "remove",
            "target": "Museu Picasso"
        }))]);
        let intent = classifier(provider).classify("remove the museum", &state()).await;
        assert_eq!(intent, Intent::Remove(Selector::Name("Museu Picasso".into())));
    }

    #[tokio::test]
    async fn test_classify_remove_by_category_keyword() {
        let provider = ScriptedProvider::shared(vec![Ok(json!({
            "intent": "remove",
            "target": "museum"
        }))]);
        let intent = classifier(provider).classify("drop the museum", &state()).await;
        assert_eq!(
            intent,
            Intent::Remove(Selector::Category {
                category: Category::Art,
                ordinal: 0
            })
        );
    }

    #[tokio::test]
    async fn test_classify_modify_with_change() {
        let provider = ScriptedProvider::shared(vec![Ok(json!({
            "intent": "modify",
            "target": "El Xampanyet",
            "change": {"notes": "book ahead", "category": "dining"}
        }))]);
        let intent = classifier(provider)
            .classify("note that the tapas place needs booking", &state())
            .await;
        assert_eq!(
            intent,
            Intent::Modify(
                Selector::Name("El Xampanyet".into()),
                PlaceChange {
                    notes: Some("book ahead".into()),
                    category: Some(Category::Food),
                    ..Default::default()
                }
            )
        );
    }

    #[tokio::test]
    async fn test_classify_reorder_criteria() {
        let provider = ScriptedProvider::shared(vec![
            Ok(json!({"intent": "reorder", "criterion": "category"})),
            Ok(json!({"intent": "reorder", "criterion": "name"})),
            Ok(json!({"intent": "reorder"})),
        ]);
        let c = classifier(provider);
        assert_eq!(
            c.classify("group by category", &state()).await,
            Intent::Reorder(ReorderBy::Category)
        );
        assert_eq!(
            c.classify("sort alphabetically", &state()).await,
            Intent::Reorder(ReorderBy::Name)
        );
        assert_eq!(
            c.classify("reorder this", &state()).await,
            Intent::Reorder(ReorderBy::Category)
        );
    }

    #[tokio::test]
    async fn test_classify_question_and_regenerate() {
        let provider = ScriptedProvider::shared(vec![
            Ok(json!({"intent": "question", "question": "what's near the museum?"})),
            Ok(json!({"intent": "regenerate"})),
        ]);
        let c = classifier(provider);
        assert_eq!(
            c.classify("what's near the museum?", &state()).await,
            Intent::Question("what's near the museum?".into())
        );
        assert_eq!(c.classify("start over", &state()).await, Intent::Regenerate);
    }

    #[tokio::test]
    async fn test_unrecognized_label_degrades_to_unknown() {
        let provider = ScriptedProvider::shared(vec![Ok(json!({"intent": "teleport"}))]);
        let intent = classifier(provider).classify("beam me up", &state()).await;
        assert_eq!(intent, Intent::Unknown);
    }

    #[tokio::test]
    async fn test_remove_without_target_degrades_to_unknown() {
        let provider = ScriptedProvider::shared(vec![Ok(json!({"intent": "remove"}))]);
        let intent = classifier(provider).classify("remove it", &state()).await;
        assert_eq!(intent, Intent::Unknown);
    }

    #[tokio::test]
    async fn test_fallback_detects_questions() {
        let provider = ScriptedProvider::unavailable();
        let c = classifier(provider);
        assert_eq!(
            c.classify("can I rent a scooter?", &state()).await,
            Intent::Question("can I rent a scooter?".into())
        );
    }

    #[tokio::test]
    async fn test_fallback_statement_is_unknown() {
        let provider = ScriptedProvider::unavailable();
        let intent = classifier(provider)
            .classify("make it more romantic", &state())
            .await;
        assert_eq!(intent, Intent::Unknown);
    }

    #[test]
    fn test_parse_selector_shapes() {
        assert_eq!(parse_selector(&json!(3)), Some(Selector::Index(2)));
        assert_eq!(parse_selector(&json!(0)), None);
        assert_eq!(parse_selector(&json!("  ")), None);
        assert_eq!(
            parse_selector(&json!("the museum")),
            Some(Selector::Name("the museum".into()))
        );
        assert_eq!(
            parse_selector(&json!("food")),
            Some(Selector::Category {
                category: Category::Food,
                ordinal: 0
            })
        );
        assert_eq!(parse_selector(&json!(null)), None);
    }
}
