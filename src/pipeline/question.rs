//! Question Handler
//!
//! Answers informational turns against the current trip context. Never
//! mutates state and never fails: when the completion service is down or
//! returns garbage, the caller still gets a usable apology sentence.

use serde::Deserialize;
use tracing::{instrument, warn};

use super::prompts;
use crate::ai::provider::SharedProvider;
use crate::ai::retry::{RetryPolicy, with_retries};
use crate::types::ConversationState;

/// Shown when no answer could be produced
const FALLBACK_ANSWER: &str =
    "I can't answer that right now, but your itinerary is unchanged. Please try again.";

/// Answers questions about the trip without touching the itinerary
pub struct QuestionHandler {
    provider: SharedProvider,
    retry: RetryPolicy,
}

impl QuestionHandler {
    pub fn new(provider: SharedProvider, retry: RetryPolicy) -> Self {
        Self { provider, retry }
    }

    /// Answer one question. Total; degraded answers beat no answer.
    #[instrument(skip(self, question, state), fields(len = question.len()))]
    pub async fn answer(&self, question: &str, state: &ConversationState) -> String {
        let prompt = prompts::question_prompt(question, state);
        let schema = prompts::question_schema();

        let response = with_retries(&self.retry, "completion", || {
            self.provider.complete(&prompt, &schema)
        })
        .await;

        match response {
            Ok(value) => match serde_json::from_value::<AnswerDraft>(value) {
                Ok(draft) if !draft.response.trim().is_empty() => draft.response,
                _ => {
                    warn!("Question response malformed, using fallback answer");
                    FALLBACK_ANSWER.to_string()
                }
            },
            Err(err) => {
                warn!(error = %err, "Question answering unavailable");
                FALLBACK_ANSWER.to_string()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct AnswerDraft {
    #[serde(default)]
    response: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::ScriptedProvider;
    use crate::types::{DestinationType, ExtractedParams};
    use serde_json::json;

    fn state() -> ConversationState {
        ConversationState::new(ExtractedParams::new(
            "Barcelona",
            DestinationType::City,
            vec!["art".into()],
            2,
        ))
    }

    fn handler(provider: SharedProvider) -> QuestionHandler {
        QuestionHandler::new(provider, RetryPolicy::no_retries())
    }

    #[tokio::test]
    async fn test_answer_passes_through_response() {
        let provider = ScriptedProvider::shared(vec![Ok(json!({
            "response": "The Picasso museum is a short walk from El Born."
        }))]);
        let answer = handler(provider)
            .answer("what's near the museum?", &state())
            .await;
        assert_eq!(answer, "The Picasso museum is a short walk from El Born.");
    }

    #[tokio::test]
    async fn test_unavailable_service_gets_fallback() {
        let answer = handler(ScriptedProvider::unavailable())
            .answer("can I rent a scooter?", &state())
            .await;
        assert_eq!(answer, FALLBACK_ANSWER);
    }

    #[tokio::test]
    async fn test_blank_response_gets_fallback() {
        let provider = ScriptedProvider::shared(vec![Ok(json!({"response": "  "}))]);
        let answer = handler(provider).answer("how far?", &state()).await;
        assert_eq!(answer, FALLBACK_ANSWER);
    }

    #[tokio::test]
    async fn test_malformed_response_gets_fallback() {
        let provider = ScriptedProvider::shared(vec![Ok(json!(["not", "an", "object"]))]);
        let answer = handler(provider).answer("how far?", &state()).await;
        assert_eq!(answer, FALLBACK_ANSWER);
    }
}
