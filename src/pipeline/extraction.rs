//! Extraction Handler
//!
//! Parses a raw trip request into structured parameters. Pure function of
//! the input text and the completion adapter: no side effects, so repeated
//! extraction of the same text against a deterministic adapter is idempotent.
//!
//! Policy:
//! - missing destination fails with `NoDestination` rather than guessing
//! - missing or non-positive day count defaults to 1
//! - a parse failure is retried exactly once with a stricter "return only
//!   JSON" instruction, then surfaces as `UnparseableResponse`

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::prompts;
use crate::ai::provider::SharedProvider;
use crate::ai::retry::{RetryPolicy, with_retries};
use crate::types::{
    DestinationType, ErrorCategory, ExtractedParams, ExtractionError, PlannerError, Result,
    TripRequest,
};

/// Caller-supplied extraction limits.
///
/// The day cap is a subscription-tier concern injected per call, not owned
/// by the pipeline.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionLimits {
    pub max_days: u32,
}

impl Default for ExtractionLimits {
    fn default() -> Self {
        Self {
            max_days: crate::constants::planner::DEFAULT_MAX_DAYS,
        }
    }
}

/// Turns free-form trip text into [`ExtractedParams`]
pub struct ExtractionHandler {
    provider: SharedProvider,
    retry: RetryPolicy,
}

impl ExtractionHandler {
    pub fn new(provider: SharedProvider, retry: RetryPolicy) -> Self {
        Self { provider, retry }
    }

    /// Extract structured parameters from a trip request
    #[instrument(skip(self, request), fields(len = request.text().len()))]
    pub async fn extract(
        &self,
        request: &TripRequest,
        limits: ExtractionLimits,
    ) -> Result<ExtractedParams> {
        let prompt = prompts::extraction_prompt(request.text());
        let schema = prompts::extraction_schema();

        let response = match self.complete(&prompt, &schema).await {
            Ok(value) => value,
            Err(err) if is_parse_failure(&err) => {
                // One stricter retry, then give up on this request
                warn!("Extraction response unparseable, retrying with strict instruction");
                let strict = format!("{prompt}{}", prompts::STRICT_JSON_SUFFIX);
                self.complete(&strict, &schema).await.map_err(|err| {
                    if is_parse_failure(&err) {
                        PlannerError::Extraction(ExtractionError::UnparseableResponse(
                            err.to_string(),
                        ))
                    } else {
                        err
                    }
                })?
            }
            Err(err) => return Err(err),
        };

        let params = Self::coerce(response)?;
        debug!(
            destination = %params.destination,
            day_count = params.day_count,
            interests = params.interests.len(),
            "Extraction complete"
        );
        Ok(params.clamp_days(limits.max_days))
    }

    async fn complete(&self, prompt: &str, schema: &Value) -> Result<Value> {
        with_retries(&self.retry, "completion", || {
            self.provider.complete(prompt, schema)
        })
        .await
    }

    /// Coerce a schema-shaped Value into the data contract
    fn coerce(value: Value) -> Result<ExtractedParams> {
        let draft: ExtractionDraft = serde_json::from_value(value).map_err(|e| {
            PlannerError::Extraction(ExtractionError::UnparseableResponse(e.to_string()))
        })?;

        let destination = draft
            .destination
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .ok_or(ExtractionError::NoDestination)?;

        let destination_type = draft
            .destination_type
            .as_deref()
            .map(DestinationType::from_tag)
            .unwrap_or_default();

        let interests = match draft.interests {
            Some(InterestList::Tags(tags)) => tags,
            // Older model responses emit a comma-separated string
            Some(InterestList::CommaSeparated(s)) => {
                s.split(',').map(|t| t.trim().to_string()).collect()
            }
            None => Vec::new(),
        };

        let day_count = match draft.day_count {
            Some(n) if n >= 1 => n as u32,
            _ => 1,
        };

        Ok(ExtractedParams::new(
            destination,
            destination_type,
            interests,
            day_count,
        ))
    }
}

fn is_parse_failure(err: &PlannerError) -> bool {
    matches!(err, PlannerError::Llm(llm) if llm.category == ErrorCategory::ParseError)
}

#[derive(Debug, Deserialize)]
struct ExtractionDraft {
    #[serde(default)]
    destination: Option<String>,
    #[serde(default)]
    destination_type: Option<String>,
    #[serde(default)]
    interests: Option<InterestList>,
    #[serde(default)]
    day_count: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InterestList {
    Tags(Vec<String>),
    CommaSeparated(String),
}
