//! Planning Pipeline
//!
//! The handlers that turn free-form trip requests into geocoded itineraries
//! and apply follow-up instructions, plus the orchestrator that sequences
//! them per turn.
//!
//! Data flow: raw text → [`ExtractionHandler`] → [`ItineraryGenerator`] →
//! place list. Follow-up turns: (instruction, state) → [`IntentClassifier`] →
//! [`ModificationResolver`] or [`QuestionHandler`] → (new state, response).

pub mod classifier;
pub mod extraction;
pub mod generator;
pub mod orchestrator;
pub mod prompts;
pub mod question;
pub mod resolver;

pub use classifier::IntentClassifier;
pub use extraction::{ExtractionHandler, ExtractionLimits};
pub use generator::ItineraryGenerator;
pub use orchestrator::{Orchestrator, PlannerSession, SessionPhase, TurnReply};
pub use question::QuestionHandler;
pub use resolver::{ModificationResolver, Resolution};

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted fakes shared by pipeline tests.

    use async_trait::async_trait;
    use serde_json::Value;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use crate::ai::provider::{CompletionProvider, SharedProvider};
    use crate::geo::{GeocodeHit, Geocoder, SharedGeocoder};
    use crate::types::{
        Coordinates, ErrorCategory, LlmError, PlannerError, Result, normalize_name,
    };

    /// Completion provider replaying a scripted response sequence and
    /// recording every prompt it receives.
    pub struct ScriptedProvider {
        responses: Mutex<VecDeque<Result<Value>>>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        pub fn new(responses: Vec<Result<Value>>) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().collect()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn shared(responses: Vec<Result<Value>>) -> Arc<Self> {
            Arc::new(Self::new(responses))
        }

        /// Provider that always returns clones of one value
        pub fn always(value: Value) -> SharedProvider {
            Arc::new(AlwaysProvider { value })
        }

        /// Provider whose every call fails as unavailable
        pub fn unavailable() -> SharedProvider {
            Arc::new(UnavailableProvider)
        }

        pub fn prompt(&self, index: usize) -> String {
            self.prompts.lock().unwrap()[index].clone()
        }

        pub fn call_count(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        async fn complete(&self, prompt: &str, _schema: &Value) -> Result<Value> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| {
                    Err(PlannerError::Config("scripted responses exhausted".into()))
                })
        }

        fn name(&self) -> &str {
            "scripted"
        }

        fn model(&self) -> &str {
            "scripted-model"
        }
    }

    struct AlwaysProvider {
        value: Value,
    }

    #[async_trait]
    impl CompletionProvider for AlwaysProvider {
        async fn complete(&self, _prompt: &str, _schema: &Value) -> Result<Value> {
            Ok(self.value.clone())
        }

        fn name(&self) -> &str {
            "always"
        }

        fn model(&self) -> &str {
            "always-model"
        }
    }

    struct UnavailableProvider;

    #[async_trait]
    impl CompletionProvider for UnavailableProvider {
        async fn complete(&self, _prompt: &str, _schema: &Value) -> Result<Value> {
            Err(PlannerError::Llm(LlmError::with_service(
                ErrorCategory::Auth, // not retryable, keeps tests fast
                "service down",
                "completion",
            )))
        }

        fn name(&self) -> &str {
            "unavailable"
        }

        fn model(&self) -> &str {
            "unavailable-model"
        }
    }

    /// Geocoder resolving only names registered up front; everything else is
    /// a typed miss.
    pub struct StaticGeocoder {
        known: Vec<(String, GeocodeHit)>,
    }

    impl StaticGeocoder {
        pub fn new(entries: &[(&str, f64, f64)]) -> SharedGeocoder {
            let known = entries
                .iter()
                .map(|(name, lat, lon)| {
                    (
                        normalize_name(name),
                        GeocodeHit {
                            coordinates: Coordinates {
                                lat: *lat,
                                lon: *lon,
                            },
                            canonical_address: Some(format!("{name} (canonical)")),
                        },
                    )
                })
                .collect();
            Arc::new(Self { known })
        }

        /// Geocoder that misses every query
        pub fn all_miss() -> SharedGeocoder {
            Arc::new(Self { known: Vec::new() })
        }

        /// Geocoder whose every call fails hard
        pub fn always_failing() -> SharedGeocoder {
            Arc::new(FailingGeocoder)
        }
    }

    #[async_trait]
    impl Geocoder for StaticGeocoder {
        async fn geocode(&self, query: &str, _locality: &str) -> Result<Option<GeocodeHit>> {
            let key = normalize_name(query);
            Ok(self
                .known
                .iter()
                .find(|(name, _)| key.contains(name.as_str()))
                .map(|(_, hit)| hit.clone()))
        }

        fn name(&self) -> &str {
            "static"
        }
    }

    struct FailingGeocoder;

    #[async_trait]
    impl Geocoder for FailingGeocoder {
        async fn geocode(&self, _query: &str, _locality: &str) -> Result<Option<GeocodeHit>> {
            Err(PlannerError::Llm(LlmError::with_service(
                ErrorCategory::Auth, // not retryable, keeps tests fast
                "geocoder down",
                "geocoder",
            )))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }
}
