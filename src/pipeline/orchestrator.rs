//! Turn Orchestrator
//!
//! Sequences the handlers per turn and owns the session lifecycle. Two entry
//! points: [`Orchestrator::submit_request`] runs extraction then generation
//! for a raw trip request, and [`Orchestrator::handle_turn`] classifies and
//! routes a follow-up instruction.
//!
//! Every turn produces a textual reply. Handler failures move the session to
//! the `Error` phase but keep the last known-good state, so the next
//! successful turn picks up where the conversation left off.

use tracing::{info, instrument, warn};

use super::classifier::IntentClassifier;
use super::extraction::{ExtractionHandler, ExtractionLimits};
use super::generator::ItineraryGenerator;
use super::question::QuestionHandler;
use super::resolver::ModificationResolver;
use crate::ai::provider::SharedProvider;
use crate::ai::retry::RetryPolicy;
use crate::geo::SharedGeocoder;
use crate::types::{ConversationState, Intent, Itinerary, Place, Speaker, TripRequest};

/// Where a session currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No trip request has been extracted yet
    AwaitingExtraction,
    /// An itinerary exists and follow-up turns are accepted
    Ready,
    /// A turn is in flight
    Processing,
    /// The last turn failed; state holds the last known-good snapshot
    Error,
}

/// One planning conversation: phase plus the last known-good state
#[derive(Debug, Clone)]
pub struct PlannerSession {
    phase: SessionPhase,
    state: Option<ConversationState>,
}

impl PlannerSession {
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::AwaitingExtraction,
            state: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn state(&self) -> Option<&ConversationState> {
        self.state.as_ref()
    }

    pub fn itinerary(&self) -> Option<&Itinerary> {
        self.state.as_ref().map(|s| &s.itinerary)
    }

    /// Commit a successful turn: new snapshot, back to Ready
    fn commit(&mut self, state: ConversationState) {
        self.state = Some(state);
        self.phase = SessionPhase::Ready;
    }

    /// Record a failed turn; the prior snapshot stays authoritative
    fn fail(&mut self) {
        self.phase = SessionPhase::Error;
    }
}

impl Default for PlannerSession {
    fn default() -> Self {
        Self::new()
    }
}

/// What a turn produced
#[derive(Debug, Clone, PartialEq)]
pub enum TurnReply {
    /// The itinerary changed; `places` is the full new list
    Modification {
        places: Vec<Place>,
        response: String,
    },
    /// Informational reply; the itinerary is untouched
    Answer { response: String },
}

impl TurnReply {
    pub fn response(&self) -> &str {
        match self {
            Self::Modification { response, .. } | Self::Answer { response } => response,
        }
    }
}

/// Sequences extraction, generation, classification and resolution per turn
pub struct Orchestrator {
    extraction: ExtractionHandler,
    generator: ItineraryGenerator,
    classifier: IntentClassifier,
    resolver: ModificationResolver,
    question: QuestionHandler,
    limits: ExtractionLimits,
}

impl Orchestrator {
    pub fn new(provider: SharedProvider, geocoder: SharedGeocoder, retry: RetryPolicy) -> Self {
        let generator = ItineraryGenerator::new(provider.clone(), geocoder, retry.clone());
        Self {
            extraction: ExtractionHandler::new(provider.clone(), retry.clone()),
            classifier: IntentClassifier::new(provider.clone(), retry.clone()),
            resolver: ModificationResolver::new(generator.clone()),
            question: QuestionHandler::new(provider, retry),
            generator,
            limits: ExtractionLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: ExtractionLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_generator(mut self, generator: ItineraryGenerator) -> Self {
        self.resolver = ModificationResolver::new(generator.clone());
        self.generator = generator;
        self
    }

    /// Extract a trip request and generate the initial itinerary.
    ///
    /// A re-submission on an existing session supersedes the extraction
    /// wholesale but keeps the turn history.
    #[instrument(skip(self, session, request))]
    pub async fn submit_request(
        &self,
        session: &mut PlannerSession,
        request: &TripRequest,
    ) -> TurnReply {
        session.phase = SessionPhase::Processing;

        let params = match self.extraction.extract(request, self.limits).await {
            Ok(params) => params,
            Err(err) => {
                warn!(error = %err, "Extraction failed");
                session.fail();
                return TurnReply::Answer {
                    response: err.user_message(),
                };
            }
        };

        let itinerary = match self.generator.generate(&params).await {
            Ok(itinerary) => itinerary,
            Err(err) => {
                warn!(error = %err, "Generation failed");
                session.fail();
                return TurnReply::Answer {
                    response: err.user_message(),
                };
            }
        };

        let response = format!(
            "Planned a {}-day trip to {} with {} places.",
            params.day_count,
            params.destination,
            itinerary.len(),
        );
        info!(
            destination = %params.destination,
            places = itinerary.len(),
            "Itinerary generated"
        );

        let base = match &session.state {
            Some(prior) => prior.with_extracted(params),
            None => ConversationState::new(params),
        };
        let next = base
            .with_itinerary(itinerary.clone())
            .with_turn(Speaker::User, request.text())
            .with_turn(Speaker::Assistant, &response);
        session.commit(next);

        TurnReply::Modification {
            places: itinerary.places().to_vec(),
            response,
        }
    }

    /// Classify and apply one follow-up instruction
    #[instrument(skip(self, session, instruction))]
    pub async fn handle_turn(&self, session: &mut PlannerSession, instruction: &str) -> TurnReply {
        let Some(state) = session.state.clone() else {
            return TurnReply::Answer {
                response: "Tell me where you'd like to go first.".to_string(),
            };
        };
        session.phase = SessionPhase::Processing;

        let intent = self.classifier.classify(instruction, &state).await;
        info!(intent = intent.label(), "Handling turn");

        match intent {
            Intent::Question(question) => {
                let answer = self.question.answer(&question, &state).await;
                session.commit(record_turn(&state, instruction, &answer));
                TurnReply::Answer { response: answer }
            }
            // Unclassifiable turns still get a best-effort textual answer
            Intent::Unknown => {
                let answer = self.question.answer(instruction, &state).await;
                session.commit(record_turn(&state, instruction, &answer));
                TurnReply::Answer { response: answer }
            }
            modification => {
                debug_assert!(modification.is_modification());
                match self.resolver.resolve(&modification, &state).await {
                    Ok(resolution) => {
                        let next = record_turn(&state, instruction, &resolution.confirmation)
                            .with_itinerary(resolution.itinerary.clone());
                        session.commit(next);
                        TurnReply::Modification {
                            places: resolution.itinerary.places().to_vec(),
                            response: resolution.confirmation,
                        }
                    }
                    Err(err) => {
                        warn!(intent = modification.label(), error = %err, "Resolution failed");
                        session.fail();
                        TurnReply::Answer {
                            response: err.user_message(),
                        }
                    }
                }
            }
        }
    }
}

fn record_turn(
    state: &ConversationState,
    instruction: &str,
    response: &str,
) -> ConversationState {
    state
        .with_turn(Speaker::User, instruction)
        .with_turn(Speaker::Assistant, response)
}
