//! TripWeaver - Conversational Trip Itinerary Planner
//!
//! Turns free-form trip requests into geocoded itineraries and refines them
//! through follow-up conversation. A language-completion service proposes
//! structured places, a geocoding service pins them to coordinates, and an
//! orchestrator applies classified follow-up intents against an immutable
//! conversation state.
//!
//! ## Pipeline
//!
//! 1. **Extraction**: raw text → destination, interests, day count
//! 2. **Generation**: parameters → deduplicated, geocoded place list
//! 3. **Follow-up turns**: instruction → intent → modification or answer
//!
//! ## Quick Start
//!
//! ```ignore
//! use tripweaver::config::ConfigLoader;
//! use tripweaver::pipeline::{Orchestrator, PlannerSession};
//! use tripweaver::types::TripRequest;
//!
//! let config = ConfigLoader::load()?;
//! let provider = tripweaver::ai::provider::create_provider(&config.llm)?;
//! let geocoder = Arc::new(MapboxGeocoder::new(config.geocoder.clone())?);
//! let orchestrator = Orchestrator::new(provider, geocoder, config.planner.retry.to_policy());
//!
//! let mut session = PlannerSession::new();
//! let reply = orchestrator
//!     .submit_request(&mut session, &TripRequest::new("2 days of art in Barcelona"))
//!     .await;
//! ```
//!
//! ## Modules
//!
//! - [`ai`]: completion provider, JSON repair, bounded retry
//! - [`geo`]: geocoding adapter with typed misses
//! - [`pipeline`]: extraction, generation, classification, resolution
//! - [`types`]: data model and error taxonomy
//! - [`config`]: figment-layered configuration

pub mod ai;
pub mod cli;
pub mod config;
pub mod constants;
pub mod geo;
pub mod pipeline;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader, PlannerConfig, RetryConfig};

// Error Types
pub use types::{
    ErrorCategory, ExtractionError, GenerationError, PlannerError, ResolutionError, Result,
};

// Data Model
pub use types::{
    Category, ConversationState, Coordinates, ExtractedParams, Intent, Itinerary, Place,
    Selector, TripRequest,
};

// =============================================================================
// Pipeline Re-exports
// =============================================================================

pub use pipeline::{
    ExtractionHandler, ExtractionLimits, IntentClassifier, ItineraryGenerator,
    ModificationResolver, Orchestrator, PlannerSession, QuestionHandler, SessionPhase, TurnReply,
};

// =============================================================================
// Adapter Re-exports
// =============================================================================

pub use ai::{CompletionProvider, OpenAiProvider, RetryPolicy, SharedProvider};
pub use geo::{GeocodeHit, Geocoder, MapboxGeocoder, SharedGeocoder};
