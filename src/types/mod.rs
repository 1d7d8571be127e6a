//! Core Types
//!
//! Data model and unified error taxonomy for the planning pipeline.

pub mod error;
pub mod intent;
pub mod state;
pub mod trip;

pub use error::{
    ErrorCategory, ErrorClassifier, ExtractionError, GenerationError, LlmError, PlannerError,
    ResolutionError, Result,
};
pub use intent::{Intent, PlaceChange, ReorderBy, Selector};
pub use state::{ConversationState, Speaker, TurnRecord};
pub use trip::{
    Category, Coordinates, DestinationType, ExtractedParams, Itinerary, Place, TripRequest,
    normalize_name,
};
