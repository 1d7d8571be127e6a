//! Conversation State
//!
//! The full snapshot of one planning session: extracted parameters, the
//! current itinerary, and the turn history. Each turn produces a new state
//! value (functional update) so a failed turn never corrupts prior state.
//! Serializing turns per session is the caller's responsibility.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::trip::{ExtractedParams, Itinerary};

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

/// One entry in the turn history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub speaker: Speaker,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl TurnRecord {
    pub fn now(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Versioned snapshot of one planning session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    /// Session id for log correlation only; persistence is the caller's concern
    pub session_id: Uuid,
    pub extracted: ExtractedParams,
    pub itinerary: Itinerary,
    pub turns: Vec<TurnRecord>,
}

impl ConversationState {
    pub fn new(extracted: ExtractedParams) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            extracted,
            itinerary: Itinerary::new(),
            turns: Vec::new(),
        }
    }

    /// New snapshot with a replaced itinerary
    pub fn with_itinerary(&self, itinerary: Itinerary) -> Self {
        Self {
            itinerary,
            ..self.clone()
        }
    }

    /// New snapshot with a turn appended
    pub fn with_turn(&self, speaker: Speaker, text: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.turns.push(TurnRecord::now(speaker, text));
        next
    }

    /// New snapshot superseding the extraction (re-submission)
    pub fn with_extracted(&self, extracted: ExtractedParams) -> Self {
        Self {
            extracted,
            ..self.clone()
        }
    }

    /// Place names in list order, for classification context
    pub fn place_names(&self) -> Vec<&str> {
        self.itinerary.iter().map(|p| p.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::trip::{Category, DestinationType, Place};

    fn state() -> ConversationState {
        ConversationState::new(ExtractedParams::new(
            "Hanoi",
            DestinationType::City,
            vec!["food".into()],
            2,
        ))
    }

    #[test]
    fn test_functional_update_leaves_original_untouched() {
        let original = state();
        let mut itinerary = Itinerary::new();
        itinerary.push_unique(Place::new("Night Market", Category::Other));

        let next = original.with_itinerary(itinerary).with_turn(
            Speaker::User,
            "add a night market",
        );

        assert!(original.itinerary.is_empty());
        assert!(original.turns.is_empty());
        assert_eq!(next.itinerary.len(), 1);
        assert_eq!(next.turns.len(), 1);
        assert_eq!(next.session_id, original.session_id);
    }

    #[test]
    fn test_with_extracted_supersedes() {
        let original = state();
        let next = original.with_extracted(ExtractedParams::new(
            "Hue",
            DestinationType::City,
            vec![],
            1,
        ));
        assert_eq!(original.extracted.destination, "Hanoi");
        assert_eq!(next.extracted.destination, "Hue");
    }

    #[test]
    fn test_place_names_in_order() {
        let mut itinerary = Itinerary::new();
        itinerary.push_unique(Place::new("A", Category::Food));
        itinerary.push_unique(Place::new("B", Category::Art));
        let s = state().with_itinerary(itinerary);
        assert_eq!(s.place_names(), vec!["A", "B"]);
    }
}
