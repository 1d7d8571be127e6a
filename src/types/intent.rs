//! Intent and Selector Types
//!
//! Closed tagged-variant vocabulary for follow-up instructions, and the
//! selector type used to reference a specific place. Intents are produced
//! fresh per turn and never persisted beyond the turn that consumed them.

use serde::{Deserialize, Serialize};

use super::trip::{Category, Itinerary, normalize_name};

// =============================================================================
// Selector
// =============================================================================

/// A reference identifying which place an instruction targets.
///
/// Resolution is deterministic: the first match in list order wins. That
/// tie-break is deliberate and documented rather than inferred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selector {
    /// Explicit zero-based position in the itinerary
    Index(usize),
    /// Case-insensitive name match (exact normalized name, then substring)
    Name(String),
    /// The nth place of a category, in list order
    Category { category: Category, ordinal: usize },
}

impl Selector {
    /// Resolve to an index into the itinerary, first match in list order
    pub fn resolve(&self, itinerary: &Itinerary) -> Option<usize> {
        match self {
            Self::Index(index) => {
                if *index < itinerary.len() {
                    Some(*index)
                } else {
                    None
                }
            }
            Self::Name(name) => {
                let key = normalize_name(name);
                if key.is_empty() {
                    return None;
                }
                // Exact normalized match takes precedence over substring
                itinerary
                    .iter()
                    .position(|p| p.normalized_name() == key)
                    .or_else(|| {
                        itinerary
                            .iter()
                            .position(|p| p.normalized_name().contains(&key))
                    })
            }
            Self::Category { category, ordinal } => itinerary
                .iter()
                .enumerate()
                .filter(|(_, p)| p.category == *category)
                .map(|(i, _)| i)
                .nth(*ordinal),
        }
    }

    /// Human-readable form for error messages
    pub fn describe(&self) -> String {
        match self {
            Self::Index(index) => format!("place #{}", index + 1),
            Self::Name(name) => name.clone(),
            Self::Category { category, ordinal } => {
                if *ordinal == 0 {
                    format!("the {category} place")
                } else {
                    format!("{category} place #{}", ordinal + 1)
                }
            }
        }
    }
}

// =============================================================================
// Place Change
// =============================================================================

/// Field-level overwrites for a Modify intent; `None` fields are untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaceChange {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub neighborhood: Option<String>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl PlaceChange {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.neighborhood.is_none()
            && self.category.is_none()
            && self.address.is_none()
            && self.notes.is_none()
    }
}

// =============================================================================
// Reorder Criterion
// =============================================================================

/// How to re-sort the full itinerary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReorderBy {
    /// Cluster places of the same category together
    Category,
    /// Alphabetical by name
    Name,
}

// =============================================================================
// Intent
// =============================================================================

/// The classified action a follow-up instruction represents.
///
/// Classification is total: anything outside the closed vocabulary maps to
/// `Unknown`, which routes to the question handler so every turn gets a
/// textual response.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Generate and append one place matching the description
    Add(String),
    /// Remove the selected place
    Remove(Selector),
    /// Overwrite fields of the selected place in position
    Modify(Selector, PlaceChange),
    /// Re-sort the full list
    Reorder(ReorderBy),
    /// Answer without mutating the itinerary
    Question(String),
    /// Discard the itinerary and re-run generation
    Regenerate,
    /// Could not classify; treated as a question over the raw instruction
    Unknown,
}

impl Intent {
    /// Whether this intent mutates the itinerary
    pub fn is_modification(&self) -> bool {
        matches!(
            self,
            Self::Add(_) | Self::Remove(_) | Self::Modify(..) | Self::Reorder(_) | Self::Regenerate
        )
    }

    /// Label matching the closed classification vocabulary
    pub fn label(&self) -> &'static str {
        match self {
            Self::Add(_) => "add",
            Self::Remove(_) => "remove",
            Self::Modify(..) => "modify",
            Self::Reorder(_) => "reorder",
            Self::Question(_) => "question",
            Self::Regenerate => "regenerate",
            Self::Unknown => "unknown",
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::trip::Place;

    fn itinerary() -> Itinerary {
        Itinerary::from_candidates(vec![
            Place::new("Museu Picasso", Category::Art),
            Place::new("El Xampanyet", Category::Food),
            Place::new("Park Guell", Category::Sightseeing),
            Place::new("Bar Canete", Category::Food),
        ])
    }

    #[test]
    fn test_resolve_index() {
        let it = itinerary();
        assert_eq!(Selector::Index(2).resolve(&it), Some(2));
        assert_eq!(Selector::Index(4).resolve(&it), None);
    }

    #[test]
    fn test_resolve_exact_name_beats_substring() {
        let it = Itinerary::from_candidates(vec![
            Place::new("Cafe Central Annex", Category::Food),
            Place::new("Cafe Central", Category::Food),
        ]);
        assert_eq!(
            Selector::Name("cafe central".into()).resolve(&it),
            Some(1)
        );
    }

    #[test]
    fn test_resolve_name_substring_first_match() {
        let it = itinerary();
        assert_eq!(Selector::Name("picasso".into()).resolve(&it), Some(0));
        assert_eq!(Selector::Name("nowhere".into()).resolve(&it), None);
        assert_eq!(Selector::Name("  ".into()).resolve(&it), None);
    }

    #[test]
    fn test_resolve_category_ordinal() {
        let it = itinerary();
        let first_food = Selector::Category {
            category: Category::Food,
            ordinal: 0,
        };
        let second_food = Selector::Category {
            category: Category::Food,
            ordinal: 1,
        };
        let third_food = Selector::Category {
            category: Category::Food,
            ordinal: 2,
        };
        assert_eq!(first_food.resolve(&it), Some(1));
        assert_eq!(second_food.resolve(&it), Some(3));
        assert_eq!(third_food.resolve(&it), None);
    }

    #[test]
    fn test_place_change_is_empty() {
        assert!(PlaceChange::default().is_empty());
        let change = PlaceChange {
            notes: Some("book ahead".into()),
            ..Default::default()
        };
        assert!(!change.is_empty());
    }

    #[test]
    fn test_intent_is_modification() {
        assert!(Intent::Add("a tapas bar".into()).is_modification());
        assert!(Intent::Regenerate.is_modification());
        assert!(!Intent::Question("how far?".into()).is_modification());
        assert!(!Intent::Unknown.is_modification());
    }
}
