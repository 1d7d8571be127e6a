//! Trip Domain Types
//!
//! The structured data contract the pipeline coerces untrusted completion
//! output into: trip requests, extracted parameters, places, and itineraries.

use serde::{Deserialize, Serialize};

// =============================================================================
// Trip Request
// =============================================================================

/// Raw user text for a trip request; immutable, created per submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripRequest(String);

impl TripRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn text(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TripRequest {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

// =============================================================================
// Extracted Parameters
// =============================================================================

/// What kind of destination the user named
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DestinationType {
    #[default]
    City,
    Region,
    Country,
    Landmark,
}

impl DestinationType {
    /// Parse a loosely-typed tag from a completion response
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "region" | "state" | "province" | "area" => Self::Region,
            "country" => Self::Country,
            "landmark" | "attraction" | "site" => Self::Landmark,
            _ => Self::City,
        }
    }
}

/// Structured parameters extracted from a trip request.
///
/// Immutable once produced; a re-submission supersedes the previous
/// extraction wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedParams {
    pub destination: String,
    pub destination_type: DestinationType,
    /// Ordered, case-insensitively deduplicated interest tags
    pub interests: Vec<String>,
    /// Always >= 1; clamped to the caller-supplied maximum
    pub day_count: u32,
}

impl ExtractedParams {
    /// Build params, normalizing interests and flooring the day count at 1
    pub fn new(
        destination: impl Into<String>,
        destination_type: DestinationType,
        interests: Vec<String>,
        day_count: u32,
    ) -> Self {
        Self {
            destination: destination.into(),
            destination_type,
            interests: dedupe_interests(interests),
            day_count: day_count.max(1),
        }
    }

    /// Clamp the day count to a subscription-tier maximum.
    ///
    /// The cap is a caller concern, injected per call rather than owned here.
    pub fn clamp_days(mut self, max_days: u32) -> Self {
        self.day_count = self.day_count.clamp(1, max_days.max(1));
        self
    }
}

/// Dedupe interest tags case-insensitively, preserving first-seen order
fn dedupe_interests(interests: Vec<String>) -> Vec<String> {
    let mut seen = Vec::new();
    let mut out = Vec::new();
    for interest in interests {
        let tag = interest.trim().to_string();
        if tag.is_empty() {
            continue;
        }
        let key = tag.to_lowercase();
        if !seen.contains(&key) {
            seen.push(key);
            out.push(tag);
        }
    }
    out
}

// =============================================================================
// Place
// =============================================================================

/// Category of a place within an itinerary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Food,
    Art,
    Sightseeing,
    #[default]
    Other,
}

impl Category {
    /// Map a loosely-typed category tag onto the closed vocabulary.
    ///
    /// The completion service uses a wider vocabulary (culture, shopping,
    /// dining, ...) than the data model carries.
    pub fn from_tag(tag: &str) -> Self {
        let lower = tag.trim().to_lowercase();
        if lower.contains("food")
            || lower.contains("restaurant")
            || lower.contains("dining")
            || lower.contains("cafe")
        {
            Self::Food
        } else if lower.contains("art")
            || lower.contains("museum")
            || lower.contains("culture")
            || lower.contains("gallery")
        {
            Self::Art
        } else if lower.contains("sight")
            || lower.contains("attraction")
            || lower.contains("landmark")
            || lower.contains("monument")
        {
            Self::Sightseeing
        } else {
            Self::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Art => "art",
            Self::Sightseeing => "sightseeing",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Geographic coordinates (WGS84)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// A single place in an itinerary.
///
/// Coordinates are optional: a geocoding miss keeps the place, flagged
/// non-mappable with a note, so downstream consumers can still list it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neighborhood: Option<String>,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Place {
    pub fn new(name: impl Into<String>, category: Category) -> Self {
        Self {
            name: name.into(),
            neighborhood: None,
            category,
            address: None,
            coordinates: None,
            notes: None,
        }
    }

    /// Identity key within an itinerary: lowercase, whitespace-collapsed
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }

    /// Whether this place can be rendered on a map
    pub fn mappable(&self) -> bool {
        self.coordinates.is_some()
    }

    /// Append a note, separated from any existing notes
    pub fn annotate(&mut self, note: &str) {
        match &mut self.notes {
            Some(existing) if !existing.is_empty() => {
                existing.push_str("; ");
                existing.push_str(note);
            }
            _ => self.notes = Some(note.to_string()),
        }
    }
}

/// Lowercase and collapse internal whitespace
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

// =============================================================================
// Itinerary
// =============================================================================

/// Ordered sequence of places with unique normalized names.
///
/// Day boundaries are a derived presentation view, not stored here; the
/// pipeline treats the list as flat. Mutation goes through this API so the
/// uniqueness invariant holds everywhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Itinerary {
    places: Vec<Place>,
}

impl Itinerary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from candidates, dropping duplicates by normalized name and
    /// preserving first-seen order
    pub fn from_candidates(candidates: Vec<Place>) -> Self {
        let mut itinerary = Self::new();
        for place in candidates {
            itinerary.push_unique(place);
        }
        itinerary
    }

    pub fn places(&self) -> &[Place] {
        &self.places
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Place> {
        self.places.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Place> {
        self.places.iter()
    }

    /// Whether a place with this normalized name is already present
    pub fn contains_name(&self, name: &str) -> bool {
        let key = normalize_name(name);
        self.places.iter().any(|p| p.normalized_name() == key)
    }

    /// Append a place unless its normalized name is already present.
    /// Returns false when the place was dropped as a duplicate.
    pub fn push_unique(&mut self, place: Place) -> bool {
        if self.contains_name(&place.name) {
            return false;
        }
        self.places.push(place);
        true
    }

    /// Remove the place at `index`, keeping relative order of the rest
    pub fn remove_at(&mut self, index: usize) -> Option<Place> {
        if index < self.places.len() {
            Some(self.places.remove(index))
        } else {
            None
        }
    }

    /// Replace the place at `index`, preserving its position.
    /// Fails (returns false) if the new name collides with another entry.
    pub fn replace_at(&mut self, index: usize, place: Place) -> bool {
        if index >= self.places.len() {
            return false;
        }
        let key = place.normalized_name();
        let collides = self
            .places
            .iter()
            .enumerate()
            .any(|(i, p)| i != index && p.normalized_name() == key);
        if collides {
            return false;
        }
        self.places[index] = place;
        true
    }

    /// Stable re-sort of the full list; relative order within equal keys kept
    pub fn reorder_by<K: Ord>(&mut self, key: impl FnMut(&Place) -> K) {
        self.places.sort_by_key(key);
    }
}

impl<'a> IntoIterator for &'a Itinerary {
    type Item = &'a Place;
    type IntoIter = std::slice::Iter<'a, Place>;

    fn into_iter(self) -> Self::IntoIter {
        self.places.iter()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::planner;
    use proptest::prelude::*;

    fn place(name: &str) -> Place {
        Place::new(name, Category::Other)
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  La   Sagrada  Familia "), "la sagrada familia");
        assert_eq!(normalize_name("MoMA"), "moma");
    }

    #[test]
    fn test_category_from_tag() {
        assert_eq!(Category::from_tag("Food"), Category::Food);
        assert_eq!(Category::from_tag("fine dining"), Category::Food);
        assert_eq!(Category::from_tag("culture"), Category::Art);
        assert_eq!(Category::from_tag("art museum"), Category::Art);
        assert_eq!(Category::from_tag("sightseeing"), Category::Sightseeing);
        assert_eq!(Category::from_tag("shopping"), Category::Other);
        assert_eq!(Category::from_tag(""), Category::Other);
    }

    #[test]
    fn test_destination_type_from_tag() {
        assert_eq!(DestinationType::from_tag("city"), DestinationType::City);
        assert_eq!(DestinationType::from_tag("Country"), DestinationType::Country);
        assert_eq!(DestinationType::from_tag("region"), DestinationType::Region);
        assert_eq!(DestinationType::from_tag("landmark"), DestinationType::Landmark);
        assert_eq!(DestinationType::from_tag("???"), DestinationType::City);
    }

    #[test]
    fn test_params_dedupe_interests() {
        let params = ExtractedParams::new(
            "Barcelona",
            DestinationType::City,
            vec![
                "art".to_string(),
                "Food".to_string(),
                "ART".to_string(),
                "  ".to_string(),
                "food".to_string(),
            ],
            2,
        );
        assert_eq!(params.interests, vec!["art", "Food"]);
    }

    #[test]
    fn test_params_day_count_floor_and_clamp() {
        let params = ExtractedParams::new("Kyoto", DestinationType::City, vec![], 0);
        assert_eq!(params.day_count, 1);

        let clamped = ExtractedParams::new("Kyoto", DestinationType::City, vec![], 30)
            .clamp_days(planner::DEFAULT_MAX_DAYS);
        assert_eq!(clamped.day_count, planner::DEFAULT_MAX_DAYS);
    }

    #[test]
    fn test_itinerary_dedup_preserves_first_seen_order() {
        let itinerary = Itinerary::from_candidates(vec![
            place("Park Guell"),
            place("La Boqueria"),
            place("park  guell"),
            place("Casa Mila"),
        ]);
        let names: Vec<_> = itinerary.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Park Guell", "La Boqueria", "Casa Mila"]);
    }

    #[test]
    fn test_push_unique_rejects_duplicate() {
        let mut itinerary = Itinerary::from_candidates(vec![place("A")]);
        assert!(!itinerary.push_unique(place("a")));
        assert_eq!(itinerary.len(), 1);
    }

    #[test]
    fn test_remove_keeps_relative_order() {
        let mut itinerary =
            Itinerary::from_candidates(vec![place("A"), place("B"), place("C")]);
        let removed = itinerary.remove_at(1).unwrap();
        assert_eq!(removed.name, "B");
        let names: Vec<_> = itinerary.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["A", "C"]);
    }

    #[test]
    fn test_replace_at_rejects_name_collision() {
        let mut itinerary = Itinerary::from_candidates(vec![place("A"), place("B")]);
        assert!(!itinerary.replace_at(1, place("a")));
        assert!(itinerary.replace_at(1, place("C")));
        assert_eq!(itinerary.get(1).unwrap().name, "C");
    }

    #[test]
    fn test_annotate_appends() {
        let mut p = place("A");
        p.annotate("location not found");
        assert_eq!(p.notes.as_deref(), Some("location not found"));
        p.annotate("second");
        assert_eq!(p.notes.as_deref(), Some("location not found; second"));
    }

    #[test]
    fn test_place_serde_shape() {
        let mut p = Place::new("Museu Picasso", Category::Art);
        p.coordinates = Some(Coordinates { lat: 41.385, lon: 2.181 });
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["category"], "art");
        assert_eq!(json["coordinates"]["lat"], 41.385);
        assert!(json.get("address").is_none());
    }

    proptest! {
        #[test]
        fn prop_from_candidates_never_duplicates(names in proptest::collection::vec("[a-zA-Z ]{1,12}", 0..20)) {
            let itinerary = Itinerary::from_candidates(
                names.iter().map(|n| place(n)).collect(),
            );
            let mut keys: Vec<_> = itinerary.iter().map(|p| p.normalized_name()).collect();
            keys.sort();
            let before = keys.len();
            keys.dedup();
            prop_assert_eq!(before, keys.len());
        }

        #[test]
        fn prop_remove_preserves_frame(len in 2usize..8, index in 0usize..8) {
            let index = index % len;
            let original: Vec<Place> = (0..len)
                .map(|i| {
                    let mut p = place(&format!("place {i}"));
                    p.notes = Some(format!("note {i}"));
                    p
                })
                .collect();
            let mut itinerary = Itinerary::from_candidates(original.clone());
            itinerary.remove_at(index);

            let mut expected = original;
            expected.remove(index);
            prop_assert_eq!(itinerary.places(), expected.as_slice());
        }
    }
}
