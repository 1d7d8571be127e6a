//! Itinerary Generator
//!
//! Produces a candidate place list for the extracted parameters:
//! completion → dedup by normalized name → concurrent geocoding.
//!
//! Output order is the completion order after deduplication; there is no
//! algorithmic re-sorting (route optimization is out of scope). Geocoding
//! runs with bounded parallelism and results merge back in candidate order,
//! so deterministic inputs give deterministic output.

use futures::stream::{self, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::prompts;
use crate::ai::provider::SharedProvider;
use crate::ai::retry::{RetryPolicy, with_retries};
use crate::constants::planner;
use crate::geo::SharedGeocoder;
use crate::types::{
    Category, ExtractedParams, GenerationError, Itinerary, Place, PlannerError, Result,
};

/// Generates geocoded itineraries from extracted parameters
#[derive(Clone)]
pub struct ItineraryGenerator {
    provider: SharedProvider,
    geocoder: SharedGeocoder,
    retry: RetryPolicy,
    /// Candidates requested per day (policy constant, not user-controlled)
    places_per_day: usize,
    /// Concurrent geocoding bound within one turn
    geocode_parallelism: usize,
}

impl ItineraryGenerator {
    pub fn new(provider: SharedProvider, geocoder: SharedGeocoder, retry: RetryPolicy) -> Self {
        Self {
            provider,
            geocoder,
            retry,
            places_per_day: planner::PLACES_PER_DAY,
            geocode_parallelism: planner::GEOCODE_PARALLELISM,
        }
    }

    pub fn with_places_per_day(mut self, count: usize) -> Self {
        self.places_per_day = count.max(1);
        self
    }

    pub fn with_geocode_parallelism(mut self, parallelism: usize) -> Self {
        self.geocode_parallelism = parallelism.max(1);
        self
    }

    /// Generate a fresh itinerary for the extracted parameters
    #[instrument(skip(self, params), fields(destination = %params.destination, days = params.day_count))]
    pub async fn generate(&self, params: &ExtractedParams) -> Result<Itinerary> {
        let candidate_count = (params.day_count as usize * self.places_per_day)
            .max(planner::MIN_CANDIDATES);
        let prompt = prompts::itinerary_prompt(params, candidate_count);
        let schema = prompts::itinerary_schema();

        let response = self.complete(&prompt, &schema).await?;
        let candidates = Self::parse_candidates(response)?;
        info!(candidates = candidates.len(), "Received itinerary candidates");

        let deduped = dedupe_candidates(candidates);
        let geocoded = self.geocode_all(deduped, &params.destination).await?;

        Ok(Itinerary::from_candidates(geocoded))
    }

    /// Single-place path, reused by the Add intent in the resolver
    #[instrument(skip(self, params), fields(destination = %params.destination))]
    pub async fn generate_one(
        &self,
        description: &str,
        params: &ExtractedParams,
    ) -> Result<Place> {
        let prompt = prompts::single_place_prompt(description, params);
        let schema = prompts::single_place_schema();

        let response = self.complete(&prompt, &schema).await?;
        let draft: PlaceDraft = serde_json::from_value(response).map_err(|e| {
            GenerationError::UpstreamUnavailable(format!("malformed place response: {e}"))
        })?;
        let mut place = draft
            .into_place()
            .ok_or_else(|| GenerationError::UpstreamUnavailable("place with no name".into()))?;

        // A miss or geocoder failure keeps the place, flagged non-mappable
        if let Err(err) = self.geocode_place(&mut place, &params.destination).await {
            warn!(place = %place.name, error = %err, "Geocoding failed for added place");
            place.annotate(planner::UNMAPPED_NOTE);
        }
        Ok(place)
    }

    async fn complete(&self, prompt: &str, schema: &Value) -> Result<Value> {
        with_retries(&self.retry, "completion", || {
            self.provider.complete(prompt, schema)
        })
        .await
        .map_err(|err| match err {
            // Handler-level contract: a dead completion service is one error
            PlannerError::Llm(llm) => {
                GenerationError::UpstreamUnavailable(llm.to_string()).into()
            }
            other => other,
        })
    }

    fn parse_candidates(response: Value) -> Result<Vec<Place>> {
        let draft: ItineraryDraft = serde_json::from_value(response).map_err(|e| {
            PlannerError::Generation(GenerationError::UpstreamUnavailable(format!(
                "malformed itinerary response: {e}"
            )))
        })?;
        Ok(draft
            .places
            .into_iter()
            .filter_map(PlaceDraft::into_place)
            .collect())
    }

    /// Geocode candidates with bounded parallelism, merging in input order
    async fn geocode_all(&self, candidates: Vec<Place>, locality: &str) -> Result<Vec<Place>> {
        if candidates.is_empty() {
            return Ok(candidates);
        }
        let total = candidates.len();

        // buffered() yields in input order regardless of completion order
        let results: Vec<(Place, bool)> = stream::iter(candidates)
            .map(|mut place| async move {
                match self.geocode_place(&mut place, locality).await {
                    Ok(()) => (place, false),
                    Err(err) => {
                        warn!(place = %place.name, error = %err, "Geocoding failed hard");
                        place.annotate(planner::UNMAPPED_NOTE);
                        (place, true)
                    }
                }
            })
            .buffered(self.geocode_parallelism)
            .collect()
            .await;

        let hard_failures = results.iter().filter(|(_, failed)| *failed).count();
        if hard_failures == total {
            return Err(GenerationError::AllCandidatesFailedGeocoding.into());
        }

        Ok(results.into_iter().map(|(place, _)| place).collect())
    }

    /// Resolve one place in-place; a typed miss annotates instead of erroring
    async fn geocode_place(&self, place: &mut Place, locality: &str) -> Result<()> {
        let query = match &place.address {
            Some(address) => format!("{}, {}", place.name, address),
            None => place.name.clone(),
        };

        let outcome = with_retries(&self.retry, "geocoder", || {
            self.geocoder.geocode(&query, locality)
        })
        .await?;

        match outcome {
            Some(hit) => {
                place.coordinates = Some(hit.coordinates);
                if place.address.is_none() {
                    place.address = hit.canonical_address;
                }
            }
            None => {
                debug!(place = %place.name, "Geocode miss, keeping place unmapped");
                place.annotate(planner::UNMAPPED_NOTE);
            }
        }
        Ok(())
    }
}

/// Drop duplicate candidates by normalized name, keeping first-seen order
fn dedupe_candidates(candidates: Vec<Place>) -> Vec<Place> {
    let mut seen = Vec::new();
    let mut out = Vec::new();
    for place in candidates {
        let key = place.normalized_name();
        if !seen.contains(&key) {
            seen.push(key);
            out.push(place);
        }
    }
    out
}

#[derive(Debug, Deserialize)]
struct ItineraryDraft {
    #[serde(default)]
    places: Vec<PlaceDraft>,
}

#[derive(Debug, Deserialize)]
struct PlaceDraft {
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

impl PlaceDraft {
    /// Build a Place, dropping nameless drafts
    fn into_place(self) -> Option<Place> {
        let name = self.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())?;
        Some(Place {
            name,
            neighborhood: self.neighborhood.filter(|s| !s.trim().is_empty()),
            category: self
                .category
                .as_deref()
                .map(Category::from_tag)
                .unwrap_or_default(),
            address: self.address.filter(|s| !s.trim().is_empty()),
            coordinates: None,
            notes: self.notes.filter(|s| !s.trim().is_empty()),
        })
    }
}
