//! Modification Resolver
//!
//! Applies a modification intent to the current itinerary and produces a
//! new itinerary plus a confirmation sentence. The input state is never
//! mutated: a failed resolution returns a typed error and the orchestrator
//! keeps the prior snapshot.

use tracing::{debug, instrument};

use crate::pipeline::generator::ItineraryGenerator;
use crate::types::{
    Category, ConversationState, Intent, Itinerary, Place, PlaceChange, ReorderBy,
    ResolutionError, Result, Selector,
};

/// Outcome of a successful modification: the next itinerary and the
/// confirmation text surfaced to the user.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub itinerary: Itinerary,
    pub confirmation: String,
}

/// Applies modification intents against a conversation snapshot
pub struct ModificationResolver {
    generator: ItineraryGenerator,
}

impl ModificationResolver {
    pub fn new(generator: ItineraryGenerator) -> Self {
        Self { generator }
    }

    /// Resolve a modification intent into a new itinerary.
    ///
    /// Non-modification intents are a caller error and fail as invalid.
    #[instrument(skip(self, intent, state), fields(intent = intent.label()))]
    pub async fn resolve(
        &self,
        intent: &Intent,
        state: &ConversationState,
    ) -> Result<Resolution> {
        match intent {
            Intent::Add(description) => self.add(description, state).await,
            Intent::Remove(selector) => remove(selector, state),
            Intent::Modify(selector, change) => modify(selector, change, state),
            Intent::Reorder(criterion) => Ok(reorder(*criterion, state)),
            Intent::Regenerate => self.regenerate(state).await,
            Intent::Question(_) | Intent::Unknown => Err(ResolutionError::InvalidChange(
                format!("'{}' is not a modification", intent.label()),
            )
            .into()),
        }
    }

    async fn add(&self, description: &str, state: &ConversationState) -> Result<Resolution> {
        let place = self
            .generator
            .generate_one(description, &state.extracted)
            .await?;

        let mut itinerary = state.itinerary.clone();
        if !itinerary.push_unique(place.clone()) {
            // Duplicate suggestion keeps the list as-is
            debug!(place = %place.name, "Suggested place already present");
            return Ok(Resolution {
                itinerary,
                confirmation: format!("{} is already on your itinerary.", place.name),
            });
        }

        Ok(Resolution {
            confirmation: format!("Added {} to your itinerary.", place.name),
            itinerary,
        })
    }

    async fn regenerate(&self, state: &ConversationState) -> Result<Resolution> {
        let itinerary = self.generator.generate(&state.extracted).await?;
        Ok(Resolution {
            itinerary,
            confirmation: format!(
                "Here's a fresh itinerary for {}.",
                state.extracted.destination
            ),
        })
    }
}

fn remove(selector: &Selector, state: &ConversationState) -> Result<Resolution> {
    let index = selector
        .resolve(&state.itinerary)
        .ok_or_else(|| ResolutionError::NotFound(selector.describe()))?;

    let mut itinerary = state.itinerary.clone();
    // Index came from resolve, so removal cannot miss
    let removed = itinerary
        .remove_at(index)
        .ok_or_else(|| ResolutionError::NotFound(selector.describe()))?;

    Ok(Resolution {
        itinerary,
        confirmation: format!("Removed {} from your itinerary.", removed.name),
    })
}

fn modify(
    selector: &Selector,
    change: &PlaceChange,
    state: &ConversationState,
) -> Result<Resolution> {
    if change.is_empty() {
        return Err(ResolutionError::InvalidChange("no fields to change".into()).into());
    }

    let index = selector
        .resolve(&state.itinerary)
        .ok_or_else(|| ResolutionError::NotFound(selector.describe()))?;

    let mut itinerary = state.itinerary.clone();
    let current = itinerary.get(index).cloned().ok_or_else(|| {
        ResolutionError::NotFound(selector.describe())
    })?;
    let updated = apply_change(current, change);
    let name = updated.name.clone();

    if !itinerary.replace_at(index, updated) {
        return Err(ResolutionError::InvalidChange(format!(
            "a place named '{name}' is already on the itinerary"
        ))
        .into());
    }

    Ok(Resolution {
        itinerary,
        confirmation: format!("Updated {name}."),
    })
}

/// Field-wise overwrite; a renamed place keeps its coordinates
fn apply_change(mut place: Place, change: &PlaceChange) -> Place {
    if let Some(name) = &change.name {
        place.name = name.clone();
    }
    if let Some(neighborhood) = &change.neighborhood {
        place.neighborhood = Some(neighborhood.clone());
    }
    if let Some(category) = change.category {
        place.category = category;
    }
    if let Some(address) = &change.address {
        place.address = Some(address.clone());
    }
    if let Some(notes) = &change.notes {
        place.notes = Some(notes.clone());
    }
    place
}

fn reorder(criterion: ReorderBy, state: &ConversationState) -> Resolution {
    let mut itinerary = state.itinerary.clone();
    if itinerary.is_empty() {
        return Resolution {
            itinerary,
            confirmation: "Your itinerary is empty, nothing to reorder.".to_string(),
        };
    }

    match criterion {
        // Stable sort: relative order within a category is preserved
        ReorderBy::Category => itinerary.reorder_by(|p| category_rank(p.category)),
        ReorderBy::Name => itinerary.reorder_by(|p| p.normalized_name()),
    }

    let label = match criterion {
        ReorderBy::Category => "category",
        ReorderBy::Name => "name",
    };
    Resolution {
        itinerary,
        confirmation: format!("Reordered your itinerary by {label}."),
    }
}

/// Display order for category grouping
fn category_rank(category: Category) -> u8 {
    match category {
        Category::Sightseeing => 0,
        Category::Art => 1,
        Category::Food => 2,
        Category::Other => 3,
    }
}
