//! Prompt Builders and Schemas
//!
//! One builder + advisory JSON schema per completion call the pipeline makes.
//! Prompts enumerate exact output shapes; the adapter still validates what
//! comes back.

use serde_json::{Value, json};

use crate::types::{ConversationState, ExtractedParams};

// =============================================================================
// Extraction
// =============================================================================

pub fn extraction_prompt(raw_text: &str) -> String {
    format!(
        r#"Extract travel details from this trip request: "{raw_text}"

Return ONLY a JSON object with these exact keys:
{{
  "destination": "destination name, or null if the request names none",
  "destination_type": "city|region|country|landmark",
  "interests": ["interest", "tags"],
  "day_count": number of days, or null if not stated
}}

Rules:
- Do NOT invent a destination. If the request names no destination, set it to null.
- Interests are short lowercase tags in the order mentioned.
- day_count must be a positive integer when stated."#
    )
}

/// Appended when the first response could not be parsed
pub const STRICT_JSON_SUFFIX: &str =
    "\n\nIMPORTANT: Your previous response was not valid JSON. Return ONLY the raw JSON \
     object. No markdown, no code fences, no commentary.";

pub fn extraction_schema() -> Value {
    json!({
        "type": "object",
        "required": ["destination", "interests", "day_count"],
        "additionalProperties": false,
        "properties": {
            "destination": {"type": ["string", "null"], "description": "Destination name"},
            "destination_type": {
                "type": ["string", "null"],
                "enum": ["city", "region", "country", "landmark", null]
            },
            "interests": {
                "type": "array",
                "items": {"type": "string", "minLength": 1, "maxLength": 40},
                "maxItems": 10
            },
            "day_count": {"type": ["integer", "null"], "minimum": 1}
        }
    })
}

// =============================================================================
// Itinerary Generation
// =============================================================================

pub fn itinerary_prompt(params: &ExtractedParams, candidate_count: usize) -> String {
    let interests = if params.interests.is_empty() {
        "general sightseeing".to_string()
    } else {
        params.interests.join(", ")
    };

    format!(
        r#"Create a {days}-day travel itinerary for {destination} focusing on {interests}.

Return ONLY a valid JSON object with this structure:
{{"places":[{{"name":"Name","neighborhood":"Area","category":"food|art|sightseeing|other","address":"Address or null","notes":"Brief note"}}]}}

Requirements:
- Include {count} diverse places that match the interests
- Bias toward the stated interests, but well-known must-see sights are welcome
- Mix of popular attractions and local gems
- Include specific addresses where known
- Categorize each place as food, art, sightseeing, or other
- Real places only, no duplicates, no markdown formatting"#,
        days = params.day_count,
        destination = params.destination,
        interests = interests,
        count = candidate_count,
    )
}

pub fn itinerary_schema() -> Value {
    json!({
        "type": "object",
        "required": ["places"],
        "additionalProperties": false,
        "properties": {
            "places": {
                "type": "array",
                "minItems": 1,
                "maxItems": 40,
                "items": place_schema()
            }
        }
    })
}

/// Single-place path, reused by the Add intent
pub fn single_place_prompt(description: &str, params: &ExtractedParams) -> String {
    format!(
        r#"Suggest exactly one real place in {destination} matching this request: "{description}"

The place MUST be located in {destination}. Do not suggest places in other cities.

Return ONLY a JSON object:
{{"name":"Name","neighborhood":"Area","category":"food|art|sightseeing|other","address":"Address or null","notes":"Brief note"}}"#,
        destination = params.destination,
    )
}

pub fn single_place_schema() -> Value {
    place_schema()
}

fn place_schema() -> Value {
    json!({
        "type": "object",
        "required": ["name", "category"],
        "additionalProperties": false,
        "properties": {
            "name": {"type": "string", "minLength": 1, "maxLength": 120},
            "neighborhood": {"type": ["string", "null"], "maxLength": 120},
            "category": {"type": "string", "maxLength": 40},
            "address": {"type": ["string", "null"], "maxLength": 200},
            "notes": {"type": ["string", "null"], "maxLength": 300}
        }
    })
}

// =============================================================================
// Intent Classification
// =============================================================================

pub fn classification_prompt(instruction: &str, state: &ConversationState) -> String {
    let mut place_list = String::new();
    for (i, name) in state.place_names().iter().enumerate() {
        place_list.push_str(&format!("{}. {}\n", i + 1, name));
    }
    if place_list.is_empty() {
        place_list.push_str("(itinerary is empty)\n");
    }

    format!(
        r#"You are an intent classifier for a travel itinerary assistant.

Current itinerary for {destination}:
{place_list}
User instruction: "{instruction}"

Classify the instruction as exactly one intent:
- "add": append one new place ("add a tapas bar", "include a night market")
- "remove": delete an existing place ("remove the museum", "take out number 2")
- "modify": change fields of an existing place ("rename X", "add a note to the cafe")
- "reorder": re-sort the whole list ("group by category", "sort alphabetically")
- "question": asking for information or advice ("what's near the museum?", "can I rent a scooter?")
- "regenerate": start the itinerary over ("start over", "give me a fresh plan")

Questions about "can I", "where can I", "is there" are ALWAYS "question", not modifications.

Return ONLY a JSON object:
{{
  "intent": "add|remove|modify|reorder|question|regenerate",
  "target": "place name or 1-based number from the list above, for remove/modify; else null",
  "description": "what to add, for add; else null",
  "change": {{"name": null, "neighborhood": null, "category": null, "address": null, "notes": null}} or null,
  "criterion": "category|name, for reorder; else null",
  "question": "the question text, for question; else null"
}}"#,
        destination = state.extracted.destination,
    )
}

pub fn classification_schema() -> Value {
    json!({
        "type": "object",
        "required": ["intent"],
        "additionalProperties": false,
        "properties": {
            "intent": {
                "type": "string",
                "enum": ["add", "remove", "modify", "reorder", "question", "regenerate"]
            },
            "target": {"type": ["string", "null"]},
            "description": {"type": ["string", "null"]},
            "change": {
                "type": ["object", "null"],
                "additionalProperties": false,
                "properties": {
                    "name": {"type": ["string", "null"]},
                    "neighborhood": {"type": ["string", "null"]},
                    "category": {"type": ["string", "null"]},
                    "address": {"type": ["string", "null"]},
                    "notes": {"type": ["string", "null"]}
                }
            },
            "criterion": {"type": ["string", "null"], "enum": ["category", "name", null]},
            "question": {"type": ["string", "null"]}
        }
    })
}

// =============================================================================
// Question Answering
// =============================================================================

pub fn question_prompt(question: &str, state: &ConversationState) -> String {
    let mut itinerary_context = String::new();
    for place in state.itinerary.iter() {
        itinerary_context.push_str(&format!("- {} ({})\n", place.name, place.category));
    }
    if itinerary_context.is_empty() {
        itinerary_context.push_str("(no places yet)\n");
    }

    format!(
        r#"Trip: {destination}, interests: {interests}

Current itinerary:
{itinerary_context}
Question: "{question}"

Give a direct, helpful answer in one or two sentences.

Return ONLY a JSON object: {{"response": "your answer"}}"#,
        destination = state.extracted.destination,
        interests = state.extracted.interests.join(", "),
    )
}

pub fn question_schema() -> Value {
    json!({
        "type": "object",
        "required": ["response"],
        "additionalProperties": false,
        "properties": {
            "response": {"type": "string", "minLength": 1, "maxLength": 600}
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, DestinationType, Itinerary, Place};

    fn state() -> ConversationState {
        let s = ConversationState::new(ExtractedParams::new(
            "Barcelona",
            DestinationType::City,
            vec!["art".into(), "food".into()],
            2,
        ));
        s.with_itinerary(Itinerary::from_candidates(vec![
            Place::new("Museu Picasso", Category::Art),
            Place::new("El Xampanyet", Category::Food),
        ]))
    }

    #[test]
    fn test_extraction_prompt_embeds_request() {
        let prompt = extraction_prompt("Plan a 2-day art tour in Barcelona");
        assert!(prompt.contains("2-day art tour"));
        assert!(prompt.contains("null"));
    }

    #[test]
    fn test_itinerary_prompt_counts() {
        let params = ExtractedParams::new("Barcelona", DestinationType::City, vec![], 2);
        let prompt = itinerary_prompt(&params, 6);
        assert!(prompt.contains("Include 6 diverse places"));
        assert!(prompt.contains("general sightseeing"));
    }

    #[test]
    fn test_classification_prompt_numbers_places() {
        let prompt = classification_prompt("remove the restaurant", &state());
        assert!(prompt.contains("1. Museu Picasso"));
        assert!(prompt.contains("2. El Xampanyet"));
        assert!(prompt.contains("remove the restaurant"));
    }

    #[test]
    fn test_single_place_prompt_pins_destination() {
        let params = ExtractedParams::new("Hanoi", DestinationType::City, vec![], 1);
        let prompt = single_place_prompt("a scooter rental", &params);
        assert!(prompt.contains("MUST be located in Hanoi"));
    }

    #[test]
    fn test_question_prompt_lists_itinerary() {
        let prompt = question_prompt("what's near the museum?", &state());
        assert!(prompt.contains("- Museu Picasso (art)"));
    }

    #[test]
    fn test_schemas_are_objects() {
        for schema in [
            extraction_schema(),
            itinerary_schema(),
            single_place_schema(),
            classification_schema(),
            question_schema(),
        ] {
            assert_eq!(schema["type"], "object");
        }
    }
}
