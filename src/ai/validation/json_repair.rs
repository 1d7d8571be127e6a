//! JSON Extraction and Repair
//!
//! The single boundary where untrusted completion text becomes a parsed
//! `serde_json::Value`. Handles the failure shapes models actually produce:
//!
//! - Markdown code fence wrapping (```json ... ```)
//! - Trailing commas before a closing brace/bracket
//! - JSON embedded in explanatory prose

use serde_json::Value;
use tracing::{debug, warn};

use crate::types::{ErrorCategory, LlmError, PlannerError, Result};

/// Extract and parse JSON from a completion response.
///
/// Primary entry point for turning raw model output into a Value. Fails with
/// a `ParseError`-categorized adapter error when nothing parseable remains.
pub fn extract_json_from_response(content: &str) -> Result<Value> {
    let cleaned = preprocess(content);

    if let Ok(value) = serde_json::from_str::<Value>(&cleaned) {
        return Ok(value);
    }

    debug!("Direct JSON parse failed, attempting repair");

    let without_commas = strip_trailing_commas(&cleaned);
    if let Ok(value) = serde_json::from_str::<Value>(&without_commas) {
        warn!("JSON repaired by removing trailing commas");
        return Ok(value);
    }

    if let Some(embedded) = extract_embedded_object(&cleaned) {
        let embedded = strip_trailing_commas(&embedded);
        if let Ok(value) = serde_json::from_str::<Value>(&embedded) {
            warn!("JSON extracted from surrounding prose");
            return Ok(value);
        }
    }

    Err(PlannerError::Llm(LlmError::with_service(
        ErrorCategory::ParseError,
        format!(
            "unparseable completion response. Preview: {}...",
            cleaned.chars().take(120).collect::<String>()
        ),
        "completion",
    )))
}

/// Trim, drop a BOM, and unwrap markdown code fences
fn preprocess(raw: &str) -> String {
    let mut s = raw.trim().trim_start_matches('\u{feff}');

    if s.starts_with("```") {
        // Drop the opening fence line (``` or ```json)
        if let Some(newline) = s.find('\n') {
            s = &s[newline + 1..];
        }
        if let Some(end) = s.rfind("```") {
            s = &s[..end];
        }
    }

    s.trim().to_string()
}

/// Remove commas directly preceding a closing brace or bracket.
/// String contents are respected.
fn strip_trailing_commas(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_string = false;
    let mut escaped = false;
    let chars: Vec<char> = s.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' => {
                let next_meaningful = chars[i + 1..].iter().find(|ch| !ch.is_whitespace());
                if matches!(next_meaningful, Some('}') | Some(']')) {
                    continue;
                }
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Pull out the first balanced top-level JSON object embedded in text
fn extract_embedded_object(s: &str) -> Option<String> {
    let start = s.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in s[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(s[start..start + offset + 1].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_json() {
        let value = extract_json_from_response(r#"{"destination": "Barcelona"}"#).unwrap();
        assert_eq!(value["destination"], "Barcelona");
    }

    #[test]
    fn test_fenced_json() {
        let raw = "```json\n{\"places\": []}\n```";
        let value = extract_json_from_response(raw).unwrap();
        assert!(value["places"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_fence_without_language_tag() {
        let raw = "```\n{\"day_count\": 2}\n```";
        let value = extract_json_from_response(raw).unwrap();
        assert_eq!(value["day_count"], 2);
    }

    #[test]
    fn test_trailing_comma() {
        let raw = r#"{"interests": ["art", "food",], "day_count": 2,}"#;
        let value = extract_json_from_response(raw).unwrap();
        assert_eq!(value["interests"][1], "food");
        assert_eq!(value["day_count"], 2);
    }

    #[test]
    fn test_comma_inside_string_is_kept() {
        let raw = r#"{"notes": "cash only, book ahead"}"#;
        let value = extract_json_from_response(raw).unwrap();
        assert_eq!(value["notes"], "cash only, book ahead");
    }

    #[test]
    fn test_embedded_in_prose() {
        let raw = r#"Sure! Here is your itinerary: {"places": [{"name": "Park Guell", "category": "sightseeing"}]} Enjoy!"#;
        let value = extract_json_from_response(raw).unwrap();
        assert_eq!(value["places"][0]["name"], "Park Guell");
    }

    #[test]
    fn test_nested_braces_in_prose() {
        let raw = r#"Result: {"outer": {"inner": 1}} trailing text"#;
        let value = extract_json_from_response(raw).unwrap();
        assert_eq!(value["outer"]["inner"], 1);
    }

    #[test]
    fn test_unparseable_is_parse_error() {
        let err = extract_json_from_response("I cannot help with that.").unwrap_err();
        match err {
            PlannerError::Llm(llm) => assert_eq!(llm.category, ErrorCategory::ParseError),
            other => panic!("expected adapter error, got {other:?}"),
        }
    }
}
