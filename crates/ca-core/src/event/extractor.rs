//! Event extraction from assistant replies
//!
//! The assistant is asked to announce new events as
//! `Event scheduled:` followed by a flat JSON object. Models drift from that
//! grammar, so the scan tolerates code fences and narrative text around the
//! object. Nested objects and arrays inside the event JSON are not supported:
//! the object ends at the first `}` after the marker.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

use super::types::{Category, EventFields};

/// Literal marker that introduces an embedded event
pub const EVENT_MARKER: &str = "Event scheduled:";

const REQUIRED_FIELDS: [&str; 4] = ["title", "time", "duration", "category"];

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```(?:json)?").expect("code fence pattern is valid"));

/// Why a reply did not yield an event
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    /// No marker in the text. This is the plain-reply path, not a failure.
    #[error("no event marker in text")]
    NoMarker,

    #[error("malformed event JSON: {raw}")]
    MalformedJson { raw: String },

    #[error("event is missing fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("invalid event category: {0}")]
    InvalidCategory(String),
}

/// A successfully extracted event plus the narrative around it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedEvent {
    pub fields: EventFields,
    /// Text before the marker, trimmed
    pub lead_in: String,
    /// Text after the JSON object, trimmed
    pub trailing: String,
}

impl ExtractedEvent {
    /// Narrative text for display: lead-in and trailing text separated by a blank line
    pub fn narrative(&self) -> String {
        match (self.lead_in.is_empty(), self.trailing.is_empty()) {
            (false, false) => format!("{}\n\n{}", self.lead_in, self.trailing),
            (false, true) => self.lead_in.clone(),
            (true, false) => self.trailing.clone(),
            (true, true) => String::new(),
        }
    }

    /// Canonical `Event scheduled: {json}` form of the structured result
    pub fn to_marker_text(&self) -> String {
        let json = serde_json::json!({
            "title": self.fields.title(),
            "time": self.fields.time(),
            "duration": self.fields.duration(),
            "category": self.fields.category().as_str(),
        });
        format!("{} {}", EVENT_MARKER, json)
    }
}

/// Extract an event description from assistant text.
///
/// Pure function: never touches shared state.
pub fn extract(text: &str) -> Result<ExtractedEvent, ExtractionError> {
    let marker_at = text.find(EVENT_MARKER).ok_or(ExtractionError::NoMarker)?;

    let lead_in = text[..marker_at].trim().to_string();
    let candidate = text[marker_at + EVENT_MARKER.len()..].trim();

    let (json_part, trailing) = match candidate.find('}') {
        Some(end) => (&candidate[..=end], &candidate[end + 1..]),
        None => (candidate, ""),
    };

    let cleaned = CODE_FENCE.replace_all(json_part, "");
    let cleaned = cleaned.trim();

    let object = parse_object(cleaned)?;
    let fields = validate(&object)?;

    Ok(ExtractedEvent {
        fields,
        lead_in,
        trailing: strip_leading_fence(trailing).to_string(),
    })
}

fn parse_object(raw: &str) -> Result<Map<String, Value>, ExtractionError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(object)) => Ok(object),
        _ => Err(ExtractionError::MalformedJson {
            raw: raw.to_string(),
        }),
    }
}

/// String value of a field, kept as written. Blank or non-string values count as missing.
fn text_field<'a>(object: &'a Map<String, Value>, name: &str) -> Option<&'a str> {
    object
        .get(name)
        .and_then(Value::as_str)
        .filter(|value| !value.trim().is_empty())
}

fn validate(object: &Map<String, Value>) -> Result<EventFields, ExtractionError> {
    let missing: Vec<&'static str> = REQUIRED_FIELDS
        .into_iter()
        .filter(|name| text_field(object, name).is_none())
        .collect();

    let (Some(title), Some(time), Some(duration), Some(category)) = (
        text_field(object, "title"),
        text_field(object, "time"),
        text_field(object, "duration"),
        text_field(object, "category"),
    ) else {
        return Err(ExtractionError::MissingFields(missing));
    };

    let category: Category = category
        .parse()
        .map_err(|_| ExtractionError::InvalidCategory(category.to_string()))?;

    EventFields::new(title, time, duration, category)
        .map_err(|invalid| ExtractionError::MissingFields(invalid.missing))
}

/// Drop a fence marker that ends up at the start of the trailing text
fn strip_leading_fence(trailing: &str) -> &str {
    let trailing = trailing.trim();
    match CODE_FENCE.find(trailing) {
        Some(fence) if fence.start() == 0 => trailing[fence.end()..].trim(),
        _ => trailing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo() -> EventFields {
        EventFields::new("Demo", "10:00 AM", "1h", Category::Work).unwrap()
    }

    #[test]
    fn test_extract_scenario_with_narrative() {
        let text = "I've set that up.\nEvent scheduled:\n{\"title\":\"Demo\",\"time\":\"10:00 AM\",\"duration\":\"1h\",\"category\":\"work\"}\nLet me know if anything changes.";
        let extracted = extract(text).unwrap();

        assert_eq!(extracted.fields, demo());
        assert_eq!(extracted.lead_in, "I've set that up.");
        assert_eq!(extracted.trailing, "Let me know if anything changes.");
        assert_eq!(
            extracted.narrative(),
            "I've set that up.\n\nLet me know if anything changes."
        );
    }

    #[test]
    fn test_extract_no_marker() {
        assert_eq!(
            extract("Here are your free slots today."),
            Err(ExtractionError::NoMarker)
        );
        assert_eq!(extract(""), Err(ExtractionError::NoMarker));
        // Braces and JSON alone do not count
        assert_eq!(
            extract(r#"{"title":"Demo","time":"10:00 AM","duration":"1h","category":"work"}"#),
            Err(ExtractionError::NoMarker)
        );
        // Marker matching is case-sensitive
        assert_eq!(
            extract("event scheduled: {}"),
            Err(ExtractionError::NoMarker)
        );
    }

    #[test]
    fn test_extract_code_fence_matches_unfenced() {
        let json = r#"{"title":"Demo","time":"10:00 AM","duration":"1h","category":"work"}"#;
        let plain = extract(&format!("Event scheduled: {}", json)).unwrap();
        let fenced = extract(&format!("Event scheduled:\n```json\n{}\n```", json)).unwrap();
        let bare_fence = extract(&format!("Event scheduled:\n```\n{}\n```", json)).unwrap();

        assert_eq!(plain.fields, fenced.fields);
        assert_eq!(plain.fields, bare_fence.fields);
        assert_eq!(fenced.trailing, "");
    }

    #[test]
    fn test_extract_fence_then_commentary() {
        let text = "Done!\nEvent scheduled:\n```json\n{\"title\":\"Gym\",\"time\":\"06:00 PM\",\"duration\":\"1h\",\"category\":\"personal\"}\n```\nEnjoy your workout.";
        let extracted = extract(text).unwrap();
        assert_eq!(extracted.fields.title(), "Gym");
        assert_eq!(extracted.fields.category(), Category::Personal);
        assert_eq!(extracted.lead_in, "Done!");
        assert_eq!(extracted.trailing, "Enjoy your workout.");
    }

    #[test]
    fn test_extract_is_idempotent_on_own_output() {
        let text = "Sure.\nEvent scheduled: {\"title\":\"Deep work\",\"time\":\"02:00 PM\",\"duration\":\"2h\",\"category\":\"focus\",\"note\":\"ignored\"}";
        let first = extract(text).unwrap();
        let second = extract(&first.to_marker_text()).unwrap();

        assert_eq!(first.fields, second.fields);
        assert_eq!(second.lead_in, "");
        assert_eq!(second.trailing, "");
    }

    #[test]
    fn test_extract_only_first_marker_counts() {
        let text = "Event scheduled: {\"title\":\"A\",\"time\":\"09:00 AM\",\"duration\":\"1h\",\"category\":\"work\"} and Event scheduled: {\"title\":\"B\",\"time\":\"10:00 AM\",\"duration\":\"1h\",\"category\":\"work\"}";
        let extracted = extract(text).unwrap();
        assert_eq!(extracted.fields.title(), "A");
        assert!(extracted.trailing.starts_with("and Event scheduled:"));
    }

    #[test]
    fn test_extract_malformed_json() {
        let err = extract("Event scheduled: {\"title\": \"Demo\", oops}").unwrap_err();
        assert_eq!(
            err,
            ExtractionError::MalformedJson {
                raw: "{\"title\": \"Demo\", oops}".to_string()
            }
        );

        // No closing brace at all
        assert!(matches!(
            extract("Event scheduled: {\"title\": \"Demo\""),
            Err(ExtractionError::MalformedJson { .. })
        ));

        // Valid JSON, but not an object
        assert!(matches!(
            extract("Event scheduled: \"just a string\""),
            Err(ExtractionError::MalformedJson { .. })
        ));
    }

    #[test]
    fn test_extract_nested_object_is_not_supported() {
        let text = "Event scheduled: {\"title\":\"Demo\",\"meta\":{\"a\":1},\"time\":\"10:00 AM\",\"duration\":\"1h\",\"category\":\"work\"}";
        assert!(matches!(
            extract(text),
            Err(ExtractionError::MalformedJson { .. })
        ));
    }

    #[test]
    fn test_extract_missing_and_empty_fields() {
        let err =
            extract(r#"Event scheduled: {"title":"Demo","time":"","category":"work"}"#).unwrap_err();
        assert_eq!(err, ExtractionError::MissingFields(vec!["time", "duration"]));

        let err = extract(
            r#"Event scheduled: {"title":"   ","time":"10:00 AM","duration":1,"category":"work"}"#,
        )
        .unwrap_err();
        assert_eq!(err, ExtractionError::MissingFields(vec!["title", "duration"]));

        let err = extract(r#"Event scheduled: {}"#).unwrap_err();
        assert_eq!(
            err,
            ExtractionError::MissingFields(vec!["title", "time", "duration", "category"])
        );
    }

    #[test]
    fn test_extract_invalid_category() {
        let err = extract(
            r#"Event scheduled: {"title":"Demo","time":"10:00 AM","duration":"1h","category":"holiday"}"#,
        )
        .unwrap_err();
        assert_eq!(err, ExtractionError::InvalidCategory("holiday".to_string()));
    }

    #[test]
    fn test_extract_category_is_exact() {
        for category in ["Meeting", "WORK", " focus "] {
            let text = format!(
                r#"Event scheduled: {{"title":"Standup","time":"09:30 AM","duration":"15m","category":"{}"}}"#,
                category
            );
            assert_eq!(
                extract(&text),
                Err(ExtractionError::InvalidCategory(category.to_string()))
            );
        }
    }

    #[test]
    fn test_extract_keeps_field_values_as_written() {
        let extracted = extract(
            r#"Event scheduled: {"title":"  Demo ","time":"10:00 AM ","duration":"1h","category":"work"}"#,
        )
        .unwrap();
        assert_eq!(extracted.fields.title(), "  Demo ");
        assert_eq!(extracted.fields.time(), "10:00 AM ");
        assert_eq!(
            extracted.fields,
            EventFields::new("  Demo ", "10:00 AM ", "1h", Category::Work).unwrap()
        );
    }

    #[test]
    fn test_extract_strips_tagged_fence_from_trailing() {
        let text = "Event scheduled: {\"title\":\"Demo\",\"time\":\"10:00 AM\",\"duration\":\"1h\",\"category\":\"work\"}```json\nSee you there.";
        let extracted = extract(text).unwrap();
        assert_eq!(extracted.trailing, "See you there.");

        let text = "Event scheduled: {\"title\":\"Demo\",\"time\":\"10:00 AM\",\"duration\":\"1h\",\"category\":\"work\"}\n```\nSee you there.";
        assert_eq!(extract(text).unwrap().trailing, "See you there.");
    }

    #[test]
    fn test_narrative_variants() {
        let mut extracted = ExtractedEvent {
            fields: demo(),
            lead_in: String::new(),
            trailing: String::new(),
        };
        assert_eq!(extracted.narrative(), "");

        extracted.trailing = "after".to_string();
        assert_eq!(extracted.narrative(), "after");

        extracted.lead_in = "before".to_string();
        extracted.trailing.clear();
        assert_eq!(extracted.narrative(), "before");
    }
}
