//! Tolerant parsing of model output.
//!
//! Models under a JSON-only directive still wrap their payload in
//! pleasantries ("Sure! {...} hope that helps"). The repair strategy is
//! strict parse, then brace-salvage (first `{` to last `}`), then a
//! contract error. Nothing beyond that is guessed.

use crate::error::LlmError;
use serde::Deserialize;
use serde_json::Value;
use visage_types::MAX_BEATS;

/// A beat as the model returns it, before enrichment.
///
/// Expression and animation stay raw strings here: models omit them, send
/// empty strings, or invent labels, and none of that may reject the beat.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawBeat {
    pub text: String,
    pub facial_expression: Option<String>,
    pub animation: Option<String>,
}

/// Extracts a beat list from raw model output.
///
/// Accepts either `{"messages": [...]}` or a bare top-level array. A
/// `messages` field that is not an array normalizes to an empty list. The
/// result is clamped to [`MAX_BEATS`] entries.
///
/// # Errors
///
/// `LlmError::Contract` when no JSON document can be recovered at all.
pub fn extract_beats(raw: &str) -> Result<Vec<RawBeat>, LlmError> {
    let value = salvage_json(raw)?;

    let entries = match value {
        Value::Array(entries) => entries,
        Value::Object(mut map) => match map.remove("messages") {
            Some(Value::Array(entries)) => entries,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    let mut beats: Vec<RawBeat> = entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value(entry).ok())
        .collect();
    beats.truncate(MAX_BEATS);
    Ok(beats)
}

/// Strict parse first; on failure, retry on the first-`{`-to-last-`}`
/// substring.
fn salvage_json(raw: &str) -> Result<Value, LlmError> {
    let trimmed = raw.trim();
    let candidate = if trimmed.is_empty() { "{}" } else { trimmed };

    if let Ok(value) = serde_json::from_str(candidate) {
        return Ok(value);
    }

    let start = candidate.find('{');
    let end = candidate.rfind('}');
    if let (Some(start), Some(end)) = (start, end) {
        if end > start {
            if let Ok(value) = serde_json::from_str(&candidate[start..=end]) {
                return Ok(value);
            }
        }
    }

    Err(LlmError::Contract(format!(
        "unparseable model output: {:.120}",
        candidate
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_json_parses_directly() {
        let beats =
            extract_beats(r#"{"messages":[{"text":"hey","facialExpression":"smile"}]}"#).unwrap();
        assert_eq!(beats.len(), 1);
        assert_eq!(beats[0].text, "hey");
        assert_eq!(beats[0].facial_expression.as_deref(), Some("smile"));
        assert_eq!(beats[0].animation, None);
    }

    #[test]
    fn preamble_and_trailer_are_salvaged() {
        let beats = extract_beats("Sure! {\"messages\":[{\"text\":\"hi\"}]} thanks").unwrap();
        assert_eq!(beats.len(), 1);
        assert_eq!(beats[0].text, "hi");
    }

    #[test]
    fn garbage_raises_contract_error() {
        let err = extract_beats("no json here at all").unwrap_err();
        assert!(matches!(err, LlmError::Contract(_)));
    }

    #[test]
    fn non_array_messages_normalizes_to_empty() {
        let beats = extract_beats(r#"{"messages":"sorry, I can't"}"#).unwrap();
        assert!(beats.is_empty());
        let beats = extract_beats(r#"{"mood":"confused"}"#).unwrap();
        assert!(beats.is_empty());
    }

    #[test]
    fn bare_array_is_accepted() {
        let beats = extract_beats(r#"[{"text":"one"},{"text":"two"}]"#).unwrap();
        assert_eq!(beats.len(), 2);
    }

    #[test]
    fn result_is_clamped_to_three() {
        let raw = r#"{"messages":[{"text":"1"},{"text":"2"},{"text":"3"},{"text":"4"},{"text":"5"}]}"#;
        let beats = extract_beats(raw).unwrap();
        assert_eq!(beats.len(), MAX_BEATS);
        assert_eq!(beats[2].text, "3");
    }

    #[test]
    fn empty_output_means_zero_beats() {
        assert!(extract_beats("").unwrap().is_empty());
        assert!(extract_beats("   ").unwrap().is_empty());
    }
}
