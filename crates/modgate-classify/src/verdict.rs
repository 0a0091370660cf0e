//! Verdict parsing for raw model responses
//!
//! The upstream model replies with natural-language text that should, but
//! does not always, contain an embedded JSON object. Parsing is total: any
//! input string produces a well-formed [`Verdict`], degrading to a safe
//! low-confidence fallback rather than failing the submission.

use chrono::Utc;
use serde_json::Value;
use tracing::warn;

use modgate_core::{Classification, Verdict};

/// Confidence assigned when the model omits or mangles the score
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Reasoning placeholder when the model omits an explanation
const NO_REASONING: &str = "No reasoning provided";

/// Reasoning placeholder for the degraded path
const UNPARSEABLE: &str = "Failed to parse classification response";

/// Parse a raw model response into a verdict. Never fails.
///
/// The first `{` through the last `}` of the input is tried as JSON; on
/// any failure the result is a `safe` verdict with default confidence.
/// The full raw text is retained in every path. The `flagged` field is
/// taken as reported by the model and is informational only; the pipeline
/// recomputes it from the classification before acting on it.
pub fn parse_verdict(raw: &str) -> Verdict {
    match extract_object(raw) {
        Some(value) => verdict_from_value(&value, raw),
        None => {
            warn!(chars = raw.len(), "No parseable object in classification response");
            fallback_verdict(raw)
        }
    }
}

/// Locate and decode the outermost brace-delimited slice of the response.
fn extract_object(raw: &str) -> Option<Value> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }

    match serde_json::from_str::<Value>(&raw[start..=end]) {
        Ok(value @ Value::Object(_)) => Some(value),
        Ok(_) => None,
        Err(_) => None,
    }
}

fn verdict_from_value(value: &Value, raw: &str) -> Verdict {
    let classification = value
        .get("classification")
        .and_then(Value::as_str)
        .map(Classification::from_label)
        .unwrap_or(Classification::Safe);

    let confidence = clamp_confidence(coerce_confidence(value.get("confidence")));

    let reasoning = value
        .get("reasoning")
        .and_then(Value::as_str)
        .unwrap_or(NO_REASONING)
        .to_string();

    let flagged = value
        .get("flagged")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    Verdict {
        classification,
        confidence,
        reasoning,
        flagged,
        raw_response: raw.to_string(),
        created_at: Utc::now(),
    }
}

fn fallback_verdict(raw: &str) -> Verdict {
    Verdict {
        classification: Classification::Safe,
        confidence: DEFAULT_CONFIDENCE,
        reasoning: UNPARSEABLE.to_string(),
        flagged: false,
        raw_response: raw.to_string(),
        created_at: Utc::now(),
    }
}

/// Coerce a JSON confidence value to a number, accepting numeric strings.
fn coerce_confidence(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(DEFAULT_CONFIDENCE),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(DEFAULT_CONFIDENCE),
        _ => DEFAULT_CONFIDENCE,
    }
}

fn clamp_confidence(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        DEFAULT_CONFIDENCE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_well_formed_response() {
        let raw = r#"{"classification":"harassment","confidence":0.92,"reasoning":"targeted abuse","flagged":true}"#;
        let verdict = parse_verdict(raw);

        assert_eq!(verdict.classification, Classification::Harassment);
        assert_eq!(verdict.confidence, 0.92);
        assert_eq!(verdict.reasoning, "targeted abuse");
        assert!(verdict.flagged);
        assert_eq!(verdict.raw_response, raw);
    }

    #[test]
    fn test_parse_object_embedded_in_prose() {
        let raw = "Sure, here is my analysis:\n```json\n{\"classification\": \"spam\", \"confidence\": 0.7, \"reasoning\": \"promo\", \"flagged\": true}\n```\nLet me know if you need more.";
        let verdict = parse_verdict(raw);

        assert_eq!(verdict.classification, Classification::Spam);
        assert_eq!(verdict.confidence, 0.7);
        assert_eq!(verdict.raw_response, raw);
    }

    #[test]
    fn test_parse_prose_without_object_falls_back_safe() {
        let verdict = parse_verdict("The content looks fine to me.");

        assert_eq!(verdict.classification, Classification::Safe);
        assert_eq!(verdict.confidence, DEFAULT_CONFIDENCE);
        assert!(!verdict.flagged);
        assert_eq!(verdict.raw_response, "The content looks fine to me.");
    }

    #[test]
    fn test_parse_never_fails_on_hostile_input() {
        for raw in ["", "}{", "{", "}", "{{{", "\u{0}\u{1}garbage", "{not json}"] {
            let verdict = parse_verdict(raw);
            assert_eq!(verdict.classification, Classification::Safe);
            assert_eq!(verdict.confidence, DEFAULT_CONFIDENCE);
            assert_eq!(verdict.raw_response, raw);
        }
    }

    #[test]
    fn test_unknown_classification_defaults_safe() {
        let verdict = parse_verdict(r#"{"classification":"sarcasm","confidence":0.9}"#);
        assert_eq!(verdict.classification, Classification::Safe);
    }

    #[test]
    fn test_confidence_clamping() {
        let cases = [
            (r#"{"classification":"toxic","confidence":1.7}"#, 1.0),
            (r#"{"classification":"toxic","confidence":-0.3}"#, 0.0),
            (r#"{"classification":"toxic","confidence":"0.4"}"#, 0.4),
            (r#"{"classification":"toxic","confidence":"high"}"#, DEFAULT_CONFIDENCE),
            (r#"{"classification":"toxic"}"#, DEFAULT_CONFIDENCE),
            (r#"{"classification":"toxic","confidence":null}"#, DEFAULT_CONFIDENCE),
            (r#"{"classification":"toxic","confidence":[1]}"#, DEFAULT_CONFIDENCE),
        ];

        for (raw, expected) in cases {
            let verdict = parse_verdict(raw);
            assert_eq!(verdict.confidence, expected, "input: {raw}");
            assert!((0.0..=1.0).contains(&verdict.confidence));
        }
    }

    #[test]
    fn test_missing_reasoning_gets_placeholder() {
        let verdict = parse_verdict(r#"{"classification":"spam","confidence":0.8}"#);
        assert_eq!(verdict.reasoning, "No reasoning provided");
    }

    #[test]
    fn test_upstream_flag_is_reported_verbatim() {
        // The pipeline recomputes flagged from the classification; here we
        // only carry what the model said.
        let verdict =
            parse_verdict(r#"{"classification":"harassment","confidence":0.9,"flagged":false}"#);
        assert_eq!(verdict.classification, Classification::Harassment);
        assert!(!verdict.flagged);
    }

    #[test]
    fn test_non_object_json_falls_back() {
        let verdict = parse_verdict("[1, 2, 3]");
        assert_eq!(verdict.classification, Classification::Safe);
    }
}
