//! Tolerant Decoder: best-effort JSON extraction from model output.
//!
//! Models usually wrap the payload in prose plus a fenced block, so the
//! attempts run in order of trust:
//!
//! 1. a fence tagged ```` ```json ````
//! 2. any fence
//! 3. the whole text
//!
//! When all three fail the decoder still returns a value:
//! `{ "rawOutput": <text>, "parseError": true, "errorMessage": <detail> }`.

use regex::Regex;
use serde_json::Value;

const JSON_FENCE: &str = r"```json\s*([\s\S]*?)\s*```";
const ANY_FENCE: &str = r"```\s*([\s\S]*?)\s*```";

/// Decode `raw` into a JSON value. Never fails.
pub fn decode(raw: &str) -> Value {
    let mut last_error = String::from("no JSON found");

    for (label, pattern) in [("json code block", JSON_FENCE), ("generic code block", ANY_FENCE)] {
        let Some(block) = fenced_block(pattern, raw) else {
            continue;
        };
        match serde_json::from_str::<Value>(block) {
            Ok(value) => return value,
            Err(e) => {
                tracing::debug!("[Decoder] Failed to parse JSON from {}: {}", label, e);
                last_error = e.to_string();
            }
        }
    }

    match serde_json::from_str::<Value>(raw.trim()) {
        Ok(value) => value,
        Err(e) => {
            last_error = e.to_string();
            tracing::warn!("[Decoder] Could not parse JSON from response, keeping raw text");
            fallback(raw, &last_error)
        }
    }
}

/// Whether `value` is the sentinel produced when decoding failed.
pub fn is_parse_failure(value: &Value) -> bool {
    value.get("parseError").and_then(Value::as_bool) == Some(true)
}

fn fenced_block<'a>(pattern: &str, text: &'a str) -> Option<&'a str> {
    let re = Regex::new(pattern).ok()?;
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn fallback(raw: &str, detail: &str) -> Value {
    serde_json::json!({
        "rawOutput": raw,
        "parseError": true,
        "errorMessage": format!("Failed to extract JSON: {}", detail),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_text_falls_back_to_sentinel() {
        let value = decode("hello world");
        assert_eq!(value["rawOutput"], "hello world");
        assert_eq!(value["parseError"], true);
        assert!(!value["errorMessage"].as_str().unwrap().is_empty());
        assert!(is_parse_failure(&value));
    }

    #[test]
    fn test_json_fence_inside_prose() {
        let raw = "Here is the research summary you asked for.\n\n\
                   ```json\n{\"topics\": [\"schedule\", \"streams\"]}\n```\n\n\
                   Let me know if you need more.";
        assert_eq!(decode(raw), json!({ "topics": ["schedule", "streams"] }));
    }

    #[test]
    fn test_json_fence_preferred_over_untagged_fence() {
        let raw =
            "```\n{\"source\": \"untagged\"}\n```\nand\n```json\n{\"source\": \"tagged\"}\n```";
        assert_eq!(decode(raw), json!({ "source": "tagged" }));
    }

    #[test]
    fn test_untagged_fence() {
        let raw = "Output:\n```\n[1, 2, 3]\n```";
        assert_eq!(decode(raw), json!([1, 2, 3]));
    }

    #[test]
    fn test_broken_tagged_fence_falls_through_to_whole_text() {
        // Both fences hold invalid JSON; the whole text is not JSON either.
        let raw = "```json\n{ not json }\n```";
        let value = decode(raw);
        assert!(is_parse_failure(&value));
        assert_eq!(value["rawOutput"], raw);
    }

    #[test]
    fn test_whole_text_json() {
        assert_eq!(decode("  {\"ok\": true}\n"), json!({ "ok": true }));
    }

    #[test]
    fn test_serialized_values_decode_to_themselves() {
        let samples = vec![
            json!({ "ok": true }),
            json!({
                "nested": { "list": [1, 2.5, "three", null] },
                "metadata": { "status": "completed" }
            }),
            json!([{ "a": 1 }, { "b": [] }]),
            json!("just a string"),
            json!(42),
            json!(null),
        ];
        for value in samples {
            let compact = serde_json::to_string(&value).unwrap();
            assert_eq!(decode(&compact), value, "compact: {}", compact);

            let fenced = format!("```json\n{}\n```", serde_json::to_string_pretty(&value).unwrap());
            assert_eq!(decode(&fenced), value, "fenced: {}", fenced);
        }
    }
}
