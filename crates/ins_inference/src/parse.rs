use ins_core::{AnalysisResult, Category, Error, Result};
use serde_json::{Map, Value};
use tracing::warn;

const RELEVANT: &[&str] = &["relevant", "relevante"];
const REASON: &[&str] = &["reason", "motivo"];
const CATEGORY: &[&str] = &["category", "categoria"];
const SUGGESTED_ACTION: &[&str] = &["suggested_action", "suggestedAction", "acaoSugerida"];
const CONFIDENCE: &[&str] = &["confidence", "scoreConfianca"];
const SUMMARY: &[&str] = &["summary", "resumoExecutivo"];
const KEYWORDS: &[&str] = &["keywords", "palavrasChave"];

/// Parse a model reply, degrading to an error result when it holds no JSON object.
pub fn parse_reply(text: &str) -> AnalysisResult {
    match parse_analysis(text) {
        Ok(result) => result,
        Err(e) => {
            warn!("Could not parse model reply: {}", e);
            AnalysisResult::error(&e.to_string())
        }
    }
}

/// Text between the first `{` and the last `}`, inclusive.
pub fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

pub fn parse_analysis(text: &str) -> Result<AnalysisResult> {
    if text.trim().is_empty() {
        return Err(Error::Inference("Empty reply from model".to_string()));
    }
    let json = extract_json(text)
        .ok_or_else(|| Error::Inference("No JSON object in model reply".to_string()))?;
    let value: Value = serde_json::from_str(json)?;
    let Value::Object(fields) = value else {
        return Err(Error::Inference("Model reply is not a JSON object".to_string()));
    };

    Ok(AnalysisResult {
        relevant: field(&fields, RELEVANT).and_then(as_bool),
        reason: field(&fields, REASON).and_then(as_text),
        category: field(&fields, CATEGORY).and_then(as_text).and_then(|raw| {
            raw.parse::<Category>()
                .map_err(|_| warn!("Model returned an unknown category: {}", raw))
                .ok()
        }),
        suggested_action: field(&fields, SUGGESTED_ACTION).and_then(as_text),
        confidence: field(&fields, CONFIDENCE).and_then(as_confidence),
        summary: field(&fields, SUMMARY).and_then(as_text),
        keywords: field(&fields, KEYWORDS).and_then(as_text),
    })
}

fn field<'a>(fields: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|name| fields.get(*name))
        .find(|value| !value.is_null())
}

fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "sim" => Some(true),
            "false" | "no" | "nao" | "não" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_f64().map(|n| n != 0.0),
        _ => None,
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(as_text)
                .collect::<Vec<_>>()
                .join(", "),
        ),
        Value::Null | Value::Object(_) => None,
    }
}

fn as_confidence(value: &Value) -> Option<f64> {
    let score = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|score| score.is_finite())?;

    if !(0.0..=1.0).contains(&score) {
        warn!("Confidence {} out of range, clamping", score);
    }
    Some(score.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_fenced_english_reply() {
        let reply = r#"Sure! ```json
{"relevant": true, "reason": "new camera", "category": "product",
 "suggested_action": "contact vendor", "confidence": 0.91,
 "summary": "A launch", "keywords": ["vision", "retail"]}
```"#;
        let result = parse_reply(reply);
        assert_eq!(result.relevant, Some(true));
        assert_eq!(result.category, Some(Category::Product));
        assert_eq!(result.confidence, Some(0.91));
        assert_eq!(result.keywords.as_deref(), Some("vision, retail"));
        assert!(result.is_successful());
    }

    #[test]
    fn test_parses_portuguese_keys() {
        let reply = r#"{"relevante":true,"motivo":"parceria","categoria":"PARCERIA",
            "acaoSugerida":"agendar reunião","scoreConfianca":"0.7",
            "resumoExecutivo":"Resumo","palavrasChave":"ia, visão"}"#;
        let result = parse_reply(reply);
        assert_eq!(result.category, Some(Category::Partnership));
        assert_eq!(result.confidence, Some(0.7));
        assert_eq!(result.suggested_action.as_deref(), Some("agendar reunião"));
        assert_eq!(result.summary.as_deref(), Some("Resumo"));
    }

    #[test]
    fn test_missing_fields_are_none() {
        let result = parse_reply(r#"{"relevant": "false"}"#);
        assert_eq!(result.relevant, Some(false));
        assert!(result.category.is_none());
        assert!(result.confidence.is_none());
        assert!(!result.is_successful());
    }

    #[test]
    fn test_unknown_category_is_dropped() {
        let result = parse_reply(r#"{"relevant": true, "category": "GOSSIP"}"#);
        assert_eq!(result.relevant, Some(true));
        assert!(result.category.is_none());
        assert!(!result.is_successful());
    }

    #[test]
    fn test_confidence_is_clamped() {
        assert_eq!(parse_reply(r#"{"confidence": 1.7}"#).confidence, Some(1.0));
        assert_eq!(parse_reply(r#"{"confidence": -2}"#).confidence, Some(0.0));
        assert_eq!(parse_reply(r#"{"confidence": "high"}"#).confidence, None);
    }

    #[test]
    fn test_malformed_reply_becomes_error_result() {
        for reply in ["", "no braces at all", "} backwards {", "{not json}"] {
            let result = parse_reply(reply);
            assert_eq!(result.relevant, Some(false));
            assert_eq!(result.confidence, Some(0.0));
            assert_eq!(
                result.suggested_action.as_deref(),
                Some(AnalysisResult::ERROR_ACTION)
            );
            assert!(!result.is_successful());
        }
    }
}
