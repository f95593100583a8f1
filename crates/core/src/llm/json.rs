use crate::domain::contract::LlmRecommendationSet;
use crate::domain::recommendation::RecommendationSet;
use crate::llm::error::ParseError;
use chrono::{DateTime, Utc};

pub fn extract_json(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.starts_with("```") {
        // Remove Markdown fences (```json ... ``` or ``` ... ```).
        let mut inner = trimmed;
        if let Some(after_first) = inner.splitn(2, '\n').nth(1) {
            inner = after_first;
        }
        if let Some(end) = inner.rfind("```") {
            inner = &inner[..end];
        }
        return Some(inner.trim().to_string());
    }

    // Best-effort extraction: first '{' to last '}'.
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(trimmed[start..=end].trim().to_string())
}

/// Decode and validate model output. The whole set is accepted or rejected; `lastUpdate`
/// on every entry is stamped with `generated_at`.
pub fn parse_recommendations(
    text: &str,
    generated_at: DateTime<Utc>,
) -> Result<RecommendationSet, ParseError> {
    let reject = |reason: String| ParseError {
        reason,
        raw_output: text.to_string(),
    };

    let json_str = extract_json(text).unwrap_or_else(|| text.trim().to_string());
    let parsed = serde_json::from_str::<LlmRecommendationSet>(&json_str)
        .map_err(|e| reject(format!("not valid JSON for recommendation schema: {e}")))?;

    parsed
        .validate_and_into_set(generated_at)
        .map_err(|e| reject(format!("{e:#}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::recommendation::{Priority, WaveType};
    use chrono::TimeZone;
    use serde_json::{json, Value};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 10, 15, 0, 0).unwrap()
    }

    fn entry(symbol: &str) -> Value {
        json!({
            "symbol": symbol,
            "exchange": "NASDAQ",
            "waveType": "Wave3",
            "priority": "ALTA",
            "entryPrice": 412.3,
            "targetPrice": 455,
            "stopLoss": 398.0,
            "confidence": 82,
            "timeframe": "1h",
            "lastUpdate": "2020-01-01T00:00:00Z",
            "reasoning": "Wave 3 breakout above wave 1 high",
        })
    }

    fn set_of(entries: Vec<Value>) -> String {
        json!({ "recommendations": entries }).to_string()
    }

    #[test]
    fn extract_json_handles_fenced_blocks() {
        let body = "{\"a\":1}";
        let fenced = format!("```json\n{body}\n```\n");
        assert_eq!(extract_json(&fenced), Some(body.to_string()));
    }

    #[test]
    fn extract_json_falls_back_to_braces() {
        let s = "prefix {\"a\":1} suffix";
        assert_eq!(extract_json(s), Some("{\"a\":1}".to_string()));
        assert_eq!(extract_json("not json"), None);
    }

    #[test]
    fn accepts_well_formed_set_and_stamps_last_update() {
        let set = parse_recommendations(&set_of(vec![entry("MSFT")]), now()).unwrap();
        assert_eq!(set.recommendations.len(), 1);

        let rec = &set.recommendations[0];
        assert_eq!(rec.symbol, "MSFT");
        assert_eq!(rec.wave_type, WaveType::Wave3);
        assert_eq!(rec.priority, Priority::Alta);
        assert_eq!(rec.target_price, 455.0);
        assert_eq!(rec.confidence, 82.0);
        assert_eq!(rec.last_update, now());
    }

    #[test]
    fn echoes_provider_strings_verbatim() {
        let mut e = entry(" MSFT");
        e["exchange"] = json!("NASDAQ ");
        e["reasoning"] = json!("  Wave 3 breakout\n");
        let set = parse_recommendations(&set_of(vec![e]), now()).unwrap();

        let rec = &set.recommendations[0];
        assert_eq!(rec.symbol, " MSFT");
        assert_eq!(rec.exchange, "NASDAQ ");
        assert_eq!(rec.reasoning, "  Wave 3 breakout\n");
    }

    #[test]
    fn rejects_blank_symbol() {
        assert!(parse_recommendations(&set_of(vec![entry("   ")]), now()).is_err());
    }

    #[test]
    fn passes_provider_timeframe_through_unchanged() {
        let mut e = entry("NVDA");
        e["timeframe"] = json!("1d");
        let set = parse_recommendations(&set_of(vec![e]), now()).unwrap();
        assert_eq!(set.recommendations[0].timeframe, "1d");
    }

    #[test]
    fn accepts_fenced_output_and_empty_set() {
        let fenced = format!("```json\n{}\n```", set_of(vec![entry("AMD")]));
        assert_eq!(parse_recommendations(&fenced, now()).unwrap().recommendations.len(), 1);

        let empty = parse_recommendations(&set_of(vec![]), now()).unwrap();
        assert!(empty.recommendations.is_empty());
    }

    #[test]
    fn rejects_non_json_text() {
        let err = parse_recommendations("not json", now()).unwrap_err();
        assert_eq!(err.raw_output, "not json");
    }

    #[test]
    fn rejects_more_than_ten_entries() {
        let entries = (0..11).map(|i| entry(&format!("SYM{i}"))).collect();
        assert!(parse_recommendations(&set_of(entries), now()).is_err());

        let entries = (0..10).map(|i| entry(&format!("SYM{i}"))).collect();
        assert!(parse_recommendations(&set_of(entries), now()).is_ok());
    }

    #[test]
    fn rejects_out_of_domain_enumerations() {
        let mut e = entry("META");
        e["waveType"] = json!("Wave5");
        assert!(parse_recommendations(&set_of(vec![e]), now()).is_err());

        let mut e = entry("META");
        e["priority"] = json!("HIGH");
        assert!(parse_recommendations(&set_of(vec![e]), now()).is_err());
    }

    #[test]
    fn rejects_confidence_outside_range() {
        for bad in [69.9, 95.5, -1.0] {
            let mut e = entry("GOOGL");
            e["confidence"] = json!(bad);
            assert!(parse_recommendations(&set_of(vec![e]), now()).is_err());
        }
        for ok in [70, 95] {
            let mut e = entry("GOOGL");
            e["confidence"] = json!(ok);
            assert!(parse_recommendations(&set_of(vec![e]), now()).is_ok());
        }
    }

    #[test]
    fn rejects_whole_set_when_one_entry_is_malformed() {
        let mut bad = entry("AMZN");
        bad.as_object_mut().unwrap().remove("stopLoss");
        let err = parse_recommendations(&set_of(vec![entry("AAPL"), bad]), now()).unwrap_err();
        assert!(err.reason.contains("stopLoss"));

        let mut wrong_type = entry("AMZN");
        wrong_type["entryPrice"] = json!("180.5");
        assert!(parse_recommendations(&set_of(vec![entry("AAPL"), wrong_type]), now()).is_err());
    }

    #[test]
    fn rejects_missing_recommendations_key() {
        assert!(parse_recommendations("{\"items\": []}", now()).is_err());
    }
}
