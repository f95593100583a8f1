use crate::domain::recommendation::{
    Priority, Recommendation, RecommendationSet, WaveType, MAX_CONFIDENCE, MAX_RECOMMENDATIONS,
    MIN_CONFIDENCE,
};
use anyhow::{ensure, Context};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Shape the model is asked to emit. Enumerations stay as raw strings here so that
/// validation can report exactly which value was out of domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRecommendationSet {
    pub recommendations: Vec<LlmRecommendation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmRecommendation {
    pub symbol: String,
    pub exchange: String,
    pub wave_type: String,
    pub priority: String,
    pub entry_price: f64,
    pub target_price: f64,
    pub stop_loss: f64,
    pub confidence: f64,
    pub timeframe: String,
    pub reasoning: String,

    // Overwritten with the response instant; accepted in any form.
    #[serde(default)]
    pub last_update: Option<serde_json::Value>,
}

impl LlmRecommendationSet {
    pub fn validate_and_into_set(
        self,
        generated_at: DateTime<Utc>,
    ) -> anyhow::Result<RecommendationSet> {
        ensure!(
            self.recommendations.len() <= MAX_RECOMMENDATIONS,
            "LLM output must contain at most {MAX_RECOMMENDATIONS} recommendations (got {})",
            self.recommendations.len()
        );

        let mut recommendations = Vec::with_capacity(self.recommendations.len());
        for (idx, item) in self.recommendations.into_iter().enumerate() {
            let rec = item
                .validate_and_into_recommendation(generated_at)
                .with_context(|| format!("recommendation #{idx} rejected"))?;
            recommendations.push(rec);
        }

        Ok(RecommendationSet { recommendations })
    }
}

impl LlmRecommendation {
    fn validate_and_into_recommendation(
        self,
        generated_at: DateTime<Utc>,
    ) -> anyhow::Result<Recommendation> {
        // Checked trimmed, emitted as sent.
        ensure!(!self.symbol.trim().is_empty(), "symbol must be non-empty");
        ensure!(!self.exchange.trim().is_empty(), "exchange must be non-empty");

        let wave_type = WaveType::parse(self.wave_type.trim())
            .with_context(|| format!("waveType out of domain: {:?}", self.wave_type))?;
        let priority = Priority::parse(self.priority.trim())
            .with_context(|| format!("priority out of domain: {:?}", self.priority))?;

        for (field, value) in [
            ("entryPrice", self.entry_price),
            ("targetPrice", self.target_price),
            ("stopLoss", self.stop_loss),
        ] {
            ensure!(
                value.is_finite() && value > 0.0,
                "{field} must be a positive number (got {value})"
            );
        }

        ensure!(
            (MIN_CONFIDENCE..=MAX_CONFIDENCE).contains(&self.confidence),
            "confidence must be between {MIN_CONFIDENCE} and {MAX_CONFIDENCE} (got {})",
            self.confidence
        );

        Ok(Recommendation {
            symbol: self.symbol,
            exchange: self.exchange,
            wave_type,
            priority,
            entry_price: self.entry_price,
            target_price: self.target_price,
            stop_loss: self.stop_loss,
            confidence: self.confidence,
            timeframe: self.timeframe,
            last_update: generated_at,
            reasoning: self.reasoning,
        })
    }
}
