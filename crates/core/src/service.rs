use crate::domain::recommendation::{RecommendationRequest, RecommendationSet};
use crate::fallback::fallback;
use crate::llm::error::CompletionError;
use crate::llm::json::parse_recommendations;
use crate::llm::CompletionClient;
use crate::prompt;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Provider,
    Fallback,
}

impl Source {
    pub fn as_str(self) -> &'static str {
        match self {
            Source::Provider => "provider",
            Source::Fallback => "fallback",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Generated {
    pub set: RecommendationSet,
    pub source: Source,
}

/// Prompt → provider → validation, with the fallback set covering unusable content.
#[derive(Clone)]
pub struct RecommendationService {
    client: Arc<dyn CompletionClient>,
}

impl RecommendationService {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    pub async fn generate(
        &self,
        request: &RecommendationRequest,
    ) -> Result<Generated, CompletionError> {
        self.generate_at(request, Utc::now()).await
    }

    pub async fn generate_at(
        &self,
        request: &RecommendationRequest,
        generated_at: DateTime<Utc>,
    ) -> Result<Generated, CompletionError> {
        let timeframe = request.timeframe.as_deref();
        if request.known_timeframe().is_none() {
            tracing::warn!(?timeframe, "timeframe outside the enumerated set; passing through");
        }

        let prompt = prompt::build(timeframe, request.criteria.as_ref(), generated_at);

        let raw = match self.client.complete(&prompt).await {
            Ok(raw) => raw,
            Err(err) if err.is_content_failure() => {
                tracing::warn!(
                    provider = ?err.provider(),
                    error = %err,
                    "provider envelope unusable; serving fallback recommendations"
                );
                return Ok(Generated {
                    set: fallback(timeframe, generated_at),
                    source: Source::Fallback,
                });
            }
            Err(err) => {
                if let CompletionError::Status { status, body, .. } = &err {
                    tracing::error!(status, %body, "completion provider returned an error status");
                } else {
                    tracing::error!(error = %err, "completion provider request failed");
                }
                return Err(err);
            }
        };

        match parse_recommendations(&raw, generated_at) {
            Ok(set) => {
                tracing::info!(
                    provider = ?self.client.provider(),
                    count = set.recommendations.len(),
                    "recommendations generated"
                );
                Ok(Generated {
                    set,
                    source: Source::Provider,
                })
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    raw_output = %err.raw_output,
                    "failed to parse LLM output; serving fallback recommendations"
                );
                Ok(Generated {
                    set: fallback(timeframe, generated_at),
                    source: Source::Fallback,
                })
            }
        }
    }
}
