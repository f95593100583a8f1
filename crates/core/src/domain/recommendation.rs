use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const MAX_RECOMMENDATIONS: usize = 10;
pub const MIN_CONFIDENCE: f64 = 70.0;
pub const MAX_CONFIDENCE: f64 = 95.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaveType {
    Wave3,
    WaveC,
    WaveB,
}

impl WaveType {
    pub const ALL: [WaveType; 3] = [WaveType::Wave3, WaveType::WaveC, WaveType::WaveB];

    pub fn as_str(self) -> &'static str {
        match self {
            WaveType::Wave3 => "Wave3",
            WaveType::WaveC => "WaveC",
            WaveType::WaveB => "WaveB",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|w| w.as_str() == s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    #[serde(rename = "ALTA")]
    Alta,
    #[serde(rename = "MEDIA")]
    Media,
    #[serde(rename = "BAJA")]
    Baja,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Alta, Priority::Media, Priority::Baja];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Alta => "ALTA",
            Priority::Media => "MEDIA",
            Priority::Baja => "BAJA",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == s)
    }
}

/// Chart timeframes offered by the selector in the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeframe {
    M15,
    H1,
    H4,
    D1,
    W1,
}

impl Timeframe {
    pub const ALL: [Timeframe; 5] = [
        Timeframe::M15,
        Timeframe::H1,
        Timeframe::H4,
        Timeframe::D1,
        Timeframe::W1,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Timeframe::M15 => "15m",
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1d",
            Timeframe::W1 => "1wk",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTimeframe(pub String);

impl fmt::Display for UnknownTimeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown timeframe {:?} (expected one of 15m, 1h, 4h, 1d, 1wk)",
            self.0
        )
    }
}

impl std::error::Error for UnknownTimeframe {}

impl FromStr for Timeframe {
    type Err = UnknownTimeframe;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| UnknownTimeframe(s.to_string()))
    }
}

/// Inbound payload. Fields are not schema-checked: whatever the caller sends is forwarded
/// into the prompt, and an absent timeframe renders as `undefined`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecommendationRequest {
    #[serde(default, deserialize_with = "timeframe_as_text")]
    pub timeframe: Option<String>,
    #[serde(default)]
    pub criteria: Option<serde_json::Value>,
}

// Non-string timeframes are kept as their JSON text (`60`, `["1h"]`); null means absent.
fn timeframe_as_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

impl RecommendationRequest {
    pub fn new(timeframe: impl Into<String>, criteria: impl Into<serde_json::Value>) -> Self {
        Self {
            timeframe: Some(timeframe.into()),
            criteria: Some(criteria.into()),
        }
    }

    /// The known timeframe, if the requested value is one of the enumerated set.
    pub fn known_timeframe(&self) -> Option<Timeframe> {
        self.timeframe.as_deref()?.parse().ok()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub symbol: String,
    pub exchange: String,
    pub wave_type: WaveType,
    pub priority: Priority,
    pub entry_price: f64,
    pub target_price: f64,
    pub stop_loss: f64,
    pub confidence: f64,
    pub timeframe: String,
    pub last_update: DateTime<Utc>,
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationSet {
    pub recommendations: Vec<Recommendation>,
}
