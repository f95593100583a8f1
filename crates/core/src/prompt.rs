use crate::domain::recommendation::{
    Priority, WaveType, MAX_CONFIDENCE, MAX_RECOMMENDATIONS, MIN_CONFIDENCE,
};
use chrono::{DateTime, SecondsFormat, Utc};

#[derive(Debug, Clone, Copy)]
pub struct Instrument {
    pub symbol: &'static str,
    pub exchange: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct MarketGroup {
    pub name: &'static str,
    pub instruments: &'static [Instrument],
}

const fn inst(symbol: &'static str, exchange: &'static str) -> Instrument {
    Instrument { symbol, exchange }
}

/// Instruments the model may pick from.
pub const UNIVERSE: &[MarketGroup] = &[
    MarketGroup {
        name: "Índices",
        instruments: &[
            inst("SPY", "NYSE"),
            inst("QQQ", "NASDAQ"),
            inst("DIA", "NYSE"),
            inst("IWM", "NYSE"),
        ],
    },
    MarketGroup {
        name: "Acciones tecnológicas",
        instruments: &[
            inst("AAPL", "NASDAQ"),
            inst("MSFT", "NASDAQ"),
            inst("NVDA", "NASDAQ"),
            inst("TSLA", "NASDAQ"),
            inst("AMZN", "NASDAQ"),
            inst("META", "NASDAQ"),
            inst("GOOGL", "NASDAQ"),
            inst("AMD", "NASDAQ"),
            inst("NFLX", "NASDAQ"),
        ],
    },
    MarketGroup {
        name: "Acciones financieras e industriales",
        instruments: &[
            inst("JPM", "NYSE"),
            inst("BAC", "NYSE"),
            inst("GS", "NYSE"),
            inst("BA", "NYSE"),
            inst("CAT", "NYSE"),
            inst("XOM", "NYSE"),
        ],
    },
    MarketGroup {
        name: "Criptomonedas",
        instruments: &[
            inst("BTCUSD", "BINANCE"),
            inst("ETHUSD", "BINANCE"),
            inst("SOLUSD", "BINANCE"),
            inst("XRPUSD", "BINANCE"),
        ],
    },
    MarketGroup {
        name: "Forex",
        instruments: &[
            inst("EURUSD", "FX"),
            inst("GBPUSD", "FX"),
            inst("USDJPY", "FX"),
            inst("AUDUSD", "FX"),
        ],
    },
    MarketGroup {
        name: "Materias primas",
        instruments: &[
            inst("XAUUSD", "COMEX"),
            inst("XAGUSD", "COMEX"),
            inst("CL", "NYMEX"),
        ],
    },
];

pub fn universe_len() -> usize {
    UNIVERSE.iter().map(|g| g.instruments.len()).sum()
}

fn render_criteria(criteria: Option<&serde_json::Value>) -> String {
    match criteria {
        None | Some(serde_json::Value::Null) => "sin criterios adicionales".to_string(),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => {
            "sin criterios adicionales".to_string()
        }
        Some(serde_json::Value::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string(),
    }
}

fn join_values(values: impl Iterator<Item = &'static str>) -> String {
    values.collect::<Vec<_>>().join(" | ")
}

fn universe_lines() -> String {
    UNIVERSE
        .iter()
        .map(|group| {
            let symbols = group
                .instruments
                .iter()
                .map(|i| format!("{} ({})", i.symbol, i.exchange))
                .collect::<Vec<_>>()
                .join(", ");
            format!("- {}: {symbols}", group.name)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn output_schema(timeframe: &str, generated_at: DateTime<Utc>) -> String {
    let wave_types = join_values(WaveType::ALL.into_iter().map(WaveType::as_str));
    let priorities = join_values(Priority::ALL.into_iter().map(Priority::as_str));
    let last_update = generated_at.to_rfc3339_opts(SecondsFormat::Millis, true);

    [
        "{".to_string(),
        "  \"recommendations\": [".to_string(),
        "    {".to_string(),
        "      \"symbol\": \"AAPL\",".to_string(),
        "      \"exchange\": \"NASDAQ\",".to_string(),
        format!("      \"waveType\": \"{wave_types}\","),
        format!("      \"priority\": \"{priorities}\","),
        "      \"entryPrice\": 0.0,".to_string(),
        "      \"targetPrice\": 0.0,".to_string(),
        "      \"stopLoss\": 0.0,".to_string(),
        format!("      \"confidence\": {MIN_CONFIDENCE:.0}-{MAX_CONFIDENCE:.0},"),
        format!("      \"timeframe\": \"{timeframe}\","),
        format!("      \"lastUpdate\": \"{last_update}\","),
        "      \"reasoning\": \"explicación breve\"".to_string(),
        "    }".to_string(),
        "  ]".to_string(),
        "}".to_string(),
    ]
    .join("\n")
}

/// Render the user prompt. Pure: the same inputs always give the same text.
pub fn build(
    timeframe: Option<&str>,
    criteria: Option<&serde_json::Value>,
    generated_at: DateTime<Utc>,
) -> String {
    let timeframe = timeframe.unwrap_or("undefined");

    format!(
        "Analiza los siguientes instrumentos en temporalidad {timeframe} y detecta oportunidades \
de trading basadas en la Teoría de Ondas de Elliott.\n\n\
INSTRUMENTOS A ANALIZAR:\n{universe}\n\n\
CRITERIOS DEL USUARIO: {criteria}\n\n\
REGLAS DE FILTRADO:\n\
1. Prioriza estructuras impulsivas en Onda 3 (Wave3); usa WaveC o WaveB solo si la estructura es clara.\n\
2. Exige confirmación de ruptura: el precio debe haber cerrado por encima (o por debajo) del nivel clave.\n\
3. Los dos conteos de ondas principales deben coincidir en la dirección del movimiento.\n\
4. Apto para day trading: máximo una operación por instrumento por día.\n\
5. Descarta cualquier oportunidad con confianza inferior a {MIN_CONFIDENCE:.0}.\n\n\
FORMATO DE RESPUESTA (solo JSON, sin texto adicional):\n{schema}\n\n\
Devuelve como máximo {MAX_RECOMMENDATIONS} recomendaciones, ordenadas por prioridad. \
Si ninguna cumple las reglas, devuelve {{\"recommendations\": []}}.",
        universe = universe_lines(),
        criteria = render_criteria(criteria),
        schema = output_schema(timeframe, generated_at),
    )
}
