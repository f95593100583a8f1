use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wavescan_core::domain::recommendation::{RecommendationRequest, Timeframe};
use wavescan_core::llm::openai::OpenAiClient;
use wavescan_core::service::RecommendationService;

#[derive(Debug, Parser)]
#[command(name = "wavescan_cli")]
struct Args {
    /// Chart timeframe: 15m, 1h, 4h, 1d or 1wk.
    #[arg(long, default_value = "1h")]
    timeframe: Timeframe,

    /// Free-text filter intent forwarded to the prompt.
    #[arg(long)]
    criteria: Option<String>,

    /// Print the rendered prompt and exit without calling the provider.
    #[arg(long)]
    prompt_only: bool,
}

impl Args {
    fn request(&self) -> RecommendationRequest {
        RecommendationRequest {
            timeframe: Some(self.timeframe.to_string()),
            criteria: self.criteria.clone().map(serde_json::Value::String),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = wavescan_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    let request = args.request();

    if args.prompt_only {
        let prompt = wavescan_core::prompt::build(
            request.timeframe.as_deref(),
            request.criteria.as_ref(),
            chrono::Utc::now(),
        );
        println!("{prompt}");
        return Ok(());
    }

    let client = OpenAiClient::from_settings(&settings)?;
    let service = RecommendationService::new(Arc::new(client));

    match service.generate(&request).await {
        Ok(generated) => {
            tracing::info!(
                timeframe = %args.timeframe,
                source = %generated.source,
                count = generated.set.recommendations.len(),
                "recommendation run finished"
            );
            println!("{}", serde_json::to_string_pretty(&generated.set)?);
            Ok(())
        }
        Err(e) => {
            let err = anyhow::Error::new(e);
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(timeframe = %args.timeframe, error = %err, "recommendation run failed");
            Err(err)
        }
    }
}

fn init_sentry(settings: &wavescan_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
