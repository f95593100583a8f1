use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, Method, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use wavescan_core::domain::recommendation::RecommendationRequest;
use wavescan_core::llm::openai::OpenAiClient;
use wavescan_core::service::RecommendationService;

const SOURCE_HEADER: &str = "x-recommendation-source";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = wavescan_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let client = match OpenAiClient::from_settings(&settings) {
        Ok(client) => client,
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "completion provider not configured; refusing to start");
            return Err(e);
        }
    };

    let state = AppState {
        service: RecommendationService::new(Arc::new(client)),
    };

    let port = settings.port.unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/", post(generate_recommendations))
        .route("/*path", post(generate_recommendations))
        .with_state(state)
        .layer(cors())
        .layer(TraceLayer::new_for_http())
}

// Answers every OPTIONS request itself (200, empty body) and stamps
// Access-Control-Allow-Origin on all other responses.
fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([
            AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            CONTENT_TYPE,
        ])
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    service: RecommendationService,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(message: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

async fn generate_recommendations(State(state): State<AppState>, body: Bytes) -> Response {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("generate_recommendations", %request_id);

    async move {
        let request = match serde_json::from_slice::<RecommendationRequest>(&body) {
            Ok(request) => request,
            Err(e) => {
                let err = anyhow::Error::new(e).context("malformed request body");
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(error = %format!("{err:#}"), "request rejected");
                return error_response("Internal server error");
            }
        };

        match state.service.generate(&request).await {
            Ok(generated) => (
                StatusCode::OK,
                [(SOURCE_HEADER, generated.source.as_str())],
                Json(generated.set),
            )
                .into_response(),
            Err(e) => {
                let err = anyhow::Error::new(e);
                sentry_anyhow::capture_anyhow(&err);
                error_response("Error generating recommendations")
            }
        }
    }
    .instrument(span)
    .await
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
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
