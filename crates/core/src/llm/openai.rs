use crate::config::Settings;
use crate::llm::error::CompletionError;
use crate::llm::{CompletionClient, Provider};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_MAX_TOKENS: u32 = 2000;
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const TEMPERATURE: f32 = 0.3;

#[derive(Debug, Clone)]
pub struct OpenAiOptions {
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for OpenAiOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl OpenAiOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        let mut out = Self::default();
        if let Some(base_url) = &settings.openai_base_url {
            out.base_url = base_url.clone();
        }
        if let Some(model) = &settings.openai_model {
            out.model = model.clone();
        }
        if let Some(max_tokens) = settings.openai_max_tokens {
            out.max_tokens = max_tokens;
        }
        if let Some(timeout_secs) = settings.openai_timeout_secs {
            out.timeout_secs = timeout_secs;
        }
        out
    }
}

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl OpenAiClient {
    /// Fails when `OPENAI_API_KEY` is absent so a misconfigured process never starts serving.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_openai_api_key()?.to_string();
        Self::new(api_key, OpenAiOptions::from_settings(settings))
    }

    pub fn new(api_key: String, opts: OpenAiOptions) -> anyhow::Result<Self> {
        anyhow::ensure!(!api_key.trim().is_empty(), "OPENAI_API_KEY must be non-empty");

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(opts.timeout_secs))
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            http,
            api_key,
            base_url: opts.base_url,
            model: opts.model,
            max_tokens: opts.max_tokens,
        })
    }

    fn system_prompt() -> String {
        [
            "You are a specialized Elliott Wave pattern detector for day traders.",
            "Answer ONLY with valid JSON. Do not wrap in markdown. Do not add prose before or after.",
            "Use double quotes for all JSON strings. No trailing commas. No comments.",
        ]
        .join("\n")
    }

    fn build_request(&self, prompt: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: TEMPERATURE,
            messages: vec![
                Message {
                    role: "system",
                    content: Self::system_prompt(),
                },
                Message {
                    role: "user",
                    content: prompt.to_string(),
                },
            ],
        }
    }

    fn top_choice_content(text: &str) -> Result<String, CompletionError> {
        let envelope_err = |detail: String| CompletionError::Envelope {
            provider: Provider::OpenAI,
            detail,
            raw_response: text.to_string(),
        };

        let parsed = serde_json::from_str::<ChatCompletionResponse>(text)
            .map_err(|e| envelope_err(format!("failed to decode chat completion response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| envelope_err("response has no first choice content".to_string()))
    }
}

#[async_trait::async_trait]
impl CompletionClient for OpenAiClient {
    fn provider(&self) -> Provider {
        Provider::OpenAI
    }

    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let transport_err = |e: reqwest::Error| CompletionError::Transport {
            provider: Provider::OpenAI,
            detail: e.to_string(),
        };

        let url = format!(
            "{}/v1/chat/completions",
            self.base_url.trim_end_matches('/')
        );
        let res = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&self.build_request(prompt))
            .send()
            .await
            .map_err(transport_err)?;

        let status = res.status();
        let text = res.text().await.map_err(transport_err)?;
        if !status.is_success() {
            return Err(CompletionError::Status {
                provider: Provider::OpenAI,
                status: status.as_u16(),
                body: text,
            });
        }

        Self::top_choice_content(&text)
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatCompletionRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message>,
}

#[derive(Debug, Clone, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    fn client(base_url: &str) -> OpenAiClient {
        OpenAiClient::new(
            "sk-test".to_string(),
            OpenAiOptions {
                base_url: base_url.to_string(),
                max_tokens: 1500,
                ..Default::default()
            },
        )
        .unwrap()
    }

    type Captured = Arc<Mutex<Option<(Option<String>, Value)>>>;

    async fn spawn_stub(status: StatusCode, body: Value) -> (String, Captured) {
        let captured: Captured = Arc::new(Mutex::new(None));
        let sink = captured.clone();
        let app = Router::new().route(
            "/v1/chat/completions",
            post(move |headers: HeaderMap, Json(req): Json<Value>| {
                let body = body.clone();
                let sink = sink.clone();
                async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    *sink.lock().unwrap() = Some((auth, req));
                    (status, Json(body))
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), captured)
    }

    #[test]
    fn request_carries_system_and_user_messages() {
        let req = client("http://localhost").build_request("find wave 3 setups");
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["model"], DEFAULT_MODEL);
        assert_eq!(v["max_tokens"], 1500);
        assert_eq!(v["messages"][0]["role"], "system");
        assert!(v["messages"][0]["content"]
            .as_str()
            .unwrap()
            .contains("Elliott Wave"));
        assert_eq!(v["messages"][1]["role"], "user");
        assert_eq!(v["messages"][1]["content"], "find wave 3 setups");
    }

    #[test]
    fn extracts_first_choice_content() {
        let text = json!({
            "choices": [
                {"message": {"role": "assistant", "content": "{\"recommendations\": []}"}},
                {"message": {"role": "assistant", "content": "ignored"}}
            ]
        })
        .to_string();
        assert_eq!(
            OpenAiClient::top_choice_content(&text).unwrap(),
            "{\"recommendations\": []}"
        );
    }

    #[test]
    fn empty_choices_is_an_envelope_error() {
        let err = OpenAiClient::top_choice_content("{\"choices\": []}").unwrap_err();
        assert!(err.is_content_failure());
        let err = OpenAiClient::top_choice_content("<html>").unwrap_err();
        assert!(err.is_content_failure());
    }

    #[test]
    fn rejects_blank_api_key() {
        assert!(OpenAiClient::new("  ".to_string(), OpenAiOptions::default()).is_err());
    }

    #[tokio::test]
    async fn returns_content_on_success() {
        let (base_url, captured) = spawn_stub(
            StatusCode::OK,
            json!({"choices": [{"message": {"content": "not json"}}]}),
        )
        .await;

        let out = client(&base_url).complete("prompt").await.unwrap();
        assert_eq!(out, "not json");

        let (auth, req) = captured.lock().unwrap().clone().unwrap();
        assert_eq!(auth.as_deref(), Some("Bearer sk-test"));
        assert_eq!(req["messages"][1]["content"], "prompt");
    }

    #[tokio::test]
    async fn non_success_status_is_reported_once() {
        let (base_url, _) = spawn_stub(
            StatusCode::TOO_MANY_REQUESTS,
            json!({"error": {"message": "rate limited"}}),
        )
        .await;

        let err = client(&base_url).complete("prompt").await.unwrap_err();
        match err {
            CompletionError::Status { status, body, .. } => {
                assert_eq!(status, 429);
                assert!(body.contains("rate limited"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn unreachable_provider_is_a_transport_error() {
        let err = client("http://127.0.0.1:1").complete("prompt").await.unwrap_err();
        assert!(matches!(err, CompletionError::Transport { .. }));
    }
}
