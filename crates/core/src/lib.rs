pub mod domain;
pub mod fallback;
pub mod llm;
pub mod prompt;
pub mod service;

pub mod config {
    use anyhow::Context;

    #[derive(Debug, Clone, Default)]
    pub struct Settings {
        pub openai_api_key: Option<String>,
        pub openai_base_url: Option<String>,
        pub openai_model: Option<String>,
        pub openai_max_tokens: Option<u32>,
        pub openai_timeout_secs: Option<u64>,
        pub sentry_dsn: Option<String>,
        pub port: Option<u16>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                openai_api_key: non_empty_var("OPENAI_API_KEY"),
                openai_base_url: non_empty_var("OPENAI_BASE_URL"),
                openai_model: non_empty_var("OPENAI_MODEL"),
                openai_max_tokens: parse_var("OPENAI_MAX_TOKENS")?,
                openai_timeout_secs: parse_var("OPENAI_TIMEOUT_SECS")?,
                sentry_dsn: non_empty_var("SENTRY_DSN"),
                port: parse_var("PORT")?,
            })
        }

        pub fn require_openai_api_key(&self) -> anyhow::Result<&str> {
            self.openai_api_key
                .as_deref()
                .context("OPENAI_API_KEY is required")
        }
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|s| !s.trim().is_empty())
    }

    fn parse_var<T>(key: &str) -> anyhow::Result<Option<T>>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match non_empty_var(key) {
            Some(s) => s
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|e| anyhow::anyhow!("{key} is invalid ({s:?}): {e}")),
            None => Ok(None),
        }
    }

}
