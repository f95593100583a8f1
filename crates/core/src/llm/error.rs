use crate::llm::Provider;
use std::fmt;

/// Failure of the single provider call.
#[derive(Debug, Clone)]
pub enum CompletionError {
    /// Provider answered with a non-2xx status.
    Status {
        provider: Provider,
        status: u16,
        body: String,
    },
    /// Request never produced a response (connect, timeout, body read).
    Transport { provider: Provider, detail: String },
    /// 2xx response whose envelope did not carry a first choice with text content.
    Envelope {
        provider: Provider,
        detail: String,
        raw_response: String,
    },
}

impl CompletionError {
    pub fn provider(&self) -> Provider {
        match self {
            CompletionError::Status { provider, .. }
            | CompletionError::Transport { provider, .. }
            | CompletionError::Envelope { provider, .. } => *provider,
        }
    }

    /// Content-level failures are recovered with the fallback set; everything else is
    /// surfaced to the caller.
    pub fn is_content_failure(&self) -> bool {
        matches!(self, CompletionError::Envelope { .. })
    }
}

impl fmt::Display for CompletionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionError::Status {
                provider, status, ..
            } => write!(f, "LLM error (provider={provider:?}, stage=http): status={status}"),
            CompletionError::Transport { provider, detail } => {
                write!(f, "LLM error (provider={provider:?}, stage=transport): {detail}")
            }
            CompletionError::Envelope {
                provider, detail, ..
            } => write!(f, "LLM error (provider={provider:?}, stage=envelope): {detail}"),
        }
    }
}

impl std::error::Error for CompletionError {}

/// Model content that could not be turned into a valid recommendation set.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub reason: String,
    pub raw_output: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LLM output rejected: {}", self.reason)
    }
}

impl std::error::Error for ParseError {}
