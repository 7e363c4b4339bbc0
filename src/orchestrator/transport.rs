//! Provider transport seam.
//!
//! `InsightTransport::attempt` performs exactly one network call for one
//! candidate and returns the provider's text payload. The orchestrator
//! owns ordering, timeouts and classification; the transport only speaks
//! the wire format.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;

use super::candidates::{Candidate, ProviderKind};
use crate::error::{CoreError, CoreResult};

const USER_AGENT: &str = concat!("airsense-core/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransportError {
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("attempt timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    /// Provider envelope did not contain a text payload.
    #[error("malformed provider body: {0}")]
    MalformedBody(String),
}

/// One attempt's input.
#[derive(Debug, Clone, Copy)]
pub struct AttemptRequest<'a> {
    pub candidate: &'a Candidate,
    pub prompt: &'a str,
}

#[async_trait]
pub trait InsightTransport: Send + Sync {
    /// Issue one call and return the generated text.
    async fn attempt(&self, request: AttemptRequest<'_>) -> Result<String, TransportError>;
}

/// reqwest-backed transport for the Gemini and chat-completions formats.
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    /// `request_timeout` is a hard ceiling; the orchestrator applies its own
    /// per-attempt timeout as well.
    pub fn new(request_timeout: Duration) -> CoreResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(request_timeout)
            .build()
            .map_err(|e| CoreError::InvalidConfig(format!("http client: {}", e)))?;
        Ok(Self { http })
    }

    fn build_request(&self, candidate: &Candidate, prompt: &str) -> reqwest::RequestBuilder {
        let endpoint = candidate.endpoint.trim_end_matches('/');
        match candidate.kind {
            ProviderKind::Gemini => self
                .http
                .post(format!("{}/models/{}:generateContent", endpoint, candidate.model))
                .header("x-goog-api-key", &candidate.credential.api_key)
                .json(&gemini_body(prompt)),
            ProviderKind::OpenAiCompatible => self
                .http
                .post(format!("{}/chat/completions", endpoint))
                .bearer_auth(&candidate.credential.api_key)
                .json(&chat_body(&candidate.model, prompt)),
        }
    }
}

#[async_trait]
impl InsightTransport for HttpTransport {
    async fn attempt(&self, request: AttemptRequest<'_>) -> Result<String, TransportError> {
        let response = self
            .build_request(request.candidate, request.prompt)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout
                } else {
                    TransportError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: Value = serde_json::from_str(&body)
            .map_err(|e| TransportError::MalformedBody(e.to_string()))?;

        let text = match request.candidate.kind {
            ProviderKind::Gemini => extract_gemini_text(&envelope),
            ProviderKind::OpenAiCompatible => extract_chat_text(&envelope),
        };
        text.ok_or_else(|| TransportError::MalformedBody("no text payload".to_string()))
    }
}

pub fn gemini_body(prompt: &str) -> Value {
    json!({
        "contents": [{"parts": [{"text": prompt}]}],
        "generationConfig": {"temperature": 0.4}
    })
}

pub fn chat_body(model: &str, prompt: &str) -> Value {
    json!({
        "model": model,
        "messages": [{"role": "user", "content": prompt}],
        "temperature": 0.4
    })
}

/// Text at `candidates[0].content.parts[*].text`, parts concatenated.
pub fn extract_gemini_text(envelope: &Value) -> Option<String> {
    let parts = envelope
        .pointer("/candidates/0/content/parts")?
        .as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();
    (!text.trim().is_empty()).then_some(text)
}

/// Text at `choices[0].message.content`.
pub fn extract_chat_text(envelope: &Value) -> Option<String> {
    envelope
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}
