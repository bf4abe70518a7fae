//! One-shot request/response pipeline.
//!
//! Non-interactive runs send a single request and print a single response.
//! The pipeline is a trait seam so the mode dispatcher can be exercised in
//! tests without a live endpoint.

use crate::config::Settings;
use crate::error::PipelineError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Executes one request against the configured backend.
#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn execute(&self, input: &str, correlation_id: &str) -> Result<String, PipelineError>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

/// `/chat/completions` pipeline over HTTP.
pub struct HttpPipeline {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl HttpPipeline {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: settings
                .network
                .base_url
                .trim_end_matches('/')
                .to_string(),
            model: settings.network.model.clone(),
            api_key: settings.auth.api_key.clone(),
        }
    }
}

#[async_trait]
impl Pipeline for HttpPipeline {
    async fn execute(&self, input: &str, correlation_id: &str) -> Result<String, PipelineError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: input,
            }],
        };

        let mut req = self
            .http
            .post(&url)
            .header("x-correlation-id", correlation_id)
            .json(&request);
        if !self.api_key.trim().is_empty() {
            req = req.header("Authorization", format!("Bearer {}", self.api_key));
        }

        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::Status(status.as_u16(), body));
        }

        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .unwrap_or_default();
        if content.trim().is_empty() {
            return Err(PipelineError::EmptyResponse);
        }
        Ok(content)
    }
}

static CORRELATION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Process-unique correlation id for request tracing.
pub fn new_correlation_id() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    let seq = CORRELATION_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{nanos:x}-{seq:x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correlation_ids_are_unique() {
        let a = new_correlation_id();
        let b = new_correlation_id();
        assert_ne!(a, b);
    }

    #[test]
    fn chat_response_parses_first_choice() {
        let body = r#"{"choices":[{"message":{"content":"hi there"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(body).expect("should parse");
        assert_eq!(parsed.choices[0].message.content, "hi there");
    }

    #[test]
    fn chat_response_tolerates_missing_choices() {
        let parsed: ChatResponse = serde_json::from_str("{}").expect("should parse");
        assert!(parsed.choices.is_empty());
    }
}
