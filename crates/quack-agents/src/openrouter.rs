//! OpenRouter chat-completions client in JSON mode.
//!
//! Every call is one POST with no retry. The prompt is suffixed with a
//! JSON-only instruction and the request also asks for
//! `response_format: json_object`, so the format is enforced twice.

use std::time::Duration;

use async_trait::async_trait;
use quack_models::config::LlmConfig;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

use crate::error::AgentError;
use crate::llm::LanguageModelClient;

pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

pub const JSON_ONLY_INSTRUCTION: &str = "\n\nIMPORTANT: You must respond with ONLY valid JSON. \
     Do not include any text before or after the JSON.";

/// How much of an unparseable completion is echoed back in the error.
const CONTENT_PREVIEW_CHARS: usize = 200;

/// Resolved client settings, built once at startup.
#[derive(Clone)]
pub struct OpenRouterConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub default_model: String,
    pub temperature: f32,
    pub timeout: Duration,
    pub referer: String,
    pub title: String,
}

impl OpenRouterConfig {
    pub fn from_llm_config(llm: &LlmConfig, api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            endpoint: llm.endpoint.clone(),
            default_model: llm.default_model.clone(),
            temperature: llm.temperature,
            timeout: Duration::from_secs(llm.timeout_seconds),
            referer: llm.referer.clone(),
            title: llm.title.clone(),
        }
    }

    /// Read the API key from the process environment.
    pub fn from_env(llm: &LlmConfig) -> Self {
        Self::from_llm_config(llm, std::env::var(API_KEY_ENV).ok())
    }
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self::from_llm_config(&LlmConfig::default(), None)
    }
}

impl std::fmt::Debug for OpenRouterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenRouterConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("default_model", &self.default_model)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat,
    temperature: f32,
}

/// Append the JSON-only instruction to a prompt.
pub fn json_prompt(prompt: &str) -> String {
    format!("{prompt}{JSON_ONLY_INSTRUCTION}")
}

fn build_request<'a>(prompt: &str, model: &'a str, temperature: f32) -> ChatRequest<'a> {
    ChatRequest {
        model,
        messages: vec![ChatMessage {
            role: "user",
            content: json_prompt(prompt),
        }],
        response_format: ResponseFormat {
            kind: "json_object",
        },
        temperature,
    }
}

fn status_line(status: StatusCode) -> String {
    format!(
        "HTTP {}: {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown Status")
    )
}

fn preview(content: &str) -> String {
    content.chars().take(CONTENT_PREVIEW_CHARS).collect()
}

/// Turn an HTTP status and body into the completion's JSON value.
pub fn interpret_response(status: StatusCode, body: &str) -> Result<Value, AgentError> {
    if !status.is_success() {
        let message = match serde_json::from_str::<Value>(body) {
            Ok(parsed) => parsed
                .pointer("/error/message")
                .and_then(Value::as_str)
                .filter(|m| !m.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| status_line(status)),
            Err(_) if body.trim().is_empty() => status_line(status),
            Err(_) => body.to_string(),
        };
        return Err(AgentError::Api {
            status: Some(status.as_u16()),
            message,
        });
    }

    let data: Value = serde_json::from_str(body)?;

    if let Some(api_error) = data.get("error").filter(|e| !e.is_null()) {
        let message = api_error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Unknown error")
            .to_string();
        return Err(AgentError::Api {
            status: Some(status.as_u16()),
            message,
        });
    }

    let content = data
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| {
            AgentError::NoContent(
                serde_json::to_string_pretty(&data).unwrap_or_else(|_| data.to_string()),
            )
        })?;

    serde_json::from_str(content).map_err(|_| AgentError::InvalidJson(preview(content)))
}

pub struct OpenRouterClient {
    config: OpenRouterConfig,
    http: reqwest::Client,
}

impl OpenRouterClient {
    pub fn new(config: OpenRouterConfig) -> Result<Self, AgentError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &OpenRouterConfig {
        &self.config
    }

    async fn send(&self, prompt: &str, model: &str) -> Result<Value, AgentError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(AgentError::MissingApiKey)?;

        let body = build_request(prompt, model, self.config.temperature);
        debug!(model, prompt_chars = prompt.len(), "Sending OpenRouter request");

        let response = self
            .http
            .post(&self.config.endpoint)
            .bearer_auth(api_key)
            .header("HTTP-Referer", &self.config.referer)
            .header("X-Title", &self.config.title)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        debug!(model, status = status.as_u16(), body_chars = text.len(), "OpenRouter responded");

        interpret_response(status, &text)
    }
}

#[async_trait]
impl LanguageModelClient for OpenRouterClient {
    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    async fn complete_json(&self, prompt: &str, model: &str) -> Result<Value, AgentError> {
        let result = self.send(prompt, model).await;
        if let Err(e) = &result {
            error!(model, error = %e, "Error generating JSON from OpenRouter");
        }
        result
    }
}
