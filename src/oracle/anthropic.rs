//! Anthropic API oracle
//!
//! Sends each [`OracleRequest`] as a single Messages API call and extracts
//! one JSON object from the text reply.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use super::client::Oracle;
use super::types::{OracleError, OracleRequest, OracleRole};
use crate::error::{Result, TutorError};

/// Anthropic API base URL
const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";

/// Anthropic API version
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Default model to use
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Default max tokens
const DEFAULT_MAX_TOKENS: u32 = 1024;

const ROUTER_SYSTEM_PROMPT: &str = "You route student questions to subject specialists. \
Reply with exactly one JSON object and nothing else: \
{\"action\": \"delegate\" | \"reject\", \"target\": <agent name or null>, \"reasoning\": <string>, \"confidence\": <number 0..1>}. \
Use \"delegate\" with a target from the capabilities list, or \"reject\" with target null when no specialist fits.";

const SPECIALIST_SYSTEM_PROMPT: &str = "You are a subject specialist tutor. You may call the listed tools. \
Reply with exactly one JSON object and nothing else, either \
{\"toolCall\": {\"name\": <tool name>, \"arguments\": {...}}, \"text\": <optional note>} to run a tool, or \
{\"finalAnswer\": <explanation for the student>, \"confidence\": <optional number 0..1>} when done. \
Tool results so far are in the transcript.";

/// Configuration for the Anthropic oracle
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    pub model: String,
    pub max_tokens: u32,
    pub timeout: Duration,
    pub base_url: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(30),
            base_url: ANTHROPIC_API_URL.to_string(),
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
        }
    }
}

impl AnthropicConfig {
    /// Create a new config with a specific model
    pub fn with_model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }
}

/// Oracle backed by the Anthropic Messages API
pub struct AnthropicOracle {
    client: Client,
    api_key: String,
    config: AnthropicConfig,
}

impl AnthropicOracle {
    /// Create a new oracle, reading the key from `config.api_key_env`
    pub fn new(config: AnthropicConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| TutorError::Config(format!("{} not set", config.api_key_env)))?;

        Self::with_api_key(api_key, config)
    }

    /// Create an oracle with an explicit API key
    pub fn with_api_key(api_key: String, config: AnthropicConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TutorError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, api_key, config })
    }

    /// Build the request body for the Anthropic API
    fn build_request(&self, request: &OracleRequest) -> std::result::Result<Value, OracleError> {
        let system = match request.role {
            OracleRole::Router => ROUTER_SYSTEM_PROMPT,
            OracleRole::Specialist => SPECIALIST_SYSTEM_PROMPT,
        };
        let payload = serde_json::to_string_pretty(request)
            .map_err(|e| OracleError::Malformed(format!("Failed to encode request: {}", e)))?;

        Ok(json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "system": system,
            "messages": [{
                "role": "user",
                "content": payload,
            }],
        }))
    }

    /// Pull the JSON reply out of the response's text blocks
    fn parse_response(&self, body: &Value) -> std::result::Result<Value, OracleError> {
        let text: String = body["content"]
            .as_array()
            .map(|blocks| {
                blocks
                    .iter()
                    .filter(|b| b["type"] == "text")
                    .filter_map(|b| b["text"].as_str())
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(OracleError::Malformed("response has no text content".to_string()));
        }

        extract_json_object(&text)
    }

    async fn send_request(&self, body: Value) -> std::result::Result<Value, OracleError> {
        let response = self
            .client
            .post(&self.config.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();

        // Handle rate limiting
        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(OracleError::RateLimited { retry_after });
        }

        // Handle other errors
        if !status.is_success() {
            let message = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(OracleError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| OracleError::Malformed(format!("Failed to parse response: {}", e)))
    }

    fn map_transport_error(&self, err: reqwest::Error) -> OracleError {
        if err.is_timeout() {
            OracleError::Timeout {
                timeout_ms: self.config.timeout.as_millis() as u64,
            }
        } else {
            OracleError::Transport(err.to_string())
        }
    }
}

/// Find a single JSON object in model text, tolerating code fences and prose
fn extract_json_object(text: &str) -> std::result::Result<Value, OracleError> {
    let trimmed = text.trim();
    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(trimmed) {
        return Ok(value);
    }

    let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) else {
        return Err(OracleError::Malformed("no JSON object in response".to_string()));
    };
    if end < start {
        return Err(OracleError::Malformed("no JSON object in response".to_string()));
    }

    match serde_json::from_str::<Value>(&trimmed[start..=end]) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(_) => Err(OracleError::Malformed("response JSON is not an object".to_string())),
        Err(e) => Err(OracleError::Malformed(format!("invalid JSON in response: {}", e))),
    }
}

#[async_trait]
impl Oracle for AnthropicOracle {
    async fn consult(&self, request: OracleRequest) -> std::result::Result<Value, OracleError> {
        tracing::debug!(model = %self.config.model, role = ?request.role, "consulting oracle");
        let body = self.build_request(&request)?;
        let response = self.send_request(body).await?;
        self.parse_response(&response)
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

impl std::fmt::Debug for AnthropicOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicOracle")
            .field("model", &self.config.model)
            .field("max_tokens", &self.config.max_tokens)
            .finish()
    }
}
