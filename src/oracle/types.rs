//! Oracle request and error types

use std::time::Duration;

use serde::Serialize;

use crate::context::Exchange;
use crate::tools::ToolSchema;

/// Who is asking the oracle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OracleRole {
    Router,
    Specialist,
}

/// One specialist as presented to the routing oracle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Capability {
    pub agent: String,
    pub description: String,
}

/// A single oracle consultation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OracleRequest {
    pub role: OracleRole,

    /// Domain description of the asking component
    pub description: String,

    pub query: String,

    /// Tools the specialist may call (specialist role only)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolSchema>,

    /// Specialists to choose from (router role only)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub capabilities: Vec<Capability>,

    /// Tool calls and results so far in this request
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub transcript: Vec<Exchange>,
}

impl OracleRequest {
    /// Request for a routing decision
    pub fn routing(query: impl Into<String>, capabilities: Vec<Capability>) -> Self {
        Self {
            role: OracleRole::Router,
            description: "Select the specialist best suited to the question, or reject it.".to_string(),
            query: query.into(),
            tools: Vec::new(),
            capabilities,
            transcript: Vec::new(),
        }
    }

    /// Request for the next specialist step
    pub fn specialist(
        description: impl Into<String>,
        query: impl Into<String>,
        tools: Vec<ToolSchema>,
        transcript: Vec<Exchange>,
    ) -> Self {
        Self {
            role: OracleRole::Specialist,
            description: description.into(),
            query: query.into(),
            tools,
            capabilities: Vec::new(),
            transcript,
        }
    }
}

/// Failures talking to the oracle. Request-fatal and never retried.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OracleError {
    #[error("Oracle timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Malformed oracle response: {0}")]
    Malformed(String),

    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),
}

impl OracleError {
    pub fn kind(&self) -> OracleErrorKind {
        match self {
            OracleError::Timeout { .. } => OracleErrorKind::Timeout,
            OracleError::Malformed(_) => OracleErrorKind::Malformed,
            OracleError::RateLimited { .. } => OracleErrorKind::RateLimited,
            OracleError::Api { .. } => OracleErrorKind::Api,
            OracleError::Transport(_) => OracleErrorKind::Transport,
        }
    }

    pub fn is_rate_limit(&self) -> bool {
        matches!(self, OracleError::RateLimited { .. })
    }
}

/// Discriminant of [`OracleError`], safe to expose in responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OracleErrorKind {
    Timeout,
    Malformed,
    RateLimited,
    Api,
    Transport,
}

impl std::fmt::Display for OracleErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OracleErrorKind::Timeout => "timeout",
            OracleErrorKind::Malformed => "malformed",
            OracleErrorKind::RateLimited => "rate_limited",
            OracleErrorKind::Api => "api",
            OracleErrorKind::Transport => "transport",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{ToolCall, ToolResult};
    use serde_json::json;

    #[test]
    fn test_routing_request_serialization() {
        let request = OracleRequest::routing(
            "Solve 2x + 5 = 15",
            vec![Capability {
                agent: "math".to_string(),
                description: "Algebra".to_string(),
            }],
        );
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["role"], "router");
        assert_eq!(value["capabilities"][0]["agent"], "math");
        assert!(value.get("tools").is_none());
        assert!(value.get("transcript").is_none());
    }

    #[test]
    fn test_specialist_request_includes_transcript() {
        let exchange = Exchange {
            call: ToolCall::new("calculator", json!({"expression": "1+1"})),
            result: ToolResult::success(json!({"result": 2.0})),
        };
        let request = OracleRequest::specialist("Math", "1+1?", Vec::new(), vec![exchange]);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["role"], "specialist");
        assert_eq!(value["transcript"][0]["call"]["name"], "calculator");
        assert_eq!(value["transcript"][0]["result"]["status"], "ok");
    }

    #[test]
    fn test_oracle_error_kind() {
        assert_eq!(OracleError::Timeout { timeout_ms: 10 }.kind(), OracleErrorKind::Timeout);
        assert_eq!(OracleError::Malformed("x".into()).kind(), OracleErrorKind::Malformed);
        assert_eq!(
            OracleError::Api {
                status: 500,
                message: "boom".into()
            }
            .kind(),
            OracleErrorKind::Api
        );
        assert!(OracleError::RateLimited { retry_after: None }.is_rate_limit());
    }

    #[test]
    fn test_oracle_error_display() {
        let err = OracleError::Api {
            status: 400,
            message: "bad request".to_string(),
        };
        assert_eq!(err.to_string(), "API error 400: bad request");
        assert_eq!(OracleErrorKind::RateLimited.to_string(), "rate_limited");
    }
}
