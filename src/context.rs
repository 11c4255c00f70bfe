//! Per-request state threaded through router, specialist and aggregator

use std::time::Instant;

use serde::Serialize;

use crate::error::{Result, TutorError};
use crate::id::generate_request_id;
use crate::tools::{ToolCall, ToolResult};

/// Non-empty question text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query(String);

impl Query {
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(TutorError::EmptyQuery);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One tool call and its outcome
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exchange {
    pub call: ToolCall,
    pub result: ToolResult,
}

/// State owned by a single request, dropped when the answer is emitted
#[derive(Debug)]
pub struct ExecutionContext {
    request_id: String,
    query: Query,
    transcript: Vec<Exchange>,
    started: Instant,
    routing_ms: u64,
}

impl ExecutionContext {
    pub fn new(query: Query) -> Self {
        Self::with_request_id(generate_request_id(), query)
    }

    pub fn with_request_id(request_id: impl Into<String>, query: Query) -> Self {
        Self {
            request_id: request_id.into(),
            query,
            transcript: Vec::new(),
            started: Instant::now(),
            routing_ms: 0,
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn transcript(&self) -> &[Exchange] {
        &self.transcript
    }

    /// Append a tool call and its result
    pub fn record(&mut self, call: ToolCall, result: ToolResult) {
        self.transcript.push(Exchange { call, result });
    }

    /// Milliseconds since the request started
    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    pub fn routing_ms(&self) -> u64 {
        self.routing_ms
    }

    pub fn set_routing_ms(&mut self, ms: u64) {
        self.routing_ms = ms;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_rejects_blank() {
        assert!(matches!(Query::new(""), Err(TutorError::EmptyQuery)));
        assert!(matches!(Query::new("   \n\t"), Err(TutorError::EmptyQuery)));
    }

    #[test]
    fn test_query_trims() {
        let query = Query::new("  What is 2 + 2?  ").unwrap();
        assert_eq!(query.as_str(), "What is 2 + 2?");
        assert_eq!(query.to_string(), "What is 2 + 2?");
    }

    #[test]
    fn test_context_records_transcript() {
        let mut ctx = ExecutionContext::with_request_id("req-1", Query::new("q").unwrap());
        assert!(ctx.transcript().is_empty());

        ctx.record(
            ToolCall::new("calculator", json!({"expression": "1+1"})),
            ToolResult::success(json!({"result": 2.0})),
        );

        assert_eq!(ctx.transcript().len(), 1);
        assert_eq!(ctx.transcript()[0].call.name, "calculator");
        assert_eq!(ctx.request_id(), "req-1");
    }

    #[test]
    fn test_context_routing_ms() {
        let mut ctx = ExecutionContext::new(Query::new("q").unwrap());
        assert_eq!(ctx.routing_ms(), 0);
        ctx.set_routing_ms(42);
        assert_eq!(ctx.routing_ms(), 42);
        assert!(ctx.request_id().starts_with("req-"));
    }
}
