//! Specialist agent - the bounded oracle/tool loop
//!
//! Each step either consults the oracle or runs one tool call:
//!
//! 1. `AwaitingOracle`: send query, transcript and permitted tool schemas
//! 2. A final answer ends the loop (`Done`)
//! 3. A tool call moves to `ToolPending`; the call is validated, executed,
//!    and recorded in the request transcript
//! 4. Back to `AwaitingOracle` until an answer arrives or the iteration cap
//!    is reached (`Failed`)
//!
//! Oracle failures end the loop immediately. Nothing is retried.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use super::AgentId;
use crate::context::ExecutionContext;
use crate::oracle::{Oracle, OracleErrorKind, OracleRequest, SpecialistReply, parse_specialist_reply};
use crate::tools::{RegistryError, ToolCall, ToolRegistry, ToolResult, ToolSchema, validate_call};

/// Default confidence for an answer backed by at least one successful tool result
pub const TOOL_BACKED_CONFIDENCE: f64 = 0.85;

/// Default confidence for an answer with no successful tool result
pub const REASONING_ONLY_CONFIDENCE: f64 = 0.7;

/// Configuration for a specialist loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecialistConfig {
    /// Maximum oracle consultations per request
    pub max_iterations: u32,
}

impl Default for SpecialistConfig {
    fn default() -> Self {
        Self { max_iterations: 5 }
    }
}

/// Why a specialist loop ended without an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpecialistFailure {
    /// The oracle kept asking for tools until the cap
    ToolLoopExceeded { iterations: u32 },
    /// The oracle call failed or its reply was unusable
    Oracle { error: OracleErrorKind },
}

impl std::fmt::Display for SpecialistFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpecialistFailure::ToolLoopExceeded { iterations } => {
                write!(f, "tool loop exceeded after {} oracle calls", iterations)
            }
            SpecialistFailure::Oracle { error } => write!(f, "oracle failure ({})", error),
        }
    }
}

/// Loop state
#[derive(Debug, Clone, PartialEq)]
pub enum LoopState {
    AwaitingOracle,
    ToolPending(ToolCall),
    Done { text: String, confidence: f64 },
    Failed(SpecialistFailure),
}

impl LoopState {
    pub fn name(&self) -> &'static str {
        match self {
            LoopState::AwaitingOracle => "awaiting_oracle",
            LoopState::ToolPending(_) => "tool_pending",
            LoopState::Done { .. } => "done",
            LoopState::Failed(_) => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LoopState::Done { .. } | LoopState::Failed(_))
    }
}

/// What a specialist produced for one request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentResponse {
    /// Final answer, or best-effort oracle text when the loop failed
    pub text: String,
    pub confidence: f64,
    pub agent: AgentId,
    /// Tool calls in the order they were requested
    pub tool_calls_made: Vec<ToolCall>,
    pub execution_time_ms: u64,
    /// True iff the loop reached `Done`
    pub terminal: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<SpecialistFailure>,
    /// Oracle consultations used
    pub iterations: u32,
}

/// A subject specialist bound to its tools and an oracle
pub struct Specialist<O: Oracle> {
    id: AgentId,
    tools: Vec<ToolSchema>,
    registry: Arc<ToolRegistry>,
    oracle: Arc<O>,
    config: SpecialistConfig,
}

impl<O: Oracle> Specialist<O> {
    /// Bind `id` to its tool subset; fails if the registry lacks one of them
    pub fn new(
        id: AgentId,
        registry: Arc<ToolRegistry>,
        oracle: Arc<O>,
        config: SpecialistConfig,
    ) -> Result<Self, RegistryError> {
        let tools = registry.schemas_for(id.tool_names())?;
        Ok(Self {
            id,
            tools,
            registry,
            oracle,
            config,
        })
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn description(&self) -> &'static str {
        self.id.description()
    }

    /// Schemas offered to the oracle, in order
    pub fn tools(&self) -> &[ToolSchema] {
        &self.tools
    }

    /// Run the loop for the request in `ctx`. Failures are folded into the response.
    pub async fn handle(&self, ctx: &mut ExecutionContext) -> AgentResponse {
        let started = Instant::now();
        let mut state = LoopState::AwaitingOracle;
        let mut iterations: u32 = 0;
        let mut tool_calls_made = Vec::new();
        let mut successful_tools = 0usize;
        let mut last_text: Option<String> = None;

        log::debug!("{} handling request {}", self.id.display_name(), ctx.request_id());

        let (text, confidence, failure) = loop {
            state = match state {
                LoopState::AwaitingOracle => {
                    if iterations >= self.config.max_iterations {
                        LoopState::Failed(SpecialistFailure::ToolLoopExceeded { iterations })
                    } else {
                        iterations += 1;
                        self.consult(ctx, successful_tools, &mut last_text).await
                    }
                }
                LoopState::ToolPending(call) => {
                    let result = self.run_tool(&call);
                    tracing::debug!(
                        request_id = %ctx.request_id(),
                        agent = %self.id,
                        tool = %call.name,
                        ok = result.is_ok(),
                        "tool call"
                    );
                    if result.is_ok() {
                        successful_tools += 1;
                    }
                    tool_calls_made.push(call.clone());
                    ctx.record(call, result);
                    LoopState::AwaitingOracle
                }
                LoopState::Done { text, confidence } => break (text, confidence, None),
                LoopState::Failed(failure) => break (last_text.take().unwrap_or_default(), 0.0, Some(failure)),
            };

            tracing::trace!(
                request_id = %ctx.request_id(),
                agent = %self.id,
                iteration = iterations,
                state = state.name(),
                "specialist transition"
            );
        };

        if let Some(failure) = &failure {
            log::warn!("{} failed request {}: {}", self.id.display_name(), ctx.request_id(), failure);
        }

        AgentResponse {
            text,
            confidence,
            agent: self.id,
            tool_calls_made,
            execution_time_ms: started.elapsed().as_millis() as u64,
            terminal: failure.is_none(),
            failure,
            iterations,
        }
    }

    /// One oracle consultation, mapped to the next state
    async fn consult(
        &self,
        ctx: &ExecutionContext,
        successful_tools: usize,
        last_text: &mut Option<String>,
    ) -> LoopState {
        let request = OracleRequest::specialist(
            self.id.description(),
            ctx.query().as_str(),
            self.tools.clone(),
            ctx.transcript().to_vec(),
        );

        let reply = self
            .oracle
            .consult(request)
            .await
            .and_then(|value| parse_specialist_reply(&value));

        match reply {
            Ok(SpecialistReply::FinalAnswer { text, confidence }) => {
                let default = if successful_tools > 0 {
                    TOOL_BACKED_CONFIDENCE
                } else {
                    REASONING_ONLY_CONFIDENCE
                };
                LoopState::Done {
                    text,
                    confidence: confidence.unwrap_or(default),
                }
            }
            Ok(SpecialistReply::ToolCall { call, text }) => {
                if text.is_some() {
                    *last_text = text;
                }
                LoopState::ToolPending(call)
            }
            Err(err) => {
                log::warn!("{} oracle error: {}", self.id.display_name(), err);
                LoopState::Failed(SpecialistFailure::Oracle { error: err.kind() })
            }
        }
    }

    /// Validate against this specialist's tools, then execute
    fn run_tool(&self, call: &ToolCall) -> ToolResult {
        match validate_call(call, &self.tools) {
            Ok(_) => self.registry.run(call),
            Err(err) => ToolResult::failure(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Query;
    use crate::oracle::{MockOracle, OracleError};
    use crate::tools::ToolErrorKind;
    use serde_json::json;

    fn specialist(id: AgentId, oracle: MockOracle) -> (Specialist<MockOracle>, Arc<MockOracle>) {
        let oracle = Arc::new(oracle);
        let registry = Arc::new(ToolRegistry::standard().unwrap());
        let specialist = Specialist::new(id, registry, oracle.clone(), SpecialistConfig::default()).unwrap();
        (specialist, oracle)
    }

    fn ctx(query: &str) -> ExecutionContext {
        ExecutionContext::new(Query::new(query).unwrap())
    }

    #[test]
    fn test_specialist_tool_subsets() {
        let (math, _) = specialist(AgentId::Math, MockOracle::scripted(vec![]));
        let names: Vec<_> = math.tools().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["calculator", "equation_solver", "formula_lookup"]);

        let (physics, _) = specialist(AgentId::Physics, MockOracle::scripted(vec![]));
        let names: Vec<_> = physics.tools().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["calculator", "formula_lookup"]);
    }

    #[tokio::test]
    async fn test_direct_answer_is_reasoning_only() {
        let (math, oracle) = specialist(
            AgentId::Math,
            MockOracle::scripted(vec![Ok(json!({"finalAnswer": "4"}))]),
        );
        let mut ctx = ctx("What is 2 + 2?");
        let response = math.handle(&mut ctx).await;

        assert!(response.terminal);
        assert_eq!(response.text, "4");
        assert_eq!(response.confidence, REASONING_ONLY_CONFIDENCE);
        assert_eq!(response.iterations, 1);
        assert!(response.tool_calls_made.is_empty());
        assert_eq!(oracle.calls(), 1);
    }

    #[tokio::test]
    async fn test_tool_then_answer_is_tool_backed() {
        let (math, _) = specialist(
            AgentId::Math,
            MockOracle::scripted(vec![
                Ok(json!({"toolCall": {"name": "equation_solver", "arguments": {"equation": "2x + 5 = 15"}}})),
                Ok(json!({"finalAnswer": "x = 5"})),
            ]),
        );
        let mut ctx = ctx("Solve 2x + 5 = 15");
        let response = math.handle(&mut ctx).await;

        assert!(response.terminal);
        assert_eq!(response.text, "x = 5");
        assert_eq!(response.confidence, TOOL_BACKED_CONFIDENCE);
        assert_eq!(response.tool_calls_made.len(), 1);
        assert_eq!(ctx.transcript().len(), 1);
        assert_eq!(ctx.transcript()[0].result.value().unwrap()["roots"], json!([5.0]));
    }

    #[tokio::test]
    async fn test_oracle_confidence_wins() {
        let (math, _) = specialist(
            AgentId::Math,
            MockOracle::scripted(vec![Ok(json!({"finalAnswer": "4", "confidence": 0.93}))]),
        );
        let response = math.handle(&mut ctx("2+2")).await;
        assert_eq!(response.confidence, 0.93);
    }

    #[tokio::test]
    async fn test_tool_error_is_fed_back() {
        let (math, oracle) = specialist(
            AgentId::Math,
            MockOracle::new(|req| {
                if req.transcript.is_empty() {
                    Ok(json!({"toolCall": {"name": "equation_solver", "arguments": {"equation": "2x + = 15"}}}))
                } else {
                    let raw = req.transcript[0].result.raw_text().to_string();
                    Ok(json!({"finalAnswer": format!("The equation is malformed: {}", raw)}))
                }
            }),
        );
        let mut ctx = ctx("Solve 2x + = 15");
        let response = math.handle(&mut ctx).await;

        assert!(response.terminal);
        assert_eq!(ctx.transcript()[0].result.error_kind(), Some(ToolErrorKind::ParseError));
        assert_eq!(response.confidence, REASONING_ONLY_CONFIDENCE);
        assert_eq!(oracle.calls(), 2);
    }

    #[tokio::test]
    async fn test_unpermitted_tool_is_schema_mismatch() {
        let (physics, _) = specialist(
            AgentId::Physics,
            MockOracle::scripted(vec![
                Ok(json!({"toolCall": {"name": "equation_solver", "arguments": {"equation": "x = 1"}}})),
                Ok(json!({"finalAnswer": "done"})),
            ]),
        );
        let mut ctx = ctx("q");
        let response = physics.handle(&mut ctx).await;

        assert!(response.terminal);
        assert_eq!(ctx.transcript()[0].result.error_kind(), Some(ToolErrorKind::SchemaMismatch));
    }

    #[tokio::test]
    async fn test_iteration_cap() {
        let (math, oracle) = specialist(
            AgentId::Math,
            MockOracle::new(|_| {
                Ok(json!({
                    "toolCall": {"name": "calculator", "arguments": {"expression": "1 + 1"}},
                    "text": "Still checking the arithmetic"
                }))
            }),
        );
        let mut ctx = ctx("loop forever");
        let response = math.handle(&mut ctx).await;

        assert!(!response.terminal);
        assert_eq!(response.confidence, 0.0);
        assert_eq!(response.failure, Some(SpecialistFailure::ToolLoopExceeded { iterations: 5 }));
        assert_eq!(response.text, "Still checking the arithmetic");
        assert_eq!(oracle.calls(), 5);
        assert_eq!(ctx.transcript().len(), 5);
    }

    #[tokio::test]
    async fn test_custom_iteration_cap() {
        let oracle = Arc::new(MockOracle::new(|_| {
            Ok(json!({"toolCall": {"name": "calculator", "arguments": {"expression": "1"}}}))
        }));
        let registry = Arc::new(ToolRegistry::standard().unwrap());
        let math = Specialist::new(AgentId::Math, registry, oracle.clone(), SpecialistConfig { max_iterations: 2 })
            .unwrap();

        let response = math.handle(&mut ctx("q")).await;
        assert_eq!(response.iterations, 2);
        assert_eq!(oracle.calls(), 2);
        assert_eq!(response.text, "");
    }

    #[tokio::test]
    async fn test_oracle_error_fails_without_retry() {
        let (math, oracle) = specialist(
            AgentId::Math,
            MockOracle::scripted(vec![Err(OracleError::Timeout { timeout_ms: 100 })]),
        );
        let response = math.handle(&mut ctx("q")).await;

        assert!(!response.terminal);
        assert_eq!(response.confidence, 0.0);
        assert_eq!(
            response.failure,
            Some(SpecialistFailure::Oracle {
                error: OracleErrorKind::Timeout
            })
        );
        assert_eq!(oracle.calls(), 1);
    }

    #[tokio::test]
    async fn test_malformed_reply_fails() {
        let (math, _) = specialist(AgentId::Math, MockOracle::scripted(vec![Ok(json!({"answer": "4"}))]));
        let response = math.handle(&mut ctx("q")).await;
        assert_eq!(
            response.failure,
            Some(SpecialistFailure::Oracle {
                error: OracleErrorKind::Malformed
            })
        );
    }

    #[test]
    fn test_loop_state_names() {
        assert_eq!(LoopState::AwaitingOracle.name(), "awaiting_oracle");
        assert!(LoopState::Failed(SpecialistFailure::ToolLoopExceeded { iterations: 1 }).is_terminal());
        assert!(!LoopState::ToolPending(ToolCall::new("calculator", json!({}))).is_terminal());
    }

    #[test]
    fn test_agent_response_serialization() {
        let response = AgentResponse {
            text: "4".to_string(),
            confidence: 0.7,
            agent: AgentId::Math,
            tool_calls_made: Vec::new(),
            execution_time_ms: 3,
            terminal: true,
            failure: None,
            iterations: 1,
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["agent"], "math");
        assert_eq!(value["executionTimeMs"], 3);
        assert!(value.get("failure").is_none());
    }
}
