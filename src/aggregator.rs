//! Response aggregation
//!
//! Turns a routing decision and specialist output into the caller-facing
//! [`FinalAnswer`], and builds degraded answers for every failure path.
//! Internal error text never reaches `FinalAnswer::text`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::agents::{AgentId, AgentResponse, SpecialistFailure};
use crate::context::ExecutionContext;
use crate::router::RoutingDecision;

pub const REJECT_MESSAGE: &str =
    "I can only help with math and physics questions. Please ask something in one of those subjects.";

pub const FAILURE_MESSAGE: &str =
    "Sorry, I wasn't able to finish answering this question. Please try again or rephrase it.";

pub const TIMEOUT_MESSAGE: &str = "Sorry, answering this question took too long. Please try again.";

pub const EMPTY_QUERY_MESSAGE: &str = "Please enter a question.";

/// Why an answer is degraded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradeReason {
    EmptyQuery,
    Routing,
    Specialist,
    Timeout,
}

/// The answer returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalAnswer {
    pub request_id: String,
    pub text: String,
    pub selected_agent: Option<AgentId>,
    /// Overall confidence; equals the specialist confidence
    pub confidence: f64,
    pub routing_confidence: f64,
    pub specialist_confidence: f64,
    pub latency_ms: u64,
    pub routing_ms: u64,
    pub specialist_ms: u64,
    pub tools_used: Vec<String>,
    pub degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degrade_reason: Option<DegradeReason>,
    pub answered_at: DateTime<Utc>,
}

fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

/// Distinct tool names, first use first
fn tools_used(response: &AgentResponse) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for call in &response.tool_calls_made {
        if !names.contains(&call.name) {
            names.push(call.name.clone());
        }
    }
    names
}

fn base(ctx: &ExecutionContext, text: String) -> FinalAnswer {
    FinalAnswer {
        request_id: ctx.request_id().to_string(),
        text,
        selected_agent: None,
        confidence: 0.0,
        routing_confidence: 0.0,
        specialist_confidence: 0.0,
        latency_ms: ctx.elapsed_ms(),
        routing_ms: ctx.routing_ms(),
        specialist_ms: 0,
        tools_used: Vec::new(),
        degraded: false,
        degrade_reason: None,
        answered_at: Utc::now(),
    }
}

/// Merge routing metadata with the specialist's response
pub fn aggregate(ctx: &ExecutionContext, decision: &RoutingDecision, response: Option<AgentResponse>) -> FinalAnswer {
    let routing_confidence = clamp_confidence(decision.confidence());

    let Some(target) = decision.target() else {
        return FinalAnswer {
            routing_confidence,
            ..base(ctx, REJECT_MESSAGE.to_string())
        };
    };

    let Some(response) = response else {
        log::error!("request {}: delegated to {} but no specialist response", ctx.request_id(), target);
        return FinalAnswer {
            selected_agent: Some(target),
            routing_confidence,
            degraded: true,
            degrade_reason: Some(DegradeReason::Specialist),
            ..base(ctx, FAILURE_MESSAGE.to_string())
        };
    };

    let tools = tools_used(&response);
    let latency_ms = ctx.elapsed_ms().max(ctx.routing_ms() + response.execution_time_ms);

    match response.failure {
        Some(failure) => {
            let mut text = FAILURE_MESSAGE.to_string();
            if let SpecialistFailure::ToolLoopExceeded { .. } = failure {
                let partial = response.text.trim();
                if !partial.is_empty() {
                    text.push_str("\n\n");
                    text.push_str(partial);
                }
            }
            FinalAnswer {
                selected_agent: Some(response.agent),
                routing_confidence,
                latency_ms,
                specialist_ms: response.execution_time_ms,
                tools_used: tools,
                degraded: true,
                degrade_reason: Some(DegradeReason::Specialist),
                ..base(ctx, text)
            }
        }
        None => {
            let confidence = clamp_confidence(response.confidence);
            FinalAnswer {
                selected_agent: Some(response.agent),
                confidence,
                routing_confidence,
                specialist_confidence: confidence,
                latency_ms,
                specialist_ms: response.execution_time_ms,
                tools_used: tools,
                ..base(ctx, response.text)
            }
        }
    }
}

/// Degraded answer for a request that never reached a specialist
pub fn degraded(ctx: &ExecutionContext, reason: DegradeReason) -> FinalAnswer {
    let text = match reason {
        DegradeReason::EmptyQuery => EMPTY_QUERY_MESSAGE,
        DegradeReason::Timeout => TIMEOUT_MESSAGE,
        DegradeReason::Routing | DegradeReason::Specialist => FAILURE_MESSAGE,
    };
    FinalAnswer {
        degraded: true,
        degrade_reason: Some(reason),
        ..base(ctx, text.to_string())
    }
}

/// Degraded answer for blank input, which has no execution context
pub fn empty_query(request_id: impl Into<String>) -> FinalAnswer {
    FinalAnswer {
        request_id: request_id.into(),
        text: EMPTY_QUERY_MESSAGE.to_string(),
        selected_agent: None,
        confidence: 0.0,
        routing_confidence: 0.0,
        specialist_confidence: 0.0,
        latency_ms: 0,
        routing_ms: 0,
        specialist_ms: 0,
        tools_used: Vec::new(),
        degraded: true,
        degrade_reason: Some(DegradeReason::EmptyQuery),
        answered_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Query;
    use crate::oracle::OracleErrorKind;
    use crate::tools::ToolCall;
    use serde_json::json;

    fn ctx() -> ExecutionContext {
        let mut ctx = ExecutionContext::with_request_id("req-test", Query::new("Solve 2x + 5 = 15").unwrap());
        ctx.set_routing_ms(12);
        ctx
    }

    fn delegate(confidence: f64) -> RoutingDecision {
        RoutingDecision::Delegate {
            target: AgentId::Math,
            reasoning: "algebra".to_string(),
            confidence,
        }
    }

    fn response(confidence: f64, failure: Option<SpecialistFailure>) -> AgentResponse {
        AgentResponse {
            text: "x = 5".to_string(),
            confidence,
            agent: AgentId::Math,
            tool_calls_made: vec![
                ToolCall::new("equation_solver", json!({"equation": "2x + 5 = 15"})),
                ToolCall::new("calculator", json!({"expression": "2*5+5"})),
                ToolCall::new("equation_solver", json!({"equation": "2x = 10"})),
            ],
            execution_time_ms: 30,
            terminal: failure.is_none(),
            failure,
            iterations: 4,
        }
    }

    #[test]
    fn test_aggregate_success() {
        let answer = aggregate(&ctx(), &delegate(0.9), Some(response(0.85, None)));

        assert_eq!(answer.request_id, "req-test");
        assert_eq!(answer.text, "x = 5");
        assert_eq!(answer.selected_agent, Some(AgentId::Math));
        assert_eq!(answer.confidence, 0.85);
        assert_eq!(answer.specialist_confidence, 0.85);
        assert_eq!(answer.routing_confidence, 0.9);
        assert_eq!(answer.routing_ms, 12);
        assert_eq!(answer.specialist_ms, 30);
        assert!(answer.latency_ms >= 42);
        assert_eq!(answer.tools_used, vec!["equation_solver", "calculator"]);
        assert!(!answer.degraded);
    }

    #[test]
    fn test_aggregate_clamps_confidence() {
        let answer = aggregate(&ctx(), &delegate(0.9), Some(response(f64::NAN, None)));
        assert_eq!(answer.confidence, 0.0);

        let answer = aggregate(&ctx(), &delegate(0.9), Some(response(3.0, None)));
        assert_eq!(answer.confidence, 1.0);
    }

    #[test]
    fn test_aggregate_reject() {
        let decision = RoutingDecision::Reject {
            reasoning: "history question".to_string(),
            confidence: 0.8,
        };
        let answer = aggregate(&ctx(), &decision, None);

        assert_eq!(answer.text, REJECT_MESSAGE);
        assert_eq!(answer.selected_agent, None);
        assert_eq!(answer.confidence, 0.0);
        assert_eq!(answer.routing_confidence, 0.8);
        assert!(!answer.degraded);
    }

    #[test]
    fn test_aggregate_loop_exceeded_appends_partial() {
        let failure = SpecialistFailure::ToolLoopExceeded { iterations: 5 };
        let answer = aggregate(&ctx(), &delegate(0.9), Some(response(0.0, Some(failure))));

        assert!(answer.degraded);
        assert_eq!(answer.confidence, 0.0);
        assert!(answer.text.starts_with(FAILURE_MESSAGE));
        assert!(answer.text.ends_with("x = 5"));
        assert_eq!(answer.degrade_reason, Some(DegradeReason::Specialist));
    }

    #[test]
    fn test_aggregate_oracle_failure_hides_details() {
        let failure = SpecialistFailure::Oracle {
            error: OracleErrorKind::Api,
        };
        let answer = aggregate(&ctx(), &delegate(0.9), Some(response(0.0, Some(failure))));

        assert_eq!(answer.text, FAILURE_MESSAGE);
        assert_eq!(answer.confidence, 0.0);
        assert!(answer.degraded);
    }

    #[test]
    fn test_degraded_messages() {
        assert_eq!(degraded(&ctx(), DegradeReason::Timeout).text, TIMEOUT_MESSAGE);
        assert_eq!(degraded(&ctx(), DegradeReason::Routing).text, FAILURE_MESSAGE);
        let answer = degraded(&ctx(), DegradeReason::Routing);
        assert!(answer.degraded);
        assert_eq!(answer.confidence, 0.0);
        assert_eq!(answer.selected_agent, None);
    }

    #[test]
    fn test_empty_query() {
        let answer = empty_query("req-1");
        assert_eq!(answer.text, EMPTY_QUERY_MESSAGE);
        assert_eq!(answer.degrade_reason, Some(DegradeReason::EmptyQuery));
    }

    #[test]
    fn test_serialization_camel_case() {
        let answer = aggregate(&ctx(), &delegate(0.9), Some(response(0.85, None)));
        let value = serde_json::to_value(&answer).unwrap();
        assert_eq!(value["selectedAgent"], "math");
        assert_eq!(value["routingConfidence"], 0.9);
        assert!(value["toolsUsed"].is_array());
        assert!(value.get("degradeReason").is_none());
        assert!(value["answeredAt"].is_string());
    }
}
