//! Router - picks the specialist for a query
//!
//! One oracle consultation per query, parsed strictly into a tagged
//! [`RoutingDecision`]. Anything that does not fit is a [`RoutingError`];
//! callers decide what to do about it through an explicit [`RoutingFallback`].

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::agents::{AgentId, DEFAULT_AFFINITY_FLOOR, best_match};
use crate::context::Query;
use crate::oracle::{Capability, Oracle, OracleError, OracleRequest};

/// Where a query goes
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum RoutingDecision {
    Delegate {
        target: AgentId,
        reasoning: String,
        confidence: f64,
    },
    Reject {
        reasoning: String,
        confidence: f64,
    },
}

/// Discriminant of [`RoutingDecision`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingAction {
    Delegate,
    Reject,
}

impl RoutingAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoutingAction::Delegate => "delegate",
            RoutingAction::Reject => "reject",
        }
    }
}

impl RoutingDecision {
    pub fn action(&self) -> RoutingAction {
        match self {
            RoutingDecision::Delegate { .. } => RoutingAction::Delegate,
            RoutingDecision::Reject { .. } => RoutingAction::Reject,
        }
    }

    pub fn target(&self) -> Option<AgentId> {
        match self {
            RoutingDecision::Delegate { target, .. } => Some(*target),
            RoutingDecision::Reject { .. } => None,
        }
    }

    pub fn reasoning(&self) -> &str {
        match self {
            RoutingDecision::Delegate { reasoning, .. } | RoutingDecision::Reject { reasoning, .. } => reasoning,
        }
    }

    pub fn confidence(&self) -> f64 {
        match self {
            RoutingDecision::Delegate { confidence, .. } | RoutingDecision::Reject { confidence, .. } => *confidence,
        }
    }
}

/// Routing output that could not be turned into a decision
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RoutingError {
    #[error("oracle failure during routing: {0}")]
    Oracle(#[from] OracleError),

    #[error("unparseable routing decision: {0}")]
    Unparseable(String),

    #[error("unknown routing action: {0}")]
    UnknownAction(String),

    #[error("delegate decision has no target")]
    MissingTarget,

    #[error("unknown routing target: {0}")]
    UnknownTarget(String),

    #[error("reject decision names a target: {0}")]
    UnexpectedTarget(String),

    #[error("routing confidence out of range: {0}")]
    ConfidenceOutOfRange(f64),
}

/// What to do when routing fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoutingFallback {
    /// Degrade the request
    #[default]
    Reject,
    /// Use the keyword-affinity classifier; degrade if nothing scores
    Keywords,
    /// Always send to this specialist
    Default(AgentId),
}

impl RoutingFallback {
    /// Decision to use after a routing error, or `None` to degrade
    pub fn resolve(&self, query: &Query) -> Option<RoutingDecision> {
        match self {
            RoutingFallback::Reject => None,
            RoutingFallback::Default(target) => Some(RoutingDecision::Delegate {
                target: *target,
                reasoning: "routing failed; using the configured default specialist".to_string(),
                confidence: 0.0,
            }),
            RoutingFallback::Keywords => {
                best_match(query.as_str(), DEFAULT_AFFINITY_FLOOR).map(|(target, score)| {
                    RoutingDecision::Delegate {
                        target,
                        reasoning: "routing failed; selected by keyword affinity".to_string(),
                        confidence: score,
                    }
                })
            }
        }
    }
}

impl std::fmt::Display for RoutingFallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoutingFallback::Reject => f.write_str("reject"),
            RoutingFallback::Keywords => f.write_str("keywords"),
            RoutingFallback::Default(id) => write!(f, "default:{}", id),
        }
    }
}

/// Strictly parse `{action, target, reasoning, confidence}`
pub fn parse_routing_decision(value: &Value, registered: &[AgentId]) -> Result<RoutingDecision, RoutingError> {
    let obj = value
        .as_object()
        .ok_or_else(|| RoutingError::Unparseable("routing reply is not a JSON object".to_string()))?;

    let action = obj
        .get("action")
        .and_then(Value::as_str)
        .ok_or_else(|| RoutingError::Unparseable("missing string field 'action'".to_string()))?;

    let target = match obj.get("target") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(Value::String(s)) => Some(s.trim()),
        Some(other) => {
            return Err(RoutingError::Unparseable(format!("'target' must be a string or null, got {}", other)));
        }
    };

    let confidence = obj
        .get("confidence")
        .and_then(Value::as_f64)
        .ok_or_else(|| RoutingError::Unparseable("missing numeric field 'confidence'".to_string()))?;
    if !(0.0..=1.0).contains(&confidence) {
        return Err(RoutingError::ConfidenceOutOfRange(confidence));
    }

    let reasoning = obj.get("reasoning").and_then(Value::as_str).unwrap_or("").to_string();

    match action.trim() {
        "delegate" => {
            let name = target.ok_or(RoutingError::MissingTarget)?;
            let id: AgentId = name
                .parse()
                .map_err(|_| RoutingError::UnknownTarget(name.to_string()))?;
            if !registered.contains(&id) {
                return Err(RoutingError::UnknownTarget(name.to_string()));
            }
            Ok(RoutingDecision::Delegate {
                target: id,
                reasoning,
                confidence,
            })
        }
        "reject" => match target {
            Some(name) => Err(RoutingError::UnexpectedTarget(name.to_string())),
            None => Ok(RoutingDecision::Reject { reasoning, confidence }),
        },
        other => Err(RoutingError::UnknownAction(other.to_string())),
    }
}

/// Consults the oracle once per query to choose a specialist
pub struct Router<O: Oracle> {
    oracle: Arc<O>,
    agents: Vec<AgentId>,
    capabilities: Vec<Capability>,
}

impl<O: Oracle> Router<O> {
    pub fn new(oracle: Arc<O>, capabilities: Vec<Capability>) -> Self {
        let agents = capabilities
            .iter()
            .filter_map(|c| c.agent.parse::<AgentId>().ok())
            .collect();
        Self {
            oracle,
            agents,
            capabilities,
        }
    }

    /// Agents this router may delegate to
    pub fn agents(&self) -> &[AgentId] {
        &self.agents
    }

    /// Route a query. No retries.
    pub async fn route(&self, query: &Query) -> Result<RoutingDecision, RoutingError> {
        let request = OracleRequest::routing(query.as_str(), self.capabilities.clone());
        let reply = self.oracle.consult(request).await?;
        let decision = parse_routing_decision(&reply, &self.agents)?;

        tracing::info!(
            query = %query,
            action = decision.action().as_str(),
            target = ?decision.target(),
            reasoning = %decision.reasoning(),
            confidence = decision.confidence(),
            "routing decision"
        );

        Ok(decision)
    }
}
