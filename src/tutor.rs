//! Request pipeline: query → router → specialist → aggregator
//!
//! Every path ends in a [`FinalAnswer`]. Requests share only the immutable
//! registry, roster and oracle handle; each one gets its own
//! [`ExecutionContext`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;

use crate::agents::{AgentId, AgentRoster, SpecialistConfig};
use crate::aggregator::{DegradeReason, FinalAnswer, aggregate, degraded, empty_query};
use crate::context::{ExecutionContext, Query};
use crate::error::Result;
use crate::id::generate_request_id;
use crate::oracle::Oracle;
use crate::router::{Router, RoutingDecision, RoutingFallback};
use crate::tools::ToolRegistry;

/// Pipeline configuration
#[derive(Debug, Clone, Default)]
pub struct TutorConfig {
    pub specialist: SpecialistConfig,
    pub fallback: RoutingFallback,
    /// Upper bound on a whole request; `None` waits for the oracle indefinitely
    pub request_timeout: Option<Duration>,
}

/// Routes questions to specialists and assembles the answers
pub struct Tutor<O: Oracle> {
    router: Router<O>,
    roster: AgentRoster<O>,
    registry: Arc<ToolRegistry>,
    config: TutorConfig,
}

impl<O: Oracle> Tutor<O> {
    pub fn new(oracle: Arc<O>, registry: Arc<ToolRegistry>, config: TutorConfig) -> Result<Self> {
        let roster = AgentRoster::standard(registry.clone(), oracle.clone(), config.specialist.clone())?;
        let router = Router::new(oracle, roster.capabilities());
        log::debug!(
            "Tutor ready: agents={:?} tools={:?} fallback={}",
            roster.ids(),
            registry.tool_names(),
            config.fallback
        );
        Ok(Self {
            router,
            roster,
            registry,
            config,
        })
    }

    pub fn roster(&self) -> &AgentRoster<O> {
        &self.roster
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn config(&self) -> &TutorConfig {
        &self.config
    }

    /// Route and answer a question
    pub async fn ask(&self, query: &str) -> FinalAnswer {
        self.execute(query, None).await
    }

    /// Answer with a chosen specialist, bypassing the router
    pub async fn ask_direct(&self, query: &str, agent: AgentId) -> FinalAnswer {
        self.execute(query, Some(agent)).await
    }

    /// Answer several independent questions concurrently, in input order
    pub async fn ask_all(&self, queries: &[String]) -> Vec<FinalAnswer> {
        join_all(queries.iter().map(|q| self.ask(q))).await
    }

    /// Routing decision only; no specialist runs
    pub async fn routing_info(&self, query: &str) -> Result<RoutingDecision> {
        let query = Query::new(query)?;
        Ok(self.router.route(&query).await?)
    }

    async fn execute(&self, query: &str, direct: Option<AgentId>) -> FinalAnswer {
        let query = match Query::new(query) {
            Ok(query) => query,
            Err(e) => {
                log::warn!("Rejected request: {}", e);
                return empty_query(generate_request_id());
            }
        };

        let mut ctx = ExecutionContext::new(query);
        log::info!("Request {}: {:?}", ctx.request_id(), ctx.query().as_str());

        let answer = match self.config.request_timeout {
            Some(limit) => {
                let outcome = tokio::time::timeout(limit, self.pipeline(&mut ctx, direct)).await;
                match outcome {
                    Ok(answer) => answer,
                    Err(_) => {
                        log::warn!("Request {} timed out after {:?}", ctx.request_id(), limit);
                        degraded(&ctx, DegradeReason::Timeout)
                    }
                }
            }
            None => self.pipeline(&mut ctx, direct).await,
        };

        tracing::info!(
            request_id = %answer.request_id,
            agent = ?answer.selected_agent,
            confidence = answer.confidence,
            latency_ms = answer.latency_ms,
            degraded = answer.degraded,
            "request complete"
        );
        answer
    }

    async fn pipeline(&self, ctx: &mut ExecutionContext, direct: Option<AgentId>) -> FinalAnswer {
        let decision = match direct {
            Some(target) => RoutingDecision::Delegate {
                target,
                reasoning: "direct dispatch".to_string(),
                confidence: 1.0,
            },
            None => match self.route(ctx).await {
                Some(decision) => decision,
                None => return degraded(ctx, DegradeReason::Routing),
            },
        };

        let response = match decision.target() {
            Some(target) => match self.roster.get(target) {
                Some(specialist) => Some(specialist.handle(ctx).await),
                None => None,
            },
            None => None,
        };

        aggregate(ctx, &decision, response)
    }

    /// Consult the router, applying the fallback policy on error
    async fn route(&self, ctx: &mut ExecutionContext) -> Option<RoutingDecision> {
        let started = Instant::now();
        let routed = self.router.route(ctx.query()).await;
        ctx.set_routing_ms(started.elapsed().as_millis() as u64);

        match routed {
            Ok(decision) => Some(decision),
            Err(err) => {
                let fallback = self.config.fallback.resolve(ctx.query());
                match &fallback {
                    Some(decision) => log::warn!(
                        "Request {}: routing failed ({}); fallback '{}' chose {:?}",
                        ctx.request_id(),
                        err,
                        self.config.fallback,
                        decision.target()
                    ),
                    None => log::warn!(
                        "Request {}: routing failed ({}); fallback '{}' degrades the request",
                        ctx.request_id(),
                        err,
                        self.config.fallback
                    ),
                }
                fallback
            }
        }
    }
}
