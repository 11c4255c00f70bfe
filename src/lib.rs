//! Tutorlane - a routed math and physics tutor
//!
//! A router oracle picks a specialist for each question; the specialist
//! answers by consulting its own oracle and calling deterministic tools
//! (equation solver, calculator, formula lookup) until it can give a final
//! answer. Every request ends in a [`FinalAnswer`], degraded on failure.

pub mod agents;
pub mod aggregator;
pub mod context;
pub mod error;
pub mod id;
pub mod oracle;
pub mod router;
pub mod tools;
pub mod tutor;

pub use agents::{AgentId, AgentResponse, SpecialistConfig};
pub use aggregator::{DegradeReason, FinalAnswer};
pub use context::{ExecutionContext, Query};
pub use error::{Result, TutorError};
pub use oracle::{AnthropicConfig, AnthropicOracle, MockOracle, Oracle};
pub use router::{RoutingDecision, RoutingFallback};
pub use tools::{ToolCall, ToolRegistry, ToolResult};
pub use tutor::{Tutor, TutorConfig};
