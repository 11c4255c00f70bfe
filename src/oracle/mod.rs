//! Oracle layer - the external reasoning service behind routing and specialists
//!
//! This module provides:
//! - Request and error types
//! - Oracle trait for API abstraction, plus a scripted mock
//! - AnthropicOracle implementation
//! - Strict parsing of specialist replies

pub mod anthropic;
pub mod client;
pub mod reply;
pub mod types;

pub use anthropic::{AnthropicConfig, AnthropicOracle};
pub use client::{MockOracle, Oracle};
pub use reply::{SpecialistReply, parse_specialist_reply};
pub use types::{Capability, OracleError, OracleErrorKind, OracleRequest, OracleRole};
