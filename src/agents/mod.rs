//! Subject specialists
//!
//! The set of specialists is fixed at compile time. Each one owns an ordered
//! subset of the tool registry and runs the oracle/tool loop in
//! [`specialist`].

pub mod keywords;
pub mod roster;
pub mod specialist;

pub use keywords::{DEFAULT_AFFINITY_FLOOR, affinity_scores, best_match};
pub use roster::AgentRoster;
pub use specialist::{
    AgentResponse, LoopState, REASONING_ONLY_CONFIDENCE, Specialist, SpecialistConfig, SpecialistFailure,
    TOOL_BACKED_CONFIDENCE,
};

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TutorError;

/// Identifies a specialist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentId {
    Math,
    Physics,
}

impl AgentId {
    /// Every specialist, in presentation order
    pub fn all() -> &'static [AgentId] {
        &[AgentId::Math, AgentId::Physics]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentId::Math => "math",
            AgentId::Physics => "physics",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AgentId::Math => "Math Specialist",
            AgentId::Physics => "Physics Specialist",
        }
    }

    /// Domain description shown to the oracle
    pub fn description(&self) -> &'static str {
        match self {
            AgentId::Math => {
                "Mathematics: arithmetic, algebra, linear and quadratic equations, geometry formulas, \
                 and step-by-step numeric calculation."
            }
            AgentId::Physics => {
                "Physics: mechanics, energy, forces, motion, electricity and waves, including unit-bearing \
                 numeric problems and standard physics formulas."
            }
        }
    }

    /// Tools this specialist may call, in the order offered to the oracle
    pub fn tool_names(&self) -> &'static [&'static str] {
        match self {
            AgentId::Math => &["calculator", "equation_solver", "formula_lookup"],
            AgentId::Physics => &["calculator", "formula_lookup"],
        }
    }
}

impl FromStr for AgentId {
    type Err = TutorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "math" => Ok(AgentId::Math),
            "physics" => Ok(AgentId::Physics),
            other => Err(TutorError::UnknownAgent(other.to_string())),
        }
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
