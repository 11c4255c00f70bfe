//! The fixed set of specialists, built once at startup

use std::sync::Arc;

use super::{AgentId, Specialist, SpecialistConfig};
use crate::oracle::{Capability, Oracle};
use crate::tools::{RegistryError, ToolRegistry};

/// One specialist per [`AgentId`], sharing a registry and an oracle
pub struct AgentRoster<O: Oracle> {
    specialists: Vec<Specialist<O>>,
}

impl<O: Oracle> AgentRoster<O> {
    pub fn standard(
        registry: Arc<ToolRegistry>,
        oracle: Arc<O>,
        config: SpecialistConfig,
    ) -> Result<Self, RegistryError> {
        let specialists = AgentId::all()
            .iter()
            .map(|id| Specialist::new(*id, registry.clone(), oracle.clone(), config.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { specialists })
    }

    pub fn get(&self, id: AgentId) -> Option<&Specialist<O>> {
        self.specialists.iter().find(|s| s.id() == id)
    }

    pub fn ids(&self) -> Vec<AgentId> {
        self.specialists.iter().map(|s| s.id()).collect()
    }

    /// Capability summary handed to the routing oracle
    pub fn capabilities(&self) -> Vec<Capability> {
        self.specialists
            .iter()
            .map(|s| Capability {
                agent: s.id().to_string(),
                description: s.description().to_string(),
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Specialist<O>> {
        self.specialists.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::MockOracle;

    fn roster() -> AgentRoster<MockOracle> {
        AgentRoster::standard(
            Arc::new(ToolRegistry::standard().unwrap()),
            Arc::new(MockOracle::scripted(vec![])),
            SpecialistConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_roster_has_every_agent() {
        let roster = roster();
        assert_eq!(roster.ids(), vec![AgentId::Math, AgentId::Physics]);
        assert!(roster.get(AgentId::Physics).is_some());
    }

    #[test]
    fn test_capabilities() {
        let caps = roster().capabilities();
        assert_eq!(caps.len(), 2);
        assert_eq!(caps[0].agent, "math");
        assert!(caps[1].description.contains("Physics"));
    }

    #[test]
    fn test_roster_requires_tools() {
        let empty = ToolRegistry::from_tools(Vec::new()).unwrap();
        let result = AgentRoster::standard(
            Arc::new(empty),
            Arc::new(MockOracle::scripted(vec![])),
            SpecialistConfig::default(),
        );
        assert!(matches!(result, Err(RegistryError::UnknownTool { .. })));
    }
}
