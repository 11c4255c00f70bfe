//! Tool registry - the fixed set of tools built at startup

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use super::{
    CalculatorTool, EquationSolverTool, FormulaLookupTool, Tool, ToolCall, ToolExecutionError, ToolResult, ToolSchema,
    validate_arguments,
};

/// Problems detected while building a registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("duplicate tool name: {name}")]
    DuplicateTool { name: String },

    #[error("tool '{tool}' declares parameter '{param}' twice")]
    DuplicateParameter { tool: String, param: String },

    #[error("tool or parameter with an empty name")]
    EmptyName,

    #[error("unknown tool: {name}")]
    UnknownTool { name: String },
}

/// Immutable, name-keyed set of tools with their schemas
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
    /// Schemas in registration order
    schemas: Vec<ToolSchema>,
}

impl ToolRegistry {
    /// Registry with the calculator, equation solver and formula lookup
    pub fn standard() -> Result<Self, RegistryError> {
        Self::from_tools(vec![
            Box::new(CalculatorTool),
            Box::new(EquationSolverTool),
            Box::new(FormulaLookupTool),
        ])
    }

    /// Build a registry, rejecting empty or duplicate names
    pub fn from_tools(tools: Vec<Box<dyn Tool>>) -> Result<Self, RegistryError> {
        let mut by_name: HashMap<String, Box<dyn Tool>> = HashMap::with_capacity(tools.len());
        let mut schemas = Vec::with_capacity(tools.len());

        for tool in tools {
            let schema = tool.schema();
            if schema.name.is_empty() {
                return Err(RegistryError::EmptyName);
            }
            if by_name.contains_key(&schema.name) {
                return Err(RegistryError::DuplicateTool { name: schema.name });
            }

            let mut seen = HashSet::new();
            for param in &schema.parameters {
                if param.name.is_empty() {
                    return Err(RegistryError::EmptyName);
                }
                if !seen.insert(param.name.as_str()) {
                    return Err(RegistryError::DuplicateParameter {
                        tool: schema.name.clone(),
                        param: param.name.clone(),
                    });
                }
            }

            log::debug!("ToolRegistry: registered '{}' ({} params)", schema.name, schema.parameters.len());
            by_name.insert(schema.name.clone(), tool);
            schemas.push(schema);
        }

        Ok(Self { tools: by_name, schemas })
    }

    /// All schemas, in registration order
    pub fn schemas(&self) -> &[ToolSchema] {
        &self.schemas
    }

    pub fn schema(&self, name: &str) -> Option<&ToolSchema> {
        self.schemas.iter().find(|s| s.name == name)
    }

    /// Schemas for the named tools, in the order given
    pub fn schemas_for(&self, names: &[&str]) -> Result<Vec<ToolSchema>, RegistryError> {
        names
            .iter()
            .map(|name| {
                self.schema(name)
                    .cloned()
                    .ok_or_else(|| RegistryError::UnknownTool { name: name.to_string() })
            })
            .collect()
    }

    /// Validate and execute a tool call
    pub fn execute(&self, call: &ToolCall) -> ToolResult {
        let Some(schema) = self.schema(&call.name) else {
            return ToolResult::failure(ToolExecutionError::schema(format!("unknown tool '{}'", call.name)));
        };
        if let Err(err) = validate_arguments(call, schema) {
            return ToolResult::failure(err);
        }
        self.run(call)
    }

    /// Execute a call whose arguments were already validated
    pub(crate) fn run(&self, call: &ToolCall) -> ToolResult {
        let Some(tool) = self.tools.get(&call.name) else {
            return ToolResult::failure(ToolExecutionError::schema(format!("unknown tool '{}'", call.name)));
        };
        let Some(arguments) = call.arguments.as_object() else {
            return ToolResult::failure(ToolExecutionError::schema("arguments must be a JSON object"));
        };

        match tool.execute(arguments) {
            Ok(value) => ToolResult::success(value),
            Err(err) => ToolResult::failure(err),
        }
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Tool names, in registration order
    pub fn tool_names(&self) -> Vec<&str> {
        self.schemas.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry").field("tools", &self.tool_names()).finish()
    }
}
