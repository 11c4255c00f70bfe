//! Tool system for specialist agents
//!
//! Tools are pure, deterministic computations the oracle may ask a specialist
//! to run. Each tool declares a typed [`ToolSchema`]; the [`ToolRegistry`]
//! holds the fixed set built at startup and validates calls against it.

mod calculator;
mod equation_solver;
mod expr;
mod formula_lookup;
mod registry;
mod validate;

pub use calculator::{CalculatorTool, evaluate};
pub use equation_solver::{EquationSolverTool, Root, Solution, solve_equation};
pub use formula_lookup::{Domain, FormulaEntry, FormulaLookupTool, FormulaMatch, formulas, lookup_formula};
pub use registry::{RegistryError, ToolRegistry};
pub use validate::{find_schema, validate_arguments, validate_call};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// A tool the oracle can call through a specialist
pub trait Tool: Send + Sync {
    /// Tool name (matches the oracle's toolCall name)
    fn name(&self) -> &'static str;

    /// Human-readable description
    fn description(&self) -> &'static str;

    /// Ordered parameter list
    fn parameters(&self) -> Vec<ParamSpec>;

    /// Run the tool on already-validated arguments
    fn execute(&self, arguments: &Map<String, Value>) -> Result<Value, ToolExecutionError>;

    /// Schema advertised to the oracle
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}

/// JSON type of a tool parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Integer,
    Boolean,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
        }
    }

    /// Check whether a JSON value has this type
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => match value {
                Value::Number(n) => n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0),
                _ => false,
            },
            Self::Boolean => value.is_boolean(),
        }
    }
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declared parameter of a tool
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    pub required: bool,
    pub description: String,
}

impl ParamSpec {
    pub fn required(name: impl Into<String>, param_type: ParamType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type,
            required: true,
            description: description.into(),
        }
    }

    pub fn optional(name: impl Into<String>, param_type: ParamType, description: impl Into<String>) -> Self {
        Self {
            required: false,
            ..Self::required(name, param_type, description)
        }
    }
}

/// Immutable declaration of a tool: name, description, ordered parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParamSpec>,
}

impl ToolSchema {
    /// Look up a parameter by name
    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Names of required parameters, in declaration order
    pub fn required_params(&self) -> impl Iterator<Item = &ParamSpec> {
        self.parameters.iter().filter(|p| p.required)
    }

    /// Render as a JSON Schema object (the shape most LLM tool APIs expect)
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for param in &self.parameters {
            properties.insert(
                param.name.clone(),
                serde_json::json!({
                    "type": param.param_type.as_str(),
                    "description": param.description,
                }),
            );
        }
        let required: Vec<&str> = self.required_params().map(|p| p.name.as_str()).collect();

        serde_json::json!({
            "name": self.name,
            "description": self.description,
            "input_schema": {
                "type": "object",
                "properties": properties,
                "required": required,
            }
        })
    }
}

/// A tool invocation requested by the oracle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    #[serde(default = "empty_arguments")]
    pub arguments: Value,
}

fn empty_arguments() -> Value {
    Value::Object(Map::new())
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// Why the calculator rejected an expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EvalFailure {
    DivisionByZero,
    InvalidSyntax,
    NonFinite,
}

impl std::fmt::Display for EvalFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DivisionByZero => f.write_str("division by zero"),
            Self::InvalidSyntax => f.write_str("invalid syntax"),
            Self::NonFinite => f.write_str("non-finite result"),
        }
    }
}

/// Errors a tool call can produce; all are fed back to the oracle
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind")]
pub enum ToolExecutionError {
    #[error("parse error: {message}")]
    ParseError { message: String },

    #[error("evaluation error ({reason}): {message}")]
    EvalError { reason: EvalFailure, message: String },

    #[error("not found: {message}")]
    NotFound { message: String },

    #[error("unsupported degree: {message}")]
    UnsupportedDegree { degree: Option<u32>, message: String },

    #[error("schema mismatch: {message}")]
    SchemaMismatch { message: String },
}

impl ToolExecutionError {
    pub fn parse(message: impl Into<String>) -> Self {
        Self::ParseError { message: message.into() }
    }

    pub fn eval(reason: EvalFailure, message: impl Into<String>) -> Self {
        Self::EvalError {
            reason,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound { message: message.into() }
    }

    pub fn schema(message: impl Into<String>) -> Self {
        Self::SchemaMismatch { message: message.into() }
    }

    pub fn kind(&self) -> ToolErrorKind {
        match self {
            Self::ParseError { .. } => ToolErrorKind::ParseError,
            Self::EvalError { .. } => ToolErrorKind::EvalError,
            Self::NotFound { .. } => ToolErrorKind::NotFound,
            Self::UnsupportedDegree { .. } => ToolErrorKind::UnsupportedDegree,
            Self::SchemaMismatch { .. } => ToolErrorKind::SchemaMismatch,
        }
    }
}

/// Discriminant of [`ToolExecutionError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ToolErrorKind {
    ParseError,
    EvalError,
    NotFound,
    UnsupportedDegree,
    SchemaMismatch,
}

/// Outcome of executing a [`ToolCall`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum ToolResult {
    Ok { value: Value, raw_text: String },
    Err { error: ToolExecutionError, raw_text: String },
}

impl ToolResult {
    pub fn success(value: Value) -> Self {
        let raw_text = value.to_string();
        Self::Ok { value, raw_text }
    }

    pub fn failure(error: ToolExecutionError) -> Self {
        let raw_text = error.to_string();
        Self::Err { error, raw_text }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    pub fn raw_text(&self) -> &str {
        match self {
            Self::Ok { raw_text, .. } | Self::Err { raw_text, .. } => raw_text,
        }
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Ok { value, .. } => Some(value),
            Self::Err { .. } => None,
        }
    }

    pub fn error_kind(&self) -> Option<ToolErrorKind> {
        match self {
            Self::Ok { .. } => None,
            Self::Err { error, .. } => Some(error.kind()),
        }
    }
}
