//! Arithmetic evaluation

use serde_json::{Map, Value, json};

use super::expr::{self, Algebra, ExprError};
use super::{EvalFailure, ParamSpec, ParamType, Tool, ToolExecutionError};

impl Algebra for f64 {
    const IMPLICIT_MULTIPLICATION: bool = false;

    fn number(value: f64) -> Result<Self, ExprError> {
        Ok(value)
    }

    fn variable(name: char) -> Result<Self, ExprError> {
        Err(ExprError::Syntax(format!("unexpected identifier '{}'", name)))
    }

    fn add(self, rhs: Self) -> Result<Self, ExprError> {
        Ok(self + rhs)
    }

    fn sub(self, rhs: Self) -> Result<Self, ExprError> {
        Ok(self - rhs)
    }

    fn mul(self, rhs: Self) -> Result<Self, ExprError> {
        Ok(self * rhs)
    }

    fn div(self, rhs: Self) -> Result<Self, ExprError> {
        if rhs == 0.0 {
            return Err(ToolExecutionError::eval(EvalFailure::DivisionByZero, format!("{} / 0", self)).into());
        }
        Ok(self / rhs)
    }

    fn pow(self, rhs: Self) -> Result<Self, ExprError> {
        Ok(self.powf(rhs))
    }

    fn neg(self) -> Self {
        -self
    }
}

/// Evaluate an arithmetic expression (`+ - * / ^`, parentheses, unary minus)
pub fn evaluate(expression: &str) -> Result<f64, ToolExecutionError> {
    let value = expr::parse::<f64>(expression).map_err(|err| match err {
        ExprError::Syntax(message) => ToolExecutionError::eval(EvalFailure::InvalidSyntax, message),
        ExprError::Tool(err) => err,
    })?;

    if !value.is_finite() {
        return Err(ToolExecutionError::eval(
            EvalFailure::NonFinite,
            format!("'{}' does not evaluate to a finite number", expression.trim()),
        ));
    }

    Ok(value)
}

/// Tool wrapper around [`evaluate`]
#[derive(Debug, Default)]
pub struct CalculatorTool;

impl Tool for CalculatorTool {
    fn name(&self) -> &'static str {
        "calculator"
    }

    fn description(&self) -> &'static str {
        "Evaluate an arithmetic expression with + - * / ^ and parentheses. Returns the numeric result."
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::required(
            "expression",
            ParamType::String,
            "Arithmetic expression, e.g. \"0.5 * 2 * 3^2\"",
        )]
    }

    fn execute(&self, arguments: &Map<String, Value>) -> Result<Value, ToolExecutionError> {
        let expression = arguments
            .get("expression")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolExecutionError::schema("missing required field: expression"))?;

        let result = evaluate(expression)?;
        Ok(json!({
            "expression": expression,
            "result": result,
        }))
    }
}
