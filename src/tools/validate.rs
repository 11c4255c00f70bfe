//! Argument validation for tool calls
//!
//! Checks an oracle-produced [`ToolCall`] against the schema it names before
//! anything runs. A mismatch never reaches the tool itself.

use super::{ToolCall, ToolExecutionError, ToolSchema};

/// Find a schema by tool name
pub fn find_schema<'a>(name: &str, schemas: &'a [ToolSchema]) -> Option<&'a ToolSchema> {
    schemas.iter().find(|s| s.name == name)
}

/// Validate a call against the set of schemas the caller is permitted to use
pub fn validate_call<'a>(call: &ToolCall, schemas: &'a [ToolSchema]) -> Result<&'a ToolSchema, ToolExecutionError> {
    let schema = find_schema(&call.name, schemas)
        .ok_or_else(|| ToolExecutionError::schema(format!("unknown or unavailable tool '{}'", call.name)))?;
    validate_arguments(call, schema)?;
    Ok(schema)
}

/// Check required fields, unexpected fields and value types
pub fn validate_arguments(call: &ToolCall, schema: &ToolSchema) -> Result<(), ToolExecutionError> {
    let arguments = call.arguments.as_object().ok_or_else(|| {
        ToolExecutionError::schema(format!("arguments for '{}' must be a JSON object", call.name))
    })?;

    for param in schema.required_params() {
        match arguments.get(&param.name) {
            None | Some(serde_json::Value::Null) => {
                return Err(ToolExecutionError::schema(format!(
                    "tool '{}' missing required field: {}",
                    call.name, param.name
                )));
            }
            Some(_) => {}
        }
    }

    for (key, value) in arguments {
        let param = schema.param(key).ok_or_else(|| {
            ToolExecutionError::schema(format!("tool '{}' has no parameter named '{}'", call.name, key))
        })?;

        if value.is_null() && !param.required {
            continue;
        }

        if !param.param_type.accepts(value) {
            return Err(ToolExecutionError::schema(format!(
                "tool '{}' field '{}' expects {}, got {}",
                call.name,
                key,
                param.param_type,
                json_type_name(value)
            )));
        }
    }

    Ok(())
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
