//! Parsing of specialist oracle replies

use serde_json::Value;

use super::types::OracleError;
use crate::tools::ToolCall;

/// What the oracle asked the specialist to do next
#[derive(Debug, Clone, PartialEq)]
pub enum SpecialistReply {
    /// Done; `confidence` is already clamped into [0, 1] when present
    FinalAnswer { text: String, confidence: Option<f64> },
    /// Run a tool, optionally with interim narration
    ToolCall { call: ToolCall, text: Option<String> },
}

/// Strictly parse `{finalAnswer, confidence?}` or `{toolCall, text?}`
pub fn parse_specialist_reply(value: &Value) -> Result<SpecialistReply, OracleError> {
    let obj = value
        .as_object()
        .ok_or_else(|| OracleError::Malformed("specialist reply is not a JSON object".to_string()))?;

    match (obj.get("finalAnswer"), obj.get("toolCall")) {
        (Some(_), Some(_)) => Err(OracleError::Malformed(
            "specialist reply has both finalAnswer and toolCall".to_string(),
        )),
        (None, None) => Err(OracleError::Malformed(
            "specialist reply has neither finalAnswer nor toolCall".to_string(),
        )),
        (Some(answer), None) => {
            let text = answer
                .as_str()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .ok_or_else(|| OracleError::Malformed("finalAnswer must be a non-empty string".to_string()))?;
            let confidence = obj
                .get("confidence")
                .and_then(Value::as_f64)
                .filter(|c| c.is_finite())
                .map(|c| c.clamp(0.0, 1.0));
            Ok(SpecialistReply::FinalAnswer {
                text: text.to_string(),
                confidence,
            })
        }
        (None, Some(call)) => {
            let call: ToolCall = serde_json::from_value(call.clone())
                .map_err(|e| OracleError::Malformed(format!("invalid toolCall: {}", e)))?;
            if call.name.trim().is_empty() {
                return Err(OracleError::Malformed("toolCall has an empty name".to_string()));
            }
            let text = obj
                .get("text")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string);
            Ok(SpecialistReply::ToolCall { call, text })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_final_answer() {
        let reply = parse_specialist_reply(&json!({"finalAnswer": "x = 5", "confidence": 0.92})).unwrap();
        assert_eq!(
            reply,
            SpecialistReply::FinalAnswer {
                text: "x = 5".to_string(),
                confidence: Some(0.92)
            }
        );
    }

    #[test]
    fn test_parse_final_answer_clamps_confidence() {
        let reply = parse_specialist_reply(&json!({"finalAnswer": "done", "confidence": 1.7})).unwrap();
        assert!(matches!(reply, SpecialistReply::FinalAnswer { confidence: Some(c), .. } if c == 1.0));

        let reply = parse_specialist_reply(&json!({"finalAnswer": "done", "confidence": "high"})).unwrap();
        assert!(matches!(reply, SpecialistReply::FinalAnswer { confidence: None, .. }));
    }

    #[test]
    fn test_parse_tool_call() {
        let reply = parse_specialist_reply(&json!({
            "toolCall": {"name": "calculator", "arguments": {"expression": "2+2"}},
            "text": "Let me compute that."
        }))
        .unwrap();

        match reply {
            SpecialistReply::ToolCall { call, text } => {
                assert_eq!(call.name, "calculator");
                assert_eq!(call.arguments["expression"], "2+2");
                assert_eq!(text.as_deref(), Some("Let me compute that."));
            }
            other => panic!("expected ToolCall, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_tool_call_without_arguments() {
        let reply = parse_specialist_reply(&json!({"toolCall": {"name": "calculator"}})).unwrap();
        assert!(matches!(reply, SpecialistReply::ToolCall { call, text: None } if call.arguments == json!({})));
    }

    #[test]
    fn test_parse_rejects_ambiguous_or_empty() {
        assert!(parse_specialist_reply(&json!({"finalAnswer": "a", "toolCall": {"name": "b"}})).is_err());
        assert!(parse_specialist_reply(&json!({"answer": "a"})).is_err());
        assert!(parse_specialist_reply(&json!({"finalAnswer": "   "})).is_err());
        assert!(parse_specialist_reply(&json!({"finalAnswer": 4})).is_err());
        assert!(parse_specialist_reply(&json!({"toolCall": {"name": ""}})).is_err());
        assert!(parse_specialist_reply(&json!({"toolCall": "calculator"})).is_err());
        assert!(parse_specialist_reply(&json!("just text")).is_err());
    }
}
