//! Type conversions between the Bedrock Converse API and the analysis loop
//!
//! Transcript turns become Converse messages, tool schemas become a
//! `ToolConfiguration`, and Converse output becomes an
//! [`InferenceResponse`].

use aws_sdk_bedrockruntime::types as bedrock;
use aws_smithy_types::Document;
use aws_smithy_types::error::display::DisplayErrorContext;
use aws_smithy_types::error::metadata::ProvideErrorMetadata;
use costpilot_application::{InferenceError, InferenceResponse};
use costpilot_domain::{FinishReason, ToolCallRequest, Turn};

/// Error codes that mean "try again later".
const RETRYABLE_CODES: &[&str] = &[
    "ThrottlingException",
    "ServiceUnavailableException",
    "ModelNotReadyException",
    "TooManyRequestsException",
];

// ─── Bedrock → Loop ──────────────────────────────────────────────

/// Convert Bedrock stop reason to a loop finish reason.
pub fn convert_stop_reason(reason: &bedrock::StopReason) -> FinishReason {
    match reason {
        bedrock::StopReason::EndTurn | bedrock::StopReason::StopSequence => FinishReason::Stop,
        bedrock::StopReason::ToolUse => FinishReason::ToolCalls,
        other => FinishReason::Other(other.as_str().to_string()),
    }
}

/// Convert a Converse output into the loop's response.
///
/// Text blocks are concatenated; tool-use blocks become calls in order.
/// Other block kinds are skipped.
pub fn convert_converse_output(
    output: &bedrock::ConverseOutput,
    stop_reason: &bedrock::StopReason,
) -> Result<InferenceResponse, InferenceError> {
    let bedrock::ConverseOutput::Message(message) = output else {
        return Err(InferenceError::InvalidResponse(
            "Converse output is not a message".to_string(),
        ));
    };

    let mut text = String::new();
    let mut tool_calls = Vec::new();
    for block in message.content() {
        match block {
            bedrock::ContentBlock::Text(t) => text.push_str(t),
            bedrock::ContentBlock::ToolUse(tool_use) => {
                let arguments = match document_to_json(tool_use.input()) {
                    serde_json::Value::Object(map) => map,
                    _ => serde_json::Map::new(),
                };
                tool_calls.push(ToolCallRequest {
                    id: tool_use.tool_use_id().to_string(),
                    tool_name: tool_use.name().to_string(),
                    arguments,
                });
            }
            _ => {}
        }
    }

    Ok(InferenceResponse {
        finish_reason: convert_stop_reason(stop_reason),
        content: text,
        tool_calls,
    })
}

// ─── Loop → Bedrock ──────────────────────────────────────────────

fn build_failed(what: &str, err: impl std::fmt::Display) -> InferenceError {
    InferenceError::RequestFailed(format!("Failed to build {}: {}", what, err))
}

/// Content blocks for one turn, with its Converse role.
fn turn_blocks(
    turn: &Turn,
) -> Result<(bedrock::ConversationRole, Vec<bedrock::ContentBlock>), InferenceError> {
    match turn {
        Turn::User { text } => Ok((
            bedrock::ConversationRole::User,
            text_block(text).into_iter().collect(),
        )),
        Turn::Assistant { text, tool_calls } => {
            let mut blocks: Vec<bedrock::ContentBlock> = text_block(text).into_iter().collect();
            for call in tool_calls {
                let input = json_to_document(&serde_json::Value::Object(call.arguments.clone()));
                let tool_use = bedrock::ToolUseBlock::builder()
                    .tool_use_id(&call.id)
                    .name(&call.tool_name)
                    .input(input)
                    .build()
                    .map_err(|e| build_failed("tool use block", e))?;
                blocks.push(bedrock::ContentBlock::ToolUse(tool_use));
            }
            Ok((bedrock::ConversationRole::Assistant, blocks))
        }
        Turn::ToolResult { call_id, payload } => {
            Ok((bedrock::ConversationRole::User, vec![convert_tool_result(call_id, payload)?]))
        }
    }
}

/// Converse rejects blank text blocks.
fn text_block(text: &str) -> Option<bedrock::ContentBlock> {
    (!text.trim().is_empty()).then(|| bedrock::ContentBlock::Text(text.to_string()))
}

/// Convert a transcript into Converse messages.
///
/// Adjacent turns with the same role are merged into one message, so all
/// results answering one assistant turn travel together in a single user
/// message. Turns with no content are dropped.
pub fn convert_transcript(turns: &[Turn]) -> Result<Vec<bedrock::Message>, InferenceError> {
    let mut grouped: Vec<(bedrock::ConversationRole, Vec<bedrock::ContentBlock>)> = Vec::new();

    for turn in turns {
        let (role, blocks) = turn_blocks(turn)?;
        if blocks.is_empty() {
            continue;
        }
        match grouped.last_mut() {
            Some((last_role, last_blocks)) if *last_role == role => last_blocks.extend(blocks),
            _ => grouped.push((role, blocks)),
        }
    }

    grouped
        .into_iter()
        .map(|(role, content)| {
            bedrock::Message::builder()
                .role(role)
                .set_content(Some(content))
                .build()
                .map_err(|e| build_failed("message", e))
        })
        .collect()
}

/// Convert a tool result payload to a `ToolResult` block.
///
/// Payloads with `"status": "error"` are flagged as errors so the model
/// sees the failure as such.
pub fn convert_tool_result(
    call_id: &str,
    payload: &serde_json::Value,
) -> Result<bedrock::ContentBlock, InferenceError> {
    let status = if payload.get("status").and_then(|s| s.as_str()) == Some("error") {
        bedrock::ToolResultStatus::Error
    } else {
        bedrock::ToolResultStatus::Success
    };

    let content = match payload {
        serde_json::Value::Object(_) => bedrock::ToolResultContentBlock::Json(json_to_document(payload)),
        other => bedrock::ToolResultContentBlock::Text(other.to_string()),
    };

    let block = bedrock::ToolResultBlock::builder()
        .tool_use_id(call_id)
        .status(status)
        .content(content)
        .build()
        .map_err(|e| build_failed("tool result block", e))?;
    Ok(bedrock::ContentBlock::ToolResult(block))
}

/// Convert a JSON tool schema (from ToolSchemaPort) to a Bedrock Tool::ToolSpec.
pub fn convert_tool_schema(schema: &serde_json::Value) -> Option<bedrock::Tool> {
    let name = schema.get("name")?.as_str()?;
    let description = schema.get("description").and_then(|d| d.as_str());

    let input_schema_json = schema.get("input_schema").cloned().unwrap_or_else(|| {
        serde_json::json!({
            "type": "object",
            "properties": {},
        })
    });
    let input_schema = json_to_document(&input_schema_json);

    let mut builder = bedrock::ToolSpecification::builder()
        .name(name)
        .input_schema(bedrock::ToolInputSchema::Json(input_schema));
    if let Some(desc) = description {
        builder = builder.description(desc);
    }

    builder.build().ok().map(bedrock::Tool::ToolSpec)
}

/// Tool configuration for a request, or `None` when no tool converts.
pub fn convert_tool_config(
    schemas: &[serde_json::Value],
) -> Result<Option<bedrock::ToolConfiguration>, InferenceError> {
    let tools: Vec<bedrock::Tool> = schemas.iter().filter_map(convert_tool_schema).collect();
    if tools.is_empty() {
        return Ok(None);
    }
    bedrock::ToolConfiguration::builder()
        .set_tools(Some(tools))
        .build()
        .map(Some)
        .map_err(|e| build_failed("tool config", e))
}

// ─── JSON ↔ Document helpers ─────────────────────────────────────

/// Convert a serde_json::Value to an aws_smithy_types::Document.
pub fn json_to_document(value: &serde_json::Value) -> Document {
    match value {
        serde_json::Value::Null => Document::Null,
        serde_json::Value::Bool(b) => Document::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                Document::Number(aws_smithy_types::Number::PosInt(u))
            } else if let Some(i) = n.as_i64() {
                Document::Number(aws_smithy_types::Number::NegInt(i))
            } else if let Some(f) = n.as_f64() {
                Document::Number(aws_smithy_types::Number::Float(f))
            } else {
                Document::Null
            }
        }
        serde_json::Value::String(s) => Document::String(s.clone()),
        serde_json::Value::Array(arr) => {
            Document::Array(arr.iter().map(json_to_document).collect())
        }
        serde_json::Value::Object(map) => Document::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), json_to_document(v)))
                .collect(),
        ),
    }
}

/// Convert an aws_smithy_types::Document to a serde_json::Value.
pub fn document_to_json(doc: &Document) -> serde_json::Value {
    match doc {
        Document::Null => serde_json::Value::Null,
        Document::Bool(b) => serde_json::Value::Bool(*b),
        Document::Number(n) => match n {
            aws_smithy_types::Number::PosInt(i) => serde_json::json!(*i),
            aws_smithy_types::Number::NegInt(i) => serde_json::json!(*i),
            aws_smithy_types::Number::Float(f) => serde_json::Value::Number(
                serde_json::Number::from_f64(*f).unwrap_or_else(|| serde_json::Number::from(0)),
            ),
        },
        Document::String(s) => serde_json::Value::String(s.clone()),
        Document::Array(arr) => {
            serde_json::Value::Array(arr.iter().map(document_to_json).collect())
        }
        Document::Object(map) => serde_json::Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), document_to_json(v)))
                .collect(),
        ),
    }
}

// ─── Errors ──────────────────────────────────────────────────────

/// Classify a Converse error by its AWS error code.
pub fn classify_error_code(code: &str, message: &str) -> InferenceError {
    if RETRYABLE_CODES.contains(&code) {
        InferenceError::Throttled(format!("{}: {}", code, message))
    } else if code == "AccessDeniedException" {
        InferenceError::AccessDenied(message.to_string())
    } else if code == "ModelTimeoutException" {
        InferenceError::Timeout
    } else {
        InferenceError::RequestFailed(format!("{}: {}", code, message))
    }
}

/// Convert a Bedrock SDK error to an InferenceError.
pub fn convert_converse_error(
    err: &aws_sdk_bedrockruntime::error::SdkError<
        aws_sdk_bedrockruntime::operation::converse::ConverseError,
    >,
) -> InferenceError {
    use aws_sdk_bedrockruntime::error::SdkError;

    match err.code() {
        Some(code) => classify_error_code(code, err.message().unwrap_or("no message")),
        None => match err {
            SdkError::TimeoutError(_) => InferenceError::Timeout,
            other => InferenceError::RequestFailed(format!(
                "Bedrock SDK error: {}",
                DisplayErrorContext(other)
            )),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn roles(messages: &[bedrock::Message]) -> Vec<bedrock::ConversationRole> {
        messages.iter().map(|m| m.role().clone()).collect()
    }

    #[test]
    fn test_convert_stop_reason_end_turn() {
        assert_eq!(
            convert_stop_reason(&bedrock::StopReason::EndTurn),
            FinishReason::Stop
        );
        assert_eq!(
            convert_stop_reason(&bedrock::StopReason::StopSequence),
            FinishReason::Stop
        );
    }

    #[test]
    fn test_convert_stop_reason_tool_use() {
        assert_eq!(
            convert_stop_reason(&bedrock::StopReason::ToolUse),
            FinishReason::ToolCalls
        );
    }

    #[test]
    fn test_convert_stop_reason_max_tokens() {
        assert_eq!(
            convert_stop_reason(&bedrock::StopReason::MaxTokens),
            FinishReason::Other("max_tokens".to_string())
        );
    }

    #[test]
    fn test_convert_output_with_tool_use() {
        let tool_use = bedrock::ToolUseBlock::builder()
            .tool_use_id("tooluse_1")
            .name("get_ec2_instances")
            .input(json_to_document(&json!({"region": "eu-west-1"})))
            .build()
            .unwrap();
        let message = bedrock::Message::builder()
            .role(bedrock::ConversationRole::Assistant)
            .content(bedrock::ContentBlock::Text("Checking compute.".to_string()))
            .content(bedrock::ContentBlock::ToolUse(tool_use))
            .build()
            .unwrap();

        let response = convert_converse_output(
            &bedrock::ConverseOutput::Message(message),
            &bedrock::StopReason::ToolUse,
        )
        .unwrap();

        assert_eq!(response.finish_reason, FinishReason::ToolCalls);
        assert_eq!(response.content, "Checking compute.");
        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.tool_calls[0].id, "tooluse_1");
        assert_eq!(response.tool_calls[0].get_string("region"), Some("eu-west-1"));
    }

    #[test]
    fn test_results_for_one_turn_share_a_message() {
        let turns = vec![
            Turn::User {
                text: "What costs the most?".into(),
            },
            Turn::Assistant {
                text: String::new(),
                tool_calls: vec![
                    ToolCallRequest::new("a", "get_s3_buckets"),
                    ToolCallRequest::new("b", "get_cost_by_service"),
                ],
            },
            Turn::ToolResult {
                call_id: "a".into(),
                payload: json!({"status": "success", "data": []}),
            },
            Turn::ToolResult {
                call_id: "b".into(),
                payload: json!({"status": "error", "error_code": "AccessDenied"}),
            },
            Turn::Assistant {
                text: "EC2 dominates.".into(),
                tool_calls: vec![],
            },
        ];

        let messages = convert_transcript(&turns).unwrap();
        assert_eq!(
            roles(&messages),
            vec![
                bedrock::ConversationRole::User,
                bedrock::ConversationRole::Assistant,
                bedrock::ConversationRole::User,
                bedrock::ConversationRole::Assistant,
            ]
        );
        // Blank assistant text is not sent
        assert_eq!(messages[1].content().len(), 2);
        assert_eq!(messages[2].content().len(), 2);

        let bedrock::ContentBlock::ToolResult(second) = &messages[2].content()[1] else {
            panic!("expected tool result");
        };
        assert_eq!(second.tool_use_id(), "b");
        assert_eq!(second.status(), Some(&bedrock::ToolResultStatus::Error));
    }

    #[test]
    fn test_convert_tool_result_success() {
        let block = convert_tool_result("tool_123", &json!({"status": "success", "data": {}})).unwrap();
        let bedrock::ContentBlock::ToolResult(result) = block else {
            panic!("expected tool result");
        };
        assert_eq!(result.status(), Some(&bedrock::ToolResultStatus::Success));
        assert!(matches!(
            result.content()[0],
            bedrock::ToolResultContentBlock::Json(_)
        ));
    }

    #[test]
    fn test_json_document_roundtrip() {
        let original = json!({
            "name": "test",
            "count": 42,
            "delta": -3,
            "ratio": 0.5,
            "nested": { "flag": true },
            "items": [1, 2, 3]
        });
        let doc = json_to_document(&original);
        let back = document_to_json(&doc);
        assert_eq!(original, back);
    }

    #[test]
    fn test_convert_tool_schema() {
        let schema = json!({
            "name": "get_ec2_instances",
            "description": "List instances",
            "input_schema": {
                "type": "object",
                "properties": {
                    "region": { "type": "string", "description": "AWS region" }
                },
                "required": []
            }
        });
        assert!(convert_tool_schema(&schema).is_some());
        assert!(convert_tool_config(&[schema]).unwrap().is_some());
    }

    #[test]
    fn test_convert_tool_schema_missing_name() {
        let schema = json!({ "description": "No name" });
        assert!(convert_tool_schema(&schema).is_none());
        assert!(convert_tool_config(&[schema]).unwrap().is_none());
    }

    #[test]
    fn test_error_codes_classify() {
        assert!(matches!(
            classify_error_code("ThrottlingException", "slow down"),
            InferenceError::Throttled(_)
        ));
        assert!(matches!(
            classify_error_code("ServiceUnavailableException", "busy"),
            InferenceError::Throttled(_)
        ));
        assert_eq!(
            classify_error_code("AccessDeniedException", "no model access"),
            InferenceError::AccessDenied("no model access".into())
        );
        assert_eq!(
            classify_error_code("ModelTimeoutException", "slow"),
            InferenceError::Timeout
        );
        assert!(matches!(
            classify_error_code("ValidationException", "bad"),
            InferenceError::RequestFailed(_)
        ));
    }
}
