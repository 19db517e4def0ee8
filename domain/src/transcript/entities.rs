//! Transcript entities

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A tool invocation requested by the inference service.
///
/// The `id` is assigned by the service and must be echoed back unchanged in
/// the matching [`Turn::ToolResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub id: String,
    pub tool_name: String,
    #[serde(default)]
    pub arguments: serde_json::Map<String, serde_json::Value>,
}

impl ToolCallRequest {
    pub fn new(id: impl Into<String>, tool_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tool_name: tool_name.into(),
            arguments: serde_json::Map::new(),
        }
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    /// Get a string argument
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(|v| v.as_str())
    }
}

/// One message unit in the transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Turn {
    User {
        text: String,
    },
    Assistant {
        text: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCallRequest>,
    },
    ToolResult {
        call_id: String,
        payload: serde_json::Value,
    },
}

impl Turn {
    pub fn is_tool_result(&self) -> bool {
        matches!(self, Turn::ToolResult { .. })
    }
}

/// Append-only conversation record owned by a single run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a transcript with a single user turn.
    pub fn seeded(text: impl Into<String>) -> Self {
        let mut transcript = Self::new();
        transcript.turns.push(Turn::User { text: text.into() });
        transcript
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Append an assistant turn.
    ///
    /// Fails while the previous assistant turn still has unanswered calls.
    pub fn push_assistant(
        &mut self,
        text: impl Into<String>,
        tool_calls: Vec<ToolCallRequest>,
    ) -> Result<(), DomainError> {
        let pending = self.pending_call_ids();
        if !pending.is_empty() {
            return Err(DomainError::PendingToolCalls(pending));
        }
        self.turns.push(Turn::Assistant {
            text: text.into(),
            tool_calls,
        });
        Ok(())
    }

    /// Append the result of a pending tool call.
    pub fn push_tool_result(
        &mut self,
        call_id: impl Into<String>,
        payload: serde_json::Value,
    ) -> Result<(), DomainError> {
        let call_id = call_id.into();
        let Some(index) = self.last_assistant_index() else {
            return Err(DomainError::UnexpectedToolResult(call_id));
        };

        let requested = match &self.turns[index] {
            Turn::Assistant { tool_calls, .. } => tool_calls.iter().any(|c| c.id == call_id),
            _ => false,
        };
        if !requested {
            return Err(DomainError::UnexpectedToolResult(call_id));
        }

        let answered = self.turns[index + 1..]
            .iter()
            .any(|t| matches!(t, Turn::ToolResult { call_id: id, .. } if *id == call_id));
        if answered {
            return Err(DomainError::DuplicateToolResult(call_id));
        }

        self.turns.push(Turn::ToolResult { call_id, payload });
        Ok(())
    }

    /// Ids requested by the latest assistant turn that have no result yet,
    /// in request order.
    pub fn pending_call_ids(&self) -> Vec<String> {
        let Some(index) = self.last_assistant_index() else {
            return Vec::new();
        };
        let Turn::Assistant { tool_calls, .. } = &self.turns[index] else {
            return Vec::new();
        };

        let answered: HashSet<&str> = self.turns[index + 1..]
            .iter()
            .filter_map(|t| match t {
                Turn::ToolResult { call_id, .. } => Some(call_id.as_str()),
                _ => None,
            })
            .collect();

        let mut seen = HashSet::new();
        tool_calls
            .iter()
            .filter(|c| !answered.contains(c.id.as_str()) && seen.insert(c.id.as_str()))
            .map(|c| c.id.clone())
            .collect()
    }

    /// Text of the most recent assistant turn with non-empty content.
    pub fn last_assistant_text(&self) -> Option<&str> {
        self.turns.iter().rev().find_map(|t| match t {
            Turn::Assistant { text, .. } if !text.trim().is_empty() => Some(text.as_str()),
            _ => None,
        })
    }

    /// Number of assistant turns.
    pub fn assistant_turns(&self) -> usize {
        self.turns
            .iter()
            .filter(|t| matches!(t, Turn::Assistant { .. }))
            .count()
    }

    /// Number of tool-result turns.
    pub fn tool_result_turns(&self) -> usize {
        self.turns.iter().filter(|t| t.is_tool_result()).count()
    }

    fn last_assistant_index(&self) -> Option<usize> {
        self.turns
            .iter()
            .rposition(|t| matches!(t, Turn::Assistant { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn two_calls() -> Vec<ToolCallRequest> {
        vec![
            ToolCallRequest::new("call_a", "get_ec2_instances"),
            ToolCallRequest::new("call_b", "get_s3_buckets"),
        ]
    }

    #[test]
    fn seeded_transcript_has_one_user_turn() {
        let transcript = Transcript::seeded("hello");
        assert_eq!(transcript.len(), 1);
        assert!(matches!(&transcript.turns()[0], Turn::User { text } if text == "hello"));
    }

    #[test]
    fn pending_ids_follow_request_order() {
        let mut transcript = Transcript::seeded("q");
        transcript.push_assistant("", two_calls()).unwrap();
        assert_eq!(transcript.pending_call_ids(), vec!["call_a", "call_b"]);

        transcript.push_tool_result("call_a", json!({"status": "success"})).unwrap();
        assert_eq!(transcript.pending_call_ids(), vec!["call_b"]);
    }

    #[test]
    fn assistant_turn_blocked_while_calls_pending() {
        let mut transcript = Transcript::seeded("q");
        transcript.push_assistant("", two_calls()).unwrap();
        transcript.push_tool_result("call_a", json!(null)).unwrap();

        let err = transcript.push_assistant("done", vec![]).unwrap_err();
        assert_eq!(err, DomainError::PendingToolCalls(vec!["call_b".to_string()]));

        transcript.push_tool_result("call_b", json!(null)).unwrap();
        assert!(transcript.push_assistant("done", vec![]).is_ok());
    }

    #[test]
    fn duplicate_result_rejected() {
        let mut transcript = Transcript::seeded("q");
        transcript.push_assistant("", two_calls()).unwrap();
        transcript.push_tool_result("call_a", json!(1)).unwrap();

        let err = transcript.push_tool_result("call_a", json!(2)).unwrap_err();
        assert_eq!(err, DomainError::DuplicateToolResult("call_a".to_string()));
        assert_eq!(transcript.tool_result_turns(), 1);
    }

    #[test]
    fn unknown_call_id_rejected() {
        let mut transcript = Transcript::seeded("q");
        assert!(transcript.push_tool_result("call_a", json!(1)).is_err());

        transcript.push_assistant("", two_calls()).unwrap();
        let err = transcript.push_tool_result("call_z", json!(1)).unwrap_err();
        assert_eq!(err, DomainError::UnexpectedToolResult("call_z".to_string()));
    }

    #[test]
    fn repeated_id_in_one_turn_is_pending_once() {
        let mut transcript = Transcript::seeded("q");
        let calls = vec![
            ToolCallRequest::new("dup", "get_s3_buckets"),
            ToolCallRequest::new("dup", "get_s3_buckets"),
        ];
        transcript.push_assistant("", calls).unwrap();
        assert_eq!(transcript.pending_call_ids(), vec!["dup"]);
    }

    #[test]
    fn last_assistant_text_skips_empty_turns() {
        let mut transcript = Transcript::seeded("q");
        transcript.push_assistant("Looking at EC2 first.", two_calls()).unwrap();
        transcript.push_tool_result("call_a", json!(1)).unwrap();
        transcript.push_tool_result("call_b", json!(1)).unwrap();
        transcript
            .push_assistant("", vec![ToolCallRequest::new("call_c", "get_log_groups")])
            .unwrap();

        assert_eq!(transcript.last_assistant_text(), Some("Looking at EC2 first."));
        assert_eq!(transcript.assistant_turns(), 2);
    }

    #[test]
    fn serializes_as_tagged_turn_list() {
        let mut transcript = Transcript::seeded("q");
        transcript
            .push_assistant("", vec![ToolCallRequest::new("c1", "get_s3_buckets")])
            .unwrap();
        transcript.push_tool_result("c1", json!({"status": "success"})).unwrap();

        let value = serde_json::to_value(&transcript).unwrap();
        assert_eq!(value[0]["role"], "user");
        assert_eq!(value[1]["role"], "assistant");
        assert_eq!(value[1]["tool_calls"][0]["id"], "c1");
        assert_eq!(value[2]["role"], "tool_result");
        assert_eq!(value[2]["call_id"], "c1");

        let back: Transcript = serde_json::from_value(value).unwrap();
        assert_eq!(back, transcript);
    }
}
