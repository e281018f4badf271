//! Progress events pushed by the generation endpoint.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::narrative::NarrativeMetadata;

/// Kind tag of a progress event (`type` on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProgressKind {
    CacheCheck,
    CacheHit,
    CacheMiss,
    FetchingData,
    DataReady,
    ToolDiscovery,
    ToolCall,
    ToolResponse,
    LlmGenerating,
    Saving,
    Saved,
    Complete,
    Error,
    Warning,
}

/// Server-supplied instant. Never validated or reordered.
///
/// The generation agent sends epoch seconds as a float, cached results send a
/// formatted string, and client-side synthetic events use epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Number(f64),
    Text(String),
}

impl Timestamp {
    /// Current wall-clock time in epoch milliseconds.
    pub fn now() -> Self {
        Self::Number(chrono::Utc::now().timestamp_millis() as f64)
    }
}

/// One unit of server-pushed progress information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    #[serde(rename = "type")]
    pub kind: ProgressKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Tool name (tool_call / tool_response).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<NarrativeMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProgressEvent {
    /// Bare event of the given kind, stamped with the current time.
    pub fn new(kind: ProgressKind) -> Self {
        Self {
            kind,
            timestamp: Some(Timestamp::now()),
            message: None,
            tool: None,
            args: None,
            result: None,
            duration_ms: None,
            model: None,
            max_tokens: None,
            narrative: None,
            metadata: None,
            error: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Synthetic terminal entry appended when the stream resolves.
    pub fn completed(narrative: impl Into<String>, metadata: Option<NarrativeMetadata>) -> Self {
        let mut event = Self::new(ProgressKind::Complete);
        event.narrative = Some(narrative.into());
        event.metadata = metadata;
        event
    }

    /// Synthetic terminal entry appended when the server reports an error.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(ProgressKind::Error).with_message(message)
    }

    /// Whether this is a tool invocation or its response.
    pub fn is_tool_event(&self) -> bool {
        matches!(self.kind, ProgressKind::ToolCall | ProgressKind::ToolResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn kind_wire_names_are_snake_case() {
        assert_eq!(ProgressKind::LlmGenerating.to_string(), "llm_generating");
        assert_eq!(
            ProgressKind::from_str("tool_response").unwrap(),
            ProgressKind::ToolResponse
        );
        let json = serde_json::to_string(&ProgressKind::CacheHit).unwrap();
        assert_eq!(json, "\"cache_hit\"");
    }

    #[test]
    fn timestamp_accepts_numbers_and_strings() {
        let event: ProgressEvent =
            serde_json::from_str(r#"{"type":"cache_hit","timestamp":"2024-05-01 10:00:00"}"#)
                .unwrap();
        assert_eq!(
            event.timestamp,
            Some(Timestamp::Text("2024-05-01 10:00:00".into()))
        );

        let event: ProgressEvent =
            serde_json::from_str(r#"{"type":"tool_call","timestamp":1714557600.25}"#).unwrap();
        assert_eq!(event.timestamp, Some(Timestamp::Number(1714557600.25)));
    }

    #[test]
    fn missing_timestamp_is_allowed() {
        let event: ProgressEvent =
            serde_json::from_str(r#"{"type":"cache_check","message":"checking"}"#).unwrap();
        assert_eq!(event.kind, ProgressKind::CacheCheck);
        assert!(event.timestamp.is_none());
        assert_eq!(event.message.as_deref(), Some("checking"));
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let parsed = serde_json::from_str::<ProgressEvent>(r#"{"type":"thinking"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn synthetic_failure_carries_message() {
        let event = ProgressEvent::failed("upstream timeout");
        assert_eq!(event.kind, ProgressKind::Error);
        assert_eq!(event.message.as_deref(), Some("upstream timeout"));
        assert!(matches!(event.timestamp, Some(Timestamp::Number(_))));
    }
}
