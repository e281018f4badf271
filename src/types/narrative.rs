//! Narrative payloads: completion metadata and stored-narrative responses.

use serde::{Deserialize, Deserializer, Serialize};

/// Token counts reported by the generating model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenUsage {
    #[serde(deserialize_with = "null_as_default")]
    pub input: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub output: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub total: u64,
}

/// A tool the agent called while writing the narrative.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolInvocation {
    #[serde(deserialize_with = "null_as_default")]
    pub tool: String,
    pub args: serde_json::Value,
    #[serde(deserialize_with = "null_as_default")]
    pub duration_ms: f64,
}

/// Metadata attached to a resolved narrative.
///
/// Every field defaults when absent or `null`: narratives stored by older
/// service versions carry only part of this shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrativeMetadata {
    #[serde(deserialize_with = "null_as_default")]
    pub model: String,
    #[serde(deserialize_with = "null_as_default")]
    pub tokens_used: TokenUsage,
    #[serde(deserialize_with = "null_as_default")]
    pub generation_time_ms: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub tool_calls: Vec<ToolInvocation>,
    /// `true` when the narrative was served from storage rather than generated.
    #[serde(deserialize_with = "null_as_default")]
    pub from_storage: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_at: Option<String>,
}

/// Payload of the `complete` SSE message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub narrative: String,
    #[serde(
        default,
        deserialize_with = "lenient_metadata",
        skip_serializing_if = "Option::is_none"
    )]
    pub metadata: Option<NarrativeMetadata>,
}

/// Payload of the `error` SSE message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerFailure {
    #[serde(default)]
    pub error: Option<String>,
}

/// A narrative read back from storage. Both fields are `None` when nothing
/// has been generated yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredNarrative {
    #[serde(default)]
    pub narrative: Option<String>,
    #[serde(default, deserialize_with = "lenient_metadata")]
    pub metadata: Option<NarrativeMetadata>,
    /// Set by the trade-level endpoint when storage lookup failed server-side.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StoredNarrative {
    pub fn is_available(&self) -> bool {
        self.narrative.is_some()
    }
}

/// Result of invalidating a trade's stored narratives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidationReceipt {
    pub deleted: u64,
    pub trade_id: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Metadata never decides whether a narrative is usable: a shape we cannot
/// read is dropped with a warning instead of failing the whole payload.
fn lenient_metadata<'de, D>(deserializer: D) -> Result<Option<NarrativeMetadata>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    match raw {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(value) => match serde_json::from_value(value) {
            Ok(metadata) => Ok(Some(metadata)),
            Err(err) => {
                tracing::warn!(error = %err, "ignoring unreadable narrative metadata");
                Ok(None)
            }
        },
    }
}
