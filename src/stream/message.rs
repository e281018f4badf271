//! Decoding of named server-push messages.

use crate::error::NarrativeError;
use crate::types::{Completion, ProgressEvent, ServerFailure};

pub const PROGRESS_EVENT: &str = "progress";
pub const COMPLETE_EVENT: &str = "complete";
pub const ERROR_EVENT: &str = "error";

/// Text used when an `error` message carries no description.
pub const UNSPECIFIED_SERVER_ERROR: &str = "Connection error occurred";

/// A decoded message from the generation endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    Progress(ProgressEvent),
    Complete(Completion),
    /// Application-level failure reported by the server.
    Failure(String),
}

/// Decode one SSE message by event name.
///
/// Returns `Ok(None)` for event names this protocol does not define.
pub fn decode(event: &str, data: &str) -> Result<Option<ServerMessage>, NarrativeError> {
    let message = match event {
        PROGRESS_EVENT => ServerMessage::Progress(parse(event, data)?),
        COMPLETE_EVENT => ServerMessage::Complete(parse(event, data)?),
        ERROR_EVENT => {
            let failure: ServerFailure = if data.trim().is_empty() {
                ServerFailure::default()
            } else {
                parse(event, data)?
            };
            ServerMessage::Failure(
                failure
                    .error
                    .filter(|e| !e.is_empty())
                    .unwrap_or_else(|| UNSPECIFIED_SERVER_ERROR.to_string()),
            )
        }
        _ => return Ok(None),
    };
    Ok(Some(message))
}

fn parse<T: serde::de::DeserializeOwned>(event: &str, data: &str) -> Result<T, NarrativeError> {
    serde_json::from_str(data).map_err(|e| NarrativeError::malformed(event, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProgressKind;

    #[test]
    fn decodes_progress() {
        let msg = decode("progress", r#"{"type":"fetching_data","message":"loading"}"#)
            .unwrap()
            .unwrap();
        match msg {
            ServerMessage::Progress(event) => {
                assert_eq!(event.kind, ProgressKind::FetchingData);
                assert_eq!(event.message.as_deref(), Some("loading"));
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn decodes_complete_with_metadata() {
        let data = r#"{"narrative":"Trade executed.","metadata":{"model":"gpt-4o","tokens_used":{"input":1,"output":2,"total":3},"from_storage":true}}"#;
        let Some(ServerMessage::Complete(done)) = decode("complete", data).unwrap() else {
            panic!("expected completion");
        };
        assert_eq!(done.narrative, "Trade executed.");
        let metadata = done.metadata.unwrap();
        assert!(metadata.from_storage);
        assert_eq!(metadata.tokens_used.total, 3);
    }

    #[test]
    fn error_without_text_uses_generic_message() {
        assert_eq!(
            decode("error", "{}").unwrap(),
            Some(ServerMessage::Failure(UNSPECIFIED_SERVER_ERROR.into()))
        );
        assert_eq!(
            decode("error", "").unwrap(),
            Some(ServerMessage::Failure(UNSPECIFIED_SERVER_ERROR.into()))
        );
    }

    #[test]
    fn malformed_payloads_name_their_event() {
        let err = decode("complete", "{not json").unwrap_err();
        assert!(
            matches!(&err, NarrativeError::MalformedMessage { event, .. } if event == "complete")
        );
        assert!(decode("progress", r#"{"message":"no type"}"#).is_err());
    }

    #[test]
    fn unknown_event_names_are_ignored() {
        assert_eq!(decode("message", "{}").unwrap(), None);
        assert_eq!(decode("heartbeat", "").unwrap(), None);
    }
}
