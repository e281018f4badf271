//! Observable session state and the transitions that mutate it.

use crate::types::{NarrativeMetadata, ProgressEvent};

use super::message::{self, ServerMessage, COMPLETE_EVENT, PROGRESS_EVENT};

/// Terminal error for a connection that failed without a server-reported error.
pub const CONNECTION_LOST: &str = "Connection to server lost";
/// Terminal error for a `complete` message whose payload could not be decoded.
pub const COMPLETION_PARSE_FAILED: &str = "Failed to parse completion response";
/// Terminal error for an `error` message whose payload could not be decoded.
pub const MALFORMED_SERVER_ERROR: &str = "Connection lost or error occurred";

/// Lifecycle phase of the current generation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamPhase {
    /// Nothing started, or reset since.
    #[default]
    Idle,
    /// Connection open (or opening); progress may arrive.
    Streaming,
    /// A `complete` message arrived; the narrative is set.
    Resolved,
    /// The server reported an error or the connection failed.
    Failed,
    /// The caller stopped the stream before it finished.
    Stopped,
}

/// Point-in-time view of a narrative stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamSnapshot {
    pub phase: StreamPhase,
    /// Incremented by every `start`. Survives `reset`.
    pub attempt: u64,
    /// Progress log in arrival order.
    pub progress: Vec<ProgressEvent>,
    pub narrative: Option<String>,
    pub metadata: Option<NarrativeMetadata>,
    pub error: Option<String>,
}

/// Outcome of feeding one message into the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Applied {
    /// Nothing observable changed.
    Ignored,
    /// The log grew; keep reading.
    Appended,
    /// The attempt reached a terminal phase; close the connection.
    Terminated,
}

impl StreamSnapshot {
    /// The in-progress flag.
    pub fn is_generating(&self) -> bool {
        self.phase == StreamPhase::Streaming
    }

    /// Whether the current attempt has finished one way or another.
    pub fn is_settled(&self) -> bool {
        !self.is_generating()
    }

    /// Message text of every progress entry that has one, in log order.
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.progress.iter().filter_map(|e| e.message.as_deref())
    }

    /// Short status line for a progress panel.
    pub fn status_label(&self) -> &'static str {
        if self.is_generating() {
            "Generating..."
        } else if self.error.is_some() {
            "Failed"
        } else {
            "Complete"
        }
    }

    /// Whether the resolved narrative was served from storage.
    pub fn from_storage(&self) -> bool {
        self.phase == StreamPhase::Resolved
            && self.metadata.as_ref().is_some_and(|m| m.from_storage)
    }

    pub(crate) fn accepts(&self, attempt: u64) -> bool {
        self.attempt == attempt && self.phase == StreamPhase::Streaming
    }

    /// Enter a fresh attempt, discarding everything accumulated so far.
    pub(crate) fn begin(&mut self) -> u64 {
        self.attempt += 1;
        self.progress.clear();
        self.narrative = None;
        self.metadata = None;
        self.error = None;
        self.phase = StreamPhase::Streaming;
        self.attempt
    }

    /// Streaming → Stopped. Returns `false` when there was nothing to stop.
    pub(crate) fn halt(&mut self) -> bool {
        if self.phase != StreamPhase::Streaming {
            return false;
        }
        self.phase = StreamPhase::Stopped;
        true
    }

    /// Back to the empty initial state. Returns `false` if already there.
    pub(crate) fn clear(&mut self) -> bool {
        let changed = self.phase != StreamPhase::Idle
            || !self.progress.is_empty()
            || self.narrative.is_some()
            || self.metadata.is_some()
            || self.error.is_some();
        self.phase = StreamPhase::Idle;
        self.progress.clear();
        self.narrative = None;
        self.metadata = None;
        self.error = None;
        changed
    }

    /// Terminal failure without a synthetic log entry.
    pub(crate) fn fail(&mut self, message: impl Into<String>) -> Applied {
        self.error = Some(message.into());
        self.phase = StreamPhase::Failed;
        Applied::Terminated
    }

    /// Feed one named SSE message into the state.
    pub(crate) fn apply(&mut self, event: &str, data: &str) -> Applied {
        match message::decode(event, data) {
            Ok(Some(ServerMessage::Progress(progress))) => {
                tracing::debug!(attempt = self.attempt, kind = %progress.kind, "progress event");
                self.progress.push(progress);
                Applied::Appended
            }
            Ok(Some(ServerMessage::Complete(done))) => {
                tracing::info!(
                    attempt = self.attempt,
                    events = self.progress.len(),
                    from_storage = done.metadata.as_ref().is_some_and(|m| m.from_storage),
                    "narrative stream resolved"
                );
                self.progress.push(ProgressEvent::completed(
                    done.narrative.clone(),
                    done.metadata.clone(),
                ));
                self.narrative = Some(done.narrative);
                self.metadata = done.metadata;
                self.phase = StreamPhase::Resolved;
                Applied::Terminated
            }
            Ok(Some(ServerMessage::Failure(text))) => {
                tracing::info!(attempt = self.attempt, error = %text, "narrative stream failed");
                self.progress.push(ProgressEvent::failed(text.clone()));
                self.fail(text)
            }
            Ok(None) => {
                tracing::debug!(attempt = self.attempt, event, "ignoring unknown event");
                Applied::Ignored
            }
            Err(err) if event == PROGRESS_EVENT => {
                tracing::warn!(attempt = self.attempt, error = %err, "dropping malformed progress event");
                Applied::Ignored
            }
            Err(err) if event == COMPLETE_EVENT => {
                tracing::warn!(attempt = self.attempt, error = %err, "malformed completion");
                self.fail(COMPLETION_PARSE_FAILED)
            }
            Err(err) => {
                tracing::warn!(attempt = self.attempt, error = %err, "malformed error event");
                self.fail(MALFORMED_SERVER_ERROR)
            }
        }
    }
}
