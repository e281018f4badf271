//! Narrative stream client: one generation attempt at a time, observable
//! through a `watch` channel.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;

use crate::config::NarrativeConfig;
use crate::error::NarrativeError;
use crate::types::NarrativeTarget;

use super::state::{Applied, StreamSnapshot, CONNECTION_LOST};
use super::transport::{EventTransport, SseTransport, TransportEvent};

/// Client for the SSE narrative-generation endpoint.
///
/// Holds at most one live connection. All state lives in a single `watch`
/// value; both the background reader and the `start`/`stop`/`reset` controls
/// mutate it through the channel's writer lock, and the reader only applies
/// messages while its attempt is current and still streaming.
///
/// # Example
///
/// ```ignore
/// let stream = NarrativeStream::new(NarrativeConfig::from_env())?;
/// stream.generate(&NarrativeTarget::trade("TRD-001")).await?;
/// let done = stream.wait_until_settled().await;
/// println!("{}", done.narrative.unwrap_or_default());
/// ```
pub struct NarrativeStream {
    config: NarrativeConfig,
    transport: Arc<dyn EventTransport>,
    state_tx: Arc<watch::Sender<StreamSnapshot>>,
    active: Mutex<Option<ActiveConnection>>,
}

/// The reader task of the current attempt. Aborting it drops the transport
/// stream, which closes the connection.
struct ActiveConnection {
    attempt: u64,
    task: JoinHandle<()>,
}

impl ActiveConnection {
    async fn close(self) {
        self.task.abort();
        let _ = self.task.await;
        tracing::debug!(attempt = self.attempt, "narrative connection closed");
    }
}

impl NarrativeStream {
    /// Create a client using the SSE transport.
    pub fn new(config: NarrativeConfig) -> Result<Self, NarrativeError> {
        let transport = SseTransport::from_config(&config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a client over a custom transport.
    pub fn with_transport(config: NarrativeConfig, transport: Arc<dyn EventTransport>) -> Self {
        let (state_tx, _) = watch::channel(StreamSnapshot::default());
        Self {
            config,
            transport,
            state_tx: Arc::new(state_tx),
            active: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &NarrativeConfig {
        &self.config
    }

    /// Current observable state.
    pub fn snapshot(&self) -> StreamSnapshot {
        self.state_tx.borrow().clone()
    }

    /// Subscribe to state changes.
    pub fn watch(&self) -> watch::Receiver<StreamSnapshot> {
        self.state_tx.subscribe()
    }

    /// State changes as a `Stream`, starting with the current state.
    pub fn updates(&self) -> WatchStream<StreamSnapshot> {
        WatchStream::new(self.watch())
    }

    /// Start generating the narrative for `target`.
    pub async fn generate(&self, target: &NarrativeTarget) -> Result<(), NarrativeError> {
        let url = target.generate_url(&self.config.api_base_url)?;
        self.start(url.as_str()).await;
        Ok(())
    }

    /// Open a stream to `endpoint`, replacing any current one.
    ///
    /// Relative endpoints are resolved against the configured base URL. The
    /// previous connection is fully closed before the new one is opened.
    pub async fn start(&self, endpoint: &str) {
        let url = self.config.resolve_endpoint(endpoint);
        let mut active = self.active.lock().await;

        let mut attempt = 0;
        self.state_tx.send_modify(|state| attempt = state.begin());

        if let Some(previous) = active.take() {
            previous.close().await;
        }

        tracing::info!(attempt, url = %url, "starting narrative stream");
        let task = tokio::spawn(read_stream(
            Arc::clone(&self.transport),
            url,
            attempt,
            Arc::clone(&self.state_tx),
        ));
        *active = Some(ActiveConnection { attempt, task });
    }

    /// Close the active connection, keeping everything received so far.
    ///
    /// No-op when nothing is streaming. Once this returns, nothing from the
    /// closed connection can change the state.
    pub async fn stop(&self) {
        let mut active = self.active.lock().await;
        let halted = self.state_tx.send_if_modified(StreamSnapshot::halt);
        if let Some(connection) = active.take() {
            connection.close().await;
        }
        if halted {
            tracing::info!("narrative stream stopped");
        }
    }

    /// Stop, then clear the progress log, narrative and error.
    pub async fn reset(&self) {
        let mut active = self.active.lock().await;
        self.state_tx.send_if_modified(StreamSnapshot::clear);
        if let Some(connection) = active.take() {
            connection.close().await;
        }
    }

    /// Wait until the current attempt leaves the streaming phase.
    pub async fn wait_until_settled(&self) -> StreamSnapshot {
        let mut rx = self.watch();
        let settled = match rx.wait_for(StreamSnapshot::is_settled).await {
            Ok(state) => state.clone(),
            Err(_) => self.snapshot(),
        };
        settled
    }
}

impl Drop for NarrativeStream {
    fn drop(&mut self) {
        if let Some(connection) = self.active.get_mut().take() {
            connection.task.abort();
        }
    }
}

/// Reader task for one attempt.
async fn read_stream(
    transport: Arc<dyn EventTransport>,
    url: String,
    attempt: u64,
    state_tx: Arc<watch::Sender<StreamSnapshot>>,
) {
    let mut stream = match transport.connect(&url).await {
        Ok(stream) => stream,
        Err(err) => {
            tracing::warn!(attempt, error = %err, "could not open narrative stream");
            let message = err.to_string();
            apply_if_current(&state_tx, attempt, |state| state.fail(message));
            return;
        }
    };

    while let Some(item) = stream.next().await {
        let outcome = match item {
            TransportEvent::Opened => {
                tracing::debug!(attempt, "narrative stream open");
                continue;
            }
            TransportEvent::Message { event, data } => {
                apply_if_current(&state_tx, attempt, |state| state.apply(&event, &data))
            }
            TransportEvent::Failed(reason) => {
                apply_if_current(&state_tx, attempt, |state| {
                    tracing::warn!(attempt, reason = %reason, "narrative stream connection lost");
                    state.fail(CONNECTION_LOST)
                })
            }
        };
        match outcome {
            Some(Applied::Ignored) | Some(Applied::Appended) => {}
            Some(Applied::Terminated) => return,
            None => {
                tracing::debug!(attempt, "discarding message for superseded attempt");
                return;
            }
        }
    }

    apply_if_current(&state_tx, attempt, |state| {
        tracing::warn!(attempt, "narrative stream ended without a result");
        state.fail(CONNECTION_LOST)
    });
}

/// Run `f` against the state if `attempt` is still the live one.
///
/// Returns `None` when the attempt was superseded, stopped, or already settled.
fn apply_if_current(
    state_tx: &watch::Sender<StreamSnapshot>,
    attempt: u64,
    f: impl FnOnce(&mut StreamSnapshot) -> Applied,
) -> Option<Applied> {
    let mut outcome = None;
    state_tx.send_if_modified(|state| {
        if !state.accepts(attempt) {
            return false;
        }
        let applied = f(state);
        outcome = Some(applied);
        applied != Applied::Ignored
    });
    outcome
}
