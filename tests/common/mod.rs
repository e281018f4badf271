//! Shared test helpers and a scripted in-memory transport.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::mpsc;

use cdm_narrative::config::NarrativeConfig;
use cdm_narrative::error::NarrativeError;
use cdm_narrative::stream::{
    EventTransport, NarrativeStream, StreamSnapshot, TransportEvent, TransportStream,
};

/// Connection lifecycle entries recorded by [`ScriptedTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lifecycle {
    Opened(usize),
    Closed(usize),
}

#[derive(Default)]
struct Inner {
    senders: Vec<mpsc::UnboundedSender<TransportEvent>>,
    urls: Vec<String>,
    lifecycle: Vec<Lifecycle>,
    refuse_next: Option<String>,
}

/// A transport whose connections are fed by the test.
///
/// Each `connect` creates a channel; the test pushes events into connection
/// `n` (0-based, in connect order). Dropping the returned stream records a
/// `Closed` entry, which is how tests observe teardown.
#[derive(Default)]
pub struct ScriptedTransport {
    inner: Arc<Mutex<Inner>>,
}

struct CloseGuard {
    index: usize,
    inner: Arc<Mutex<Inner>>,
}

impl Drop for CloseGuard {
    fn drop(&mut self) {
        self.inner
            .lock()
            .unwrap()
            .lifecycle
            .push(Lifecycle::Closed(self.index));
    }
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make the next `connect` fail with `reason`.
    pub fn refuse_next(&self, reason: &str) {
        self.inner.lock().unwrap().refuse_next = Some(reason.to_string());
    }

    pub fn connections(&self) -> usize {
        self.inner.lock().unwrap().senders.len()
    }

    pub fn urls(&self) -> Vec<String> {
        self.inner.lock().unwrap().urls.clone()
    }

    pub fn lifecycle(&self) -> Vec<Lifecycle> {
        self.inner.lock().unwrap().lifecycle.clone()
    }

    pub fn closed(&self) -> usize {
        self.lifecycle()
            .iter()
            .filter(|entry| matches!(entry, Lifecycle::Closed(_)))
            .count()
    }

    /// Push a raw item into connection `index`. Returns `false` if that
    /// connection is already closed.
    pub fn push(&self, index: usize, item: TransportEvent) -> bool {
        let sender = self.inner.lock().unwrap().senders[index].clone();
        sender.send(item).is_ok()
    }

    pub fn message(&self, index: usize, event: &str, data: &str) -> bool {
        self.push(
            index,
            TransportEvent::Message {
                event: event.to_string(),
                data: data.to_string(),
            },
        )
    }

    pub fn progress(&self, index: usize, data: serde_json::Value) -> bool {
        self.message(index, "progress", &data.to_string())
    }

    pub fn complete(&self, index: usize, data: serde_json::Value) -> bool {
        self.message(index, "complete", &data.to_string())
    }

    pub fn server_error(&self, index: usize, data: serde_json::Value) -> bool {
        self.message(index, "error", &data.to_string())
    }

    /// Simulate the server hanging up without a terminal message.
    pub fn hang_up(&self, index: usize) {
        let mut inner = self.inner.lock().unwrap();
        let (closed, _) = mpsc::unbounded_channel();
        inner.senders[index] = closed;
    }

    /// Wait until at least `count` connections have been opened.
    pub async fn wait_for_connections(&self, count: usize) {
        within(async {
            while self.connections() < count {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await;
    }
}

#[async_trait]
impl EventTransport for ScriptedTransport {
    async fn connect(&self, url: &str) -> Result<TransportStream, NarrativeError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(reason) = inner.refuse_next.take() {
            return Err(NarrativeError::Transport(reason));
        }
        let index = inner.senders.len();
        let (tx, mut rx) = mpsc::unbounded_channel();
        inner.senders.push(tx);
        inner.urls.push(url.to_string());
        inner.lifecycle.push(Lifecycle::Opened(index));

        let guard = CloseGuard {
            index,
            inner: Arc::clone(&self.inner),
        };
        let stream = async_stream::stream! {
            let _guard = guard;
            yield TransportEvent::Opened;
            while let Some(item) = rx.recv().await {
                yield item;
            }
        };
        Ok(stream.boxed())
    }
}

pub fn test_config() -> NarrativeConfig {
    NarrativeConfig::builder()
        .api_base_url("http://narratives.test/api")
        .build()
}

pub fn scripted_stream() -> (NarrativeStream, Arc<ScriptedTransport>) {
    let transport = ScriptedTransport::new();
    let stream = NarrativeStream::with_transport(test_config(), transport.clone());
    (stream, transport)
}

/// Fail the test if `future` takes longer than two seconds.
pub async fn within<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::time::timeout(Duration::from_secs(2), future)
        .await
        .expect("timed out waiting for the stream")
}

/// Wait until the stream's state satisfies `predicate`.
pub async fn wait_for_state(
    stream: &NarrativeStream,
    mut predicate: impl FnMut(&StreamSnapshot) -> bool,
) -> StreamSnapshot {
    let mut rx = stream.watch();
    within(async {
        let state = rx.wait_for(|s| predicate(s)).await.expect("sender dropped");
        state.clone()
    })
    .await
}
