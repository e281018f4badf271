//! Push-stream transport seam.
//!
//! A transport is an asynchronous, cancellable subscription to a sequence of
//! server-tagged messages. Dropping the returned stream closes the connection.

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest_eventsource::{retry, Event, EventSource};

use crate::api::http;
use crate::config::NarrativeConfig;
use crate::error::NarrativeError;

/// One item delivered by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The connection is established.
    Opened,
    /// A named message with its raw data payload.
    Message { event: String, data: String },
    /// The connection failed or ended. Nothing follows this item.
    Failed(String),
}

/// Stream of transport items for a single connection.
pub type TransportStream = BoxStream<'static, TransportEvent>;

/// Opens server-push connections.
#[async_trait]
pub trait EventTransport: Send + Sync {
    /// Open a connection to `url`.
    ///
    /// An `Err` means the connection could not even be attempted; failures
    /// after that point arrive as [`TransportEvent::Failed`].
    async fn connect(&self, url: &str) -> Result<TransportStream, NarrativeError>;
}

/// Server-sent-events transport built on `reqwest-eventsource`.
///
/// Automatic reconnection is disabled: a dropped connection ends the stream.
#[derive(Debug, Clone)]
pub struct SseTransport {
    client: reqwest::Client,
}

impl SseTransport {
    /// Use an existing client. It must not carry a total request timeout, or
    /// long generations will be cut off.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &NarrativeConfig) -> Result<Self, NarrativeError> {
        Ok(Self::with_client(http::stream_client(config.request_timeout)?))
    }
}

#[async_trait]
impl EventTransport for SseTransport {
    async fn connect(&self, url: &str) -> Result<TransportStream, NarrativeError> {
        let mut source = EventSource::new(self.client.get(url))
            .map_err(|e| NarrativeError::Transport(e.to_string()))?;
        source.set_retry_policy(Box::new(retry::Never));
        tracing::debug!(url, "opening event source");

        let stream = async_stream::stream! {
            while let Some(item) = source.next().await {
                match item {
                    Ok(Event::Open) => yield TransportEvent::Opened,
                    Ok(Event::Message(message)) => {
                        yield TransportEvent::Message {
                            event: message.event,
                            data: message.data,
                        };
                    }
                    Err(err) => {
                        yield TransportEvent::Failed(err.to_string());
                        break;
                    }
                }
            }
            source.close();
        };
        Ok(stream.boxed())
    }
}
