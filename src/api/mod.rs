//! Narrative storage API: read stored narratives and invalidate them.

pub mod http;

use serde::de::DeserializeOwned;

use crate::config::NarrativeConfig;
use crate::error::NarrativeError;
use crate::types::target::{join_segments, parse_base};
use crate::types::{InvalidationReceipt, NarrativeTarget, StoredNarrative};

/// Request/response client for previously generated narratives.
#[derive(Debug, Clone)]
pub struct NarrativeApi {
    client: reqwest::Client,
    base_url: String,
}

impl NarrativeApi {
    pub fn new(config: &NarrativeConfig) -> Result<Self, NarrativeError> {
        let client = http::request_client(config.request_timeout)?;
        Ok(Self::with_client(client, config.api_base_url.clone()))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Stored narrative for a whole trade. Does not trigger generation.
    pub async fn get_trade_narrative(
        &self,
        trade_id: &str,
    ) -> Result<StoredNarrative, NarrativeError> {
        self.get_stored(&NarrativeTarget::trade(trade_id)).await
    }

    /// Stored narrative for one event of a trade. Does not trigger generation.
    pub async fn get_event_narrative(
        &self,
        trade_id: &str,
        event_id: &str,
    ) -> Result<StoredNarrative, NarrativeError> {
        let mut url = parse_base(&self.base_url)?;
        join_segments(
            &mut url,
            &["trades", trade_id, "events", event_id, "narrative"],
        )?;
        self.fetch(self.client.get(url)).await
    }

    /// Stored narrative for `target`.
    pub async fn get_stored(
        &self,
        target: &NarrativeTarget,
    ) -> Result<StoredNarrative, NarrativeError> {
        let url = target.stored_url(&self.base_url)?;
        self.fetch(self.client.get(url)).await
    }

    /// Delete every stored narrative for a trade (trade- and event-level).
    pub async fn invalidate_trade_narratives(
        &self,
        trade_id: &str,
    ) -> Result<InvalidationReceipt, NarrativeError> {
        let url = NarrativeTarget::trade(trade_id).stored_url(&self.base_url)?;
        let receipt: InvalidationReceipt = self.fetch(self.client.delete(url)).await?;
        tracing::info!(trade_id, deleted = receipt.deleted, "invalidated stored narratives");
        Ok(receipt)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, NarrativeError> {
        let resp = request.send().await?;
        let status = resp.status();
        tracing::debug!(url = %resp.url(), status = status.as_u16(), "narrative api response");
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(http::status_to_error(status, &body));
        }
        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}
