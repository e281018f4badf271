//! What a narrative is about: a whole trade or one event of a trade.

use reqwest::Url;

use crate::error::NarrativeError;

/// Subject of a narrative request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NarrativeTarget {
    /// Narrative covering the full trade lifecycle.
    Trade { trade_id: String },
    /// Narrative for a single business event.
    Event {
        trade_id: String,
        event_id: String,
        trade_state_id: String,
    },
}

impl NarrativeTarget {
    pub fn trade(trade_id: impl Into<String>) -> Self {
        Self::Trade {
            trade_id: trade_id.into(),
        }
    }

    pub fn event(
        trade_id: impl Into<String>,
        event_id: impl Into<String>,
        trade_state_id: impl Into<String>,
    ) -> Self {
        Self::Event {
            trade_id: trade_id.into(),
            event_id: event_id.into(),
            trade_state_id: trade_state_id.into(),
        }
    }

    pub fn trade_id(&self) -> &str {
        match self {
            Self::Trade { trade_id } | Self::Event { trade_id, .. } => trade_id,
        }
    }

    /// URL of the SSE generation endpoint under `base`.
    pub fn generate_url(&self, base: &str) -> Result<Url, NarrativeError> {
        let mut url = self.stored_url(base)?;
        join_segments(&mut url, &["generate"])?;
        if let Self::Event { trade_state_id, .. } = self {
            url.query_pairs_mut()
                .append_pair("trade_state_id", trade_state_id);
        }
        Ok(url)
    }

    /// URL of the stored-narrative endpoint under `base`.
    pub fn stored_url(&self, base: &str) -> Result<Url, NarrativeError> {
        let mut url = parse_base(base)?;
        match self {
            Self::Trade { trade_id } => {
                join_segments(&mut url, &["trades", trade_id.as_str(), "narrative"])?;
            }
            Self::Event {
                trade_id, event_id, ..
            } => {
                join_segments(
                    &mut url,
                    &["trades", trade_id.as_str(), "events", event_id.as_str(), "narrative"],
                )?;
            }
        }
        Ok(url)
    }
}

pub(crate) fn parse_base(base: &str) -> Result<Url, NarrativeError> {
    Url::parse(base)
        .map_err(|e| NarrativeError::Configuration(format!("Invalid API base URL {base:?}: {e}")))
}

/// Append percent-encoded path segments, tolerating a trailing slash on the base.
pub(crate) fn join_segments(url: &mut Url, segments: &[&str]) -> Result<(), NarrativeError> {
    let display = url.to_string();
    url.path_segments_mut()
        .map_err(|_| NarrativeError::Configuration(format!("URL {display} cannot be a base")))?
        .pop_if_empty()
        .extend(segments);
    Ok(())
}
