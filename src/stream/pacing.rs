//! Cosmetic display delay for narratives served from storage.

use std::time::Duration;

use crate::config::NarrativeConfig;

use super::state::StreamSnapshot;

/// Holds back a cached narrative for a fixed delay before revealing it.
///
/// Purely presentational: it never touches session state, and freshly
/// generated narratives are revealed immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheHitPacing {
    delay: Duration,
}

impl CacheHitPacing {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn from_config(config: &NarrativeConfig) -> Self {
        Self::new(config.cache_hit_delay)
    }

    /// How long to hold `snapshot` back.
    pub fn delay_for(&self, snapshot: &StreamSnapshot) -> Duration {
        if snapshot.from_storage() {
            self.delay
        } else {
            Duration::ZERO
        }
    }

    /// Wait out the delay (if any), then return the narrative.
    pub async fn reveal<'a>(&self, snapshot: &'a StreamSnapshot) -> Option<&'a str> {
        let delay = self.delay_for(snapshot);
        if !delay.is_zero() {
            tracing::debug!(delay_ms = delay.as_millis() as u64, "pacing cached narrative");
            tokio::time::sleep(delay).await;
        }
        snapshot.narrative.as_deref()
    }
}
