//! Convenience re-exports for common use.

pub use crate::api::NarrativeApi;
pub use crate::config::NarrativeConfig;
pub use crate::error::{NarrativeError, Result};
pub use crate::stream::{CacheHitPacing, NarrativeStream, StreamPhase, StreamSnapshot};
pub use crate::types::{
    NarrativeMetadata, NarrativeTarget, ProgressEvent, ProgressKind, StoredNarrative,
};
