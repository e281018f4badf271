//! cdm-narrative: client for the CDM trade narrative service.
//!
//! The core is [`stream::NarrativeStream`], which consumes the service's
//! server-sent-event generation endpoint and folds the incremental progress
//! messages into a final narrative, observable as a [`stream::StreamSnapshot`].
//! [`api::NarrativeApi`] reads and invalidates narratives the service has
//! already stored.
//!
//! # Quick Start
//!
//! ```no_run
//! use cdm_narrative::prelude::*;
//!
//! # async fn example() -> cdm_narrative::error::Result<()> {
//! let stream = NarrativeStream::new(NarrativeConfig::from_env())?;
//! stream.generate(&NarrativeTarget::trade("TRD-001")).await?;
//!
//! let done = stream.wait_until_settled().await;
//! for line in done.messages() {
//!     println!("{line}");
//! }
//! match (done.narrative, done.error) {
//!     (Some(narrative), _) => println!("{narrative}"),
//!     (None, Some(error)) => eprintln!("{error}"),
//!     (None, None) => {}
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod prelude;
pub mod stream;
pub mod types;

#[cfg(feature = "cli")]
pub mod cli;
