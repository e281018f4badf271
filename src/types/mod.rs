//! Core types for cdm-narrative.

pub mod narrative;
pub mod progress;
pub mod target;

pub use narrative::*;
pub use progress::*;
pub use target::NarrativeTarget;
