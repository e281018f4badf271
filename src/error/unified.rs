//! Error classification.

/// Broad error category, mirroring how a narrative session can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The connection failed or dropped before the server said anything useful.
    Transport,
    /// The server reported an error (non-2xx status or an `error` event).
    Application,
    /// A payload could not be decoded locally.
    MalformedMessage,
    /// Local configuration is invalid.
    Configuration,
    Unknown,
}
