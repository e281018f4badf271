//! SSE narrative stream: protocol decoding, session state, transport.

pub mod message;
pub mod pacing;
pub mod session;
pub mod state;
pub mod transport;

pub use message::ServerMessage;
pub use pacing::CacheHitPacing;
pub use session::NarrativeStream;
pub use state::{
    StreamPhase, StreamSnapshot, COMPLETION_PARSE_FAILED, CONNECTION_LOST, MALFORMED_SERVER_ERROR,
};
pub use transport::{EventTransport, SseTransport, TransportEvent, TransportStream};
