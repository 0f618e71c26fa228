//! Feed connection
//!
//! One logical WebSocket connection to the upstream event feed. The
//! connection never reconnects on its own: after a transport failure the
//! status goes to `Disconnected` with the error attached, and the caller
//! decides whether to `open` again.

pub mod connection;
pub mod endpoint;
pub mod error;

pub use connection::{ConnectionState, ConnectionStatus, StreamConnection};
pub use endpoint::stream_url;
pub use error::StreamError;
