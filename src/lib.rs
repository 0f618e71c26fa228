//! Lightombo: real-time blockchain event stream client
//!
//! Streams decoded activity events from a WebSocket feed, keeps the most
//! recent ones in a bounded buffer and maintains running session metrics.
//! Streaming is gated per identity behind an external signing step.

pub mod access;
pub mod buffer;
pub mod classify;
pub mod config;
pub mod dashboard;
pub mod event;
pub mod export;
pub mod metrics;
pub mod state;
pub mod stream;
pub mod ui;

pub use access::{AccessError, AccessGate, AccessGrant, AccessState, AccessStore};
pub use buffer::EventBuffer;
pub use config::Config;
pub use dashboard::{Dashboard, DashboardError};
pub use event::{Category, Event, EventData, RawMessage};
pub use metrics::{Metrics, MetricsAggregator};
pub use state::{DashboardSnapshot, DashboardState, StateMessage};
pub use stream::{ConnectionState, ConnectionStatus, StreamConnection, StreamError};
