//! Live event feed
//!
//! Consumes the game server's `/events` push stream and produces:
//! - Decoded event envelopes (malformed frames dropped)
//! - Injection-safe rendered entries for 30+ event kinds, with a generic
//!   fallback for anything unrecognised
//! - Bounded newest-first histories per presentation surface
//! - A connection status indicator driven by a reconnect state machine
//!
//! # Architecture
//!
//! ```text
//!   GET /events (text/event-stream)
//!          │
//!    ┌─────▼──────┐
//!    │ Transport  │  ← SSE framing, one live stream at a time
//!    └─────┬──────┘
//!          │
//!    ┌─────▼──────┐
//!    │ Connection │  ← Idle / Connecting / Open / Reconnecting
//!    │  Manager   │
//!    └─────┬──────┘
//!          │ envelopes, arrival order
//!    ┌─────┴───────────┐
//!    │                 │
//! ┌──▼───────┐   ┌─────▼────┐
//! │FeedPanel │   │ Ticker   │  ← filter → format → history
//! └──┬───────┘   └─────┬────┘
//!    │                 │
//! ┌──▼─────────────────▼──┐
//! │  watch::Receiver<…>   │
//! └───────────────────────┘
//! ```

pub mod config;
pub mod connection;
pub mod consumer;
pub mod events;
pub mod formatter;
pub mod history;
pub mod hub;
pub mod ingestion;
pub mod metrics;
pub mod sse;
pub mod templates;
pub mod transport;

pub use config::FeedConfig;
pub use connection::{ConnectionManager, ConnectionState, ConnectionStatus, FrameSink, StatusText};
pub use consumer::{Consumer, ConsumerKind, EventFilter, Surface};
pub use hub::SharedFeed;
pub use transport::{EventSource, FrameStream, HttpEventSource};

// Library version
pub const SERVICE_VERSION: &str = "0.1.0";
