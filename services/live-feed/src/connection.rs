//! Connection manager
//!
//! Owns one push stream and the reconnect state machine around it:
//!
//! ```text
//!            start()                open
//!   Idle ───────────► Connecting ─────────► Open
//!    ▲                  ▲     │               │
//!    │ stop()           │     │ error         │ error / close
//!    │ (any state)      │     ▼               │
//!    │                  └─ Reconnecting ◄─────┘
//!    │                   retry delay elapsed
//! ```
//!
//! The stream is driven by a single spawned task, so frames are delivered
//! to the sink strictly in arrival order. A connection is dropped before
//! its replacement is opened, and `stop()` cancels the pending retry.
//!
//! The indicator reads "Connecting..." only for the first attempt after
//! `start()`. Retries keep showing "Reconnecting..." until a stream opens.
//!
//! Deliveries and state changes made by the task happen under a gate that
//! `stop()` also takes, so nothing reaches the sink once `stop()` returns,
//! whichever runtime flavour the task runs on.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::StreamExt;
use serde::Serialize;
use tokio::sync::{watch, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use feed_types::errors::FeedError;

use crate::ingestion::{FrameIngester, Ingested, IngestionResult};
use crate::metrics::FeedMetrics;
use crate::transport::EventSource;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Idle,
    Connecting,
    Open,
    Reconnecting,
}

impl ConnectionState {
    /// Validate a move to `to`, returning the new state.
    pub fn transition(self, to: ConnectionState) -> Result<ConnectionState, FeedError> {
        use ConnectionState::*;

        let allowed = matches!(
            (self, to),
            (Idle, Connecting)
                | (Connecting, Open)
                | (Connecting, Reconnecting)
                | (Open, Reconnecting)
                | (Reconnecting, Connecting)
                | (_, Idle)
        );
        if allowed {
            Ok(to)
        } else {
            Err(FeedError::InvalidTransition {
                from: self.to_string(),
                to: to.to_string(),
            })
        }
    }

    /// Indicator after moving here from `previous`. A retry keeps the
    /// reconnecting indicator until the stream opens.
    pub fn status_from(self, previous: ConnectionState) -> ConnectionStatus {
        match (previous, self) {
            (ConnectionState::Reconnecting, ConnectionState::Connecting) => {
                ConnectionState::Reconnecting.status()
            }
            _ => self.status(),
        }
    }

    /// What the status indicator shows in this state.
    pub fn status(self) -> ConnectionStatus {
        match self {
            ConnectionState::Idle | ConnectionState::Connecting => ConnectionStatus {
                connected: false,
                text: StatusText::Connecting,
            },
            ConnectionState::Open => ConnectionStatus {
                connected: true,
                text: StatusText::Connected,
            },
            ConnectionState::Reconnecting => ConnectionStatus {
                connected: false,
                text: StatusText::Reconnecting,
            },
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Reconnecting => "reconnecting",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StatusText {
    Connecting,
    Connected,
    Reconnecting,
}

impl StatusText {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusText::Connecting => "Connecting...",
            StatusText::Connected => "Connected",
            StatusText::Reconnecting => "Reconnecting...",
        }
    }
}

impl fmt::Display for StatusText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Indicator shown next to a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub text: StatusText,
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        ConnectionState::Idle.status()
    }
}

/// Receives every envelope that survived frame decoding.
///
/// Called from the manager's task, one frame at a time.
pub trait FrameSink: Send + Sync {
    fn deliver(&self, event: &Ingested);
}

/// State plus the status derived from it, published to watchers.
#[derive(Debug)]
struct StateCell {
    state: watch::Sender<ConnectionState>,
    status: watch::Sender<ConnectionStatus>,
}

impl StateCell {
    fn new() -> Self {
        Self {
            state: watch::Sender::new(ConnectionState::Idle),
            status: watch::Sender::new(ConnectionStatus::default()),
        }
    }

    fn current(&self) -> ConnectionState {
        *self.state.borrow()
    }

    fn advance(&self, to: ConnectionState) -> Result<(), FeedError> {
        let mut result = Ok(());
        let mut previous = to;
        self.state.send_if_modified(|state| {
            previous = *state;
            match state.transition(to) {
                Ok(next) => {
                    let changed = *state != next;
                    *state = next;
                    changed
                }
                Err(err) => {
                    result = Err(err);
                    false
                }
            }
        });

        match &result {
            Ok(()) => {
                let status = to.status_from(previous);
                self.status.send_if_modified(|current| {
                    let changed = *current != status;
                    *current = status;
                    changed
                });
            }
            Err(err) => warn!(error = %err, "Rejected connection state transition"),
        }
        result
    }
}

/// One running driver task.
#[derive(Debug)]
struct Run {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Maintains the push connection for one sink.
pub struct ConnectionManager {
    source: Arc<dyn EventSource>,
    sink: Arc<dyn FrameSink>,
    retry_delay: Duration,
    metrics: Arc<FeedMetrics>,
    cell: Arc<StateCell>,
    /// Held by a driver for as long as it has a stream open.
    link: Arc<AsyncMutex<()>>,
    /// Taken by the driver around each delivery and state change, and by
    /// `stop()` while it cancels.
    gate: Arc<Mutex<()>>,
    run: Option<Run>,
}

impl ConnectionManager {
    pub fn new(
        source: Arc<dyn EventSource>,
        sink: Arc<dyn FrameSink>,
        retry_delay: Duration,
        metrics: Arc<FeedMetrics>,
    ) -> Self {
        Self {
            source,
            sink,
            retry_delay,
            metrics,
            cell: Arc::new(StateCell::new()),
            link: Arc::new(AsyncMutex::new(())),
            gate: Arc::new(Mutex::new(())),
            run: None,
        }
    }

    /// Begin connecting. A running manager is stopped and restarted.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&mut self) {
        if self.run.is_some() {
            self.stop();
        }

        let cancel = CancellationToken::new();
        let driver = Driver {
            source: Arc::clone(&self.source),
            sink: Arc::clone(&self.sink),
            retry_delay: self.retry_delay,
            ingester: FrameIngester::new(Arc::clone(&self.metrics)),
            metrics: Arc::clone(&self.metrics),
            cell: Arc::clone(&self.cell),
            link: Arc::clone(&self.link),
            gate: Arc::clone(&self.gate),
            cancel: cancel.clone(),
        };
        let handle = tokio::spawn(driver.run());

        info!(retry_ms = self.retry_delay.as_millis() as u64, "Connection manager started");
        self.run = Some(Run { cancel, handle });
    }

    /// Tear down the connection and cancel any pending retry.
    ///
    /// Safe to call repeatedly; a stopped manager can be started again.
    /// Once this returns the sink receives nothing more from the old task.
    pub fn stop(&mut self) {
        let _gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(run) = self.run.take() {
            run.cancel.cancel();
            run.handle.abort();
            info!("Connection manager stopped");
        }
        if self.cell.current() != ConnectionState::Idle {
            let _ = self.cell.advance(ConnectionState::Idle);
        }
    }

    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    pub fn state(&self) -> ConnectionState {
        self.cell.current()
    }

    pub fn current_status(&self) -> ConnectionStatus {
        *self.cell.status.borrow()
    }

    /// Status indicator updates.
    pub fn status(&self) -> watch::Receiver<ConnectionStatus> {
        self.cell.status.subscribe()
    }

    /// Raw state updates.
    pub fn states(&self) -> watch::Receiver<ConnectionState> {
        self.cell.state.subscribe()
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("state", &self.state())
            .field("retry_delay", &self.retry_delay)
            .field("running", &self.is_running())
            .finish()
    }
}

/// Everything the spawned task owns.
struct Driver {
    source: Arc<dyn EventSource>,
    sink: Arc<dyn FrameSink>,
    retry_delay: Duration,
    ingester: FrameIngester,
    metrics: Arc<FeedMetrics>,
    cell: Arc<StateCell>,
    link: Arc<AsyncMutex<()>>,
    gate: Arc<Mutex<()>>,
    cancel: CancellationToken,
}

impl Driver {
    async fn run(mut self) {
        loop {
            if !self.advance(ConnectionState::Connecting) {
                return;
            }

            // an aborted predecessor releases this only once its stream is dropped
            let link = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return,
                link = Arc::clone(&self.link).lock_owned() => link,
            };
            self.metrics.record_attempt();
            debug!("Connecting to event stream");

            let opened = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return,
                opened = self.source.open() => opened,
            };

            match opened {
                Ok(mut frames) => {
                    if !self.advance(ConnectionState::Open) {
                        return;
                    }
                    self.metrics.record_opened();
                    info!("Event stream connected");

                    let reason = loop {
                        let next = tokio::select! {
                            biased;
                            _ = self.cancel.cancelled() => return,
                            next = frames.next() => next,
                        };
                        match next {
                            Some(Ok(frame)) => self.handle_frame(&frame),
                            Some(Err(err)) => break err.to_string(),
                            None => break "stream closed".to_string(),
                        }
                    };

                    drop(frames);
                    self.metrics.record_disconnect();
                    warn!(reason = %reason, "Event stream lost");
                }
                Err(err) => {
                    warn!(error = %err, "Event stream failed to open");
                }
            }
            drop(link);

            if !self.advance(ConnectionState::Reconnecting) {
                return;
            }
            warn!(
                retry_ms = self.retry_delay.as_millis() as u64,
                "Scheduling reconnect"
            );

            let sleep = time::sleep(self.retry_delay);
            tokio::pin!(sleep);
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return,
                _ = &mut sleep => {}
            }
        }
    }

    fn advance(&self, to: ConnectionState) -> bool {
        let _gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        !self.cancel.is_cancelled() && self.cell.advance(to).is_ok()
    }

    fn handle_frame(&mut self, frame: &str) {
        if let IngestionResult::Accepted(event) = self.ingester.ingest(frame) {
            let _gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
            if !self.cancel.is_cancelled() {
                self.sink.deliver(&event);
            }
        }
    }
}
