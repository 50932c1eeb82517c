//! Presentation consumers
//!
//! A consumer filters envelopes by tag, formats the survivors, keeps them
//! in its own history buffer and publishes the newest-first view through a
//! `watch` channel. The feed panel shows everything except periodic noise;
//! the ticker shows exchange fills only.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tracing::debug;

use feed_types::entry::FormattedEntry;

use crate::config::FeedConfig;
use crate::connection::{ConnectionManager, ConnectionStatus, FrameSink};
use crate::events::EventKind;
use crate::formatter;
use crate::history::HistoryBuffer;
use crate::ingestion::Ingested;
use crate::metrics::FeedMetrics;
use crate::transport::EventSource;

/// Which event tags a consumer accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventFilter {
    All,
    Except(HashSet<String>),
    Only(HashSet<String>),
}

impl EventFilter {
    pub fn except<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        EventFilter::Except(tags.into_iter().map(Into::into).collect())
    }

    pub fn only<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        EventFilter::Only(tags.into_iter().map(Into::into).collect())
    }

    pub fn accepts(&self, event_type: &str) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::Except(tags) => !tags.contains(event_type),
            EventFilter::Only(tags) => tags.contains(event_type),
        }
    }
}

/// The two presentation surfaces of the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsumerKind {
    /// Full activity feed; hides ticks and player counts.
    FeedPanel,
    /// Scrolling market ticker; exchange fills only.
    Ticker,
}

impl ConsumerKind {
    pub const ALL: [ConsumerKind; 2] = [ConsumerKind::FeedPanel, ConsumerKind::Ticker];

    pub fn name(self) -> &'static str {
        match self {
            ConsumerKind::FeedPanel => "feed_panel",
            ConsumerKind::Ticker => "ticker",
        }
    }

    pub fn filter(self) -> EventFilter {
        match self {
            ConsumerKind::FeedPanel => {
                EventFilter::except([EventKind::Tick.tag(), EventKind::PlayerStats.tag()])
            }
            ConsumerKind::Ticker => EventFilter::only([EventKind::ExchangeFill.tag()]),
        }
    }
}

/// Filter, history and published view for one surface.
#[derive(Debug)]
pub struct Consumer {
    name: String,
    filter: EventFilter,
    buffer: Mutex<HistoryBuffer>,
    entries: watch::Sender<Vec<FormattedEntry>>,
    metrics: Arc<FeedMetrics>,
}

impl Consumer {
    pub fn new(
        name: impl Into<String>,
        filter: EventFilter,
        capacity: usize,
        metrics: Arc<FeedMetrics>,
    ) -> Self {
        Self {
            name: name.into(),
            filter,
            buffer: Mutex::new(HistoryBuffer::new(capacity)),
            entries: watch::Sender::new(Vec::new()),
            metrics,
        }
    }

    pub fn for_kind(kind: ConsumerKind, capacity: usize, metrics: Arc<FeedMetrics>) -> Self {
        Self::new(kind.name(), kind.filter(), capacity, metrics)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }

    /// Newest-first entries; updated after every push.
    pub fn entries(&self) -> watch::Receiver<Vec<FormattedEntry>> {
        self.entries.subscribe()
    }

    pub fn snapshot(&self) -> Vec<FormattedEntry> {
        self.entries.borrow().clone()
    }

    /// True while nothing has been pushed; the surface shows a placeholder.
    pub fn is_waiting(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Filter, format and record one event.
    ///
    /// Returns the new entry, or `None` when the event was filtered out or
    /// rendered to nothing.
    pub fn accept(&self, event: &Ingested) -> Option<FormattedEntry> {
        let event_type = event.envelope.event_type.as_str();
        if !self.filter.accepts(event_type) {
            self.metrics.record_filtered();
            debug!(consumer = %self.name, event_type, "Event filtered");
            return None;
        }

        let formatted = formatter::format_envelope(&event.envelope);
        if formatted.is_empty() {
            self.metrics.record_empty();
            debug!(consumer = %self.name, event_type, "Event rendered empty, skipping");
            return None;
        }

        let mut buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = buffer
            .push(formatted, event_type, event.occurred_at())
            .clone();
        self.entries.send_replace(buffer.snapshot());
        drop(buffer);

        self.metrics.record_pushed();
        debug!(consumer = %self.name, entry_id = %entry.id, event_type, "Entry pushed");
        Some(entry)
    }
}

impl FrameSink for Consumer {
    fn deliver(&self, event: &Ingested) {
        self.accept(event);
    }
}

/// A consumer with its own connection, mounted and unmounted with the
/// surface that displays it.
#[derive(Debug)]
pub struct Surface {
    consumer: Arc<Consumer>,
    manager: ConnectionManager,
}

impl Surface {
    pub fn new(
        kind: ConsumerKind,
        source: Arc<dyn EventSource>,
        config: &FeedConfig,
        metrics: Arc<FeedMetrics>,
    ) -> Self {
        let consumer = Arc::new(Consumer::for_kind(
            kind,
            config.history_capacity,
            Arc::clone(&metrics),
        ));
        let manager = ConnectionManager::new(
            source,
            Arc::clone(&consumer) as Arc<dyn FrameSink>,
            config.retry_delay,
            metrics,
        );
        Self { consumer, manager }
    }

    /// Start connecting. Must be called from within a Tokio runtime.
    pub fn mount(&mut self) {
        debug!(consumer = %self.consumer.name(), "Mounting surface");
        self.manager.start();
    }

    /// Close the connection and cancel any pending retry.
    pub fn unmount(&mut self) {
        debug!(consumer = %self.consumer.name(), "Unmounting surface");
        self.manager.stop();
    }

    pub fn entries(&self) -> watch::Receiver<Vec<FormattedEntry>> {
        self.consumer.entries()
    }

    pub fn status(&self) -> watch::Receiver<ConnectionStatus> {
        self.manager.status()
    }

    pub fn consumer(&self) -> &Consumer {
        &self.consumer
    }

    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }
}
