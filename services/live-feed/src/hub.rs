//! Shared feed
//!
//! One connection fanned out to several consumers. Every consumer sees
//! every envelope in arrival order and applies its own filter.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use feed_types::entry::FormattedEntry;
use feed_types::errors::FeedError;

use crate::config::FeedConfig;
use crate::connection::{ConnectionManager, ConnectionState, ConnectionStatus, FrameSink};
use crate::consumer::{Consumer, ConsumerKind};
use crate::ingestion::Ingested;
use crate::metrics::FeedMetrics;
use crate::transport::{EventSource, HttpEventSource};

/// Delivers each envelope to every consumer, in registration order.
#[derive(Debug, Default)]
struct Fanout {
    consumers: Vec<Arc<Consumer>>,
}

impl FrameSink for Fanout {
    fn deliver(&self, event: &Ingested) {
        for consumer in &self.consumers {
            consumer.accept(event);
        }
    }
}

#[derive(Debug)]
pub struct SharedFeed {
    fanout: Arc<Fanout>,
    manager: ConnectionManager,
    metrics: Arc<FeedMetrics>,
}

impl SharedFeed {
    pub fn new(
        source: Arc<dyn EventSource>,
        consumers: Vec<Consumer>,
        config: &FeedConfig,
        metrics: Arc<FeedMetrics>,
    ) -> Self {
        let fanout = Arc::new(Fanout {
            consumers: consumers.into_iter().map(Arc::new).collect(),
        });
        let manager = ConnectionManager::new(
            source,
            Arc::clone(&fanout) as Arc<dyn FrameSink>,
            config.retry_delay,
            Arc::clone(&metrics),
        );
        Self {
            fanout,
            manager,
            metrics,
        }
    }

    /// One consumer per kind over a single connection.
    pub fn for_kinds(
        source: Arc<dyn EventSource>,
        kinds: &[ConsumerKind],
        config: &FeedConfig,
        metrics: Arc<FeedMetrics>,
    ) -> Self {
        let consumers = kinds
            .iter()
            .map(|kind| Consumer::for_kind(*kind, config.history_capacity, Arc::clone(&metrics)))
            .collect();
        Self::new(source, consumers, config, metrics)
    }

    /// Feed panel and ticker over HTTP, as configured.
    pub fn from_config(config: &FeedConfig) -> Result<Self, FeedError> {
        config.validate()?;
        let source = Arc::new(HttpEventSource::from_config(config)?);
        info!(url = %source.url(), "Shared feed configured");
        Ok(Self::for_kinds(
            source,
            &ConsumerKind::ALL,
            config,
            Arc::new(FeedMetrics::new()),
        ))
    }

    /// Start connecting. Must be called from within a Tokio runtime.
    pub fn mount(&mut self) {
        self.manager.start();
    }

    pub fn unmount(&mut self) {
        self.manager.stop();
    }

    pub fn consumers(&self) -> impl Iterator<Item = &Consumer> {
        self.fanout.consumers.iter().map(Arc::as_ref)
    }

    pub fn consumer(&self, name: &str) -> Option<&Consumer> {
        self.consumers().find(|consumer| consumer.name() == name)
    }

    pub fn entries(&self, name: &str) -> Option<watch::Receiver<Vec<FormattedEntry>>> {
        self.consumer(name).map(Consumer::entries)
    }

    pub fn status(&self) -> watch::Receiver<ConnectionStatus> {
        self.manager.status()
    }

    pub fn state(&self) -> ConnectionState {
        self.manager.state()
    }

    pub fn metrics(&self) -> &Arc<FeedMetrics> {
        &self.metrics
    }
}
