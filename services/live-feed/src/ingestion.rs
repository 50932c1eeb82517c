//! Frame ingestion layer
//!
//! Turns raw stream frames into event envelopes. Malformed frames are
//! dropped silently: they are counted and logged at debug, never surfaced
//! to consumers and never fatal to the connection.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use feed_types::envelope::EventEnvelope;
use feed_types::errors::DecodeError;

use crate::metrics::FeedMetrics;

/// An envelope plus the local time it arrived.
#[derive(Debug, Clone, PartialEq)]
pub struct Ingested {
    pub envelope: EventEnvelope,
    /// Unix milliseconds on arrival
    pub arrived_at: i64,
}

impl Ingested {
    /// Display time: the envelope timestamp when valid, else arrival.
    pub fn occurred_at(&self) -> i64 {
        self.envelope.occurred_at(self.arrived_at)
    }
}

/// Result of ingesting a single frame.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestionResult {
    Accepted(Ingested),
    Dropped(DecodeError),
}

/// Decodes frames for one connection manager.
#[derive(Debug)]
pub struct FrameIngester {
    metrics: Arc<FeedMetrics>,
    frames_accepted: u64,
    frames_dropped: u64,
}

impl FrameIngester {
    pub fn new(metrics: Arc<FeedMetrics>) -> Self {
        Self {
            metrics,
            frames_accepted: 0,
            frames_dropped: 0,
        }
    }

    /// Ingest one frame payload, stamping it with the current time.
    pub fn ingest(&mut self, frame: &str) -> IngestionResult {
        self.ingest_at(frame, Utc::now().timestamp_millis())
    }

    pub fn ingest_at(&mut self, frame: &str, arrived_at: i64) -> IngestionResult {
        self.metrics.record_frame();

        match EventEnvelope::decode(frame) {
            Ok(envelope) => {
                self.frames_accepted += 1;
                debug!(
                    event_type = %envelope.event_type,
                    arrived_at,
                    "Frame accepted"
                );
                IngestionResult::Accepted(Ingested {
                    envelope,
                    arrived_at,
                })
            }
            Err(err) => {
                self.frames_dropped += 1;
                self.metrics.record_malformed();
                debug!(error = %err, frame_len = frame.len(), "Dropping malformed frame");
                IngestionResult::Dropped(err)
            }
        }
    }

    /// Total frames decoded since creation.
    pub fn frames_accepted(&self) -> u64 {
        self.frames_accepted
    }

    /// Total malformed frames since creation.
    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped
    }
}
