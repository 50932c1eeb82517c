//! Counters for the feed pipeline
//!
//! Shared between the connection driver and its consumers. All counters
//! are monotonic and updated with relaxed ordering.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub struct FeedMetrics {
    // Frames
    pub frames_received: AtomicU64,
    pub frames_malformed: AtomicU64,

    // Consumers
    pub entries_pushed: AtomicU64,
    pub entries_filtered: AtomicU64,
    pub entries_empty: AtomicU64,

    // Connection
    pub connection_attempts: AtomicU64,
    pub connections_opened: AtomicU64,
    pub disconnects: AtomicU64,
}

impl FeedMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_frame(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_malformed(&self) {
        self.frames_malformed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_pushed(&self) {
        self.entries_pushed.fetch_add(1, Ordering::Relaxed);
    }

    /// Event rejected by a consumer's filter.
    pub fn record_filtered(&self) {
        self.entries_filtered.fetch_add(1, Ordering::Relaxed);
    }

    /// Event whose template rendered nothing.
    pub fn record_empty(&self) {
        self.entries_empty.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_attempt(&self) {
        self.connection_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_opened(&self) {
        self.connections_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            frames_malformed: self.frames_malformed.load(Ordering::Relaxed),
            entries_pushed: self.entries_pushed.load(Ordering::Relaxed),
            entries_filtered: self.entries_filtered.load(Ordering::Relaxed),
            entries_empty: self.entries_empty.load(Ordering::Relaxed),
            connection_attempts: self.connection_attempts.load(Ordering::Relaxed),
            connections_opened: self.connections_opened.load(Ordering::Relaxed),
            disconnects: self.disconnects.load(Ordering::Relaxed),
        }
    }

    /// Export metrics as a BTreeMap keyed by counter name.
    pub fn export(&self) -> BTreeMap<String, u64> {
        let s = self.snapshot();
        let mut m = BTreeMap::new();
        m.insert("frames_received".to_string(), s.frames_received);
        m.insert("frames_malformed".to_string(), s.frames_malformed);
        m.insert("entries_pushed".to_string(), s.entries_pushed);
        m.insert("entries_filtered".to_string(), s.entries_filtered);
        m.insert("entries_empty".to_string(), s.entries_empty);
        m.insert("connection_attempts".to_string(), s.connection_attempts);
        m.insert("connections_opened".to_string(), s.connections_opened);
        m.insert("disconnects".to_string(), s.disconnects);
        m
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub frames_received: u64,
    pub frames_malformed: u64,
    pub entries_pushed: u64,
    pub entries_filtered: u64,
    pub entries_empty: u64,
    pub connection_attempts: u64,
    pub connections_opened: u64,
    pub disconnects: u64,
}
