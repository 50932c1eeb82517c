//! Unmount on a multi-threaded runtime
//!
//! The driver task runs on another worker while `unmount()` is called, so
//! these check that nothing lands in a history after it returns.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::FloodSource;
use feed_types::entry::FormattedEntry;
use live_feed::metrics::FeedMetrics;
use live_feed::{Consumer, ConsumerKind, FeedConfig, SharedFeed, Surface};

const RUNS: usize = 50;

fn newest(consumer: &Consumer) -> Option<FormattedEntry> {
    consumer.snapshot().into_iter().next()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_surface_unmount_stops_deliveries() {
    for _ in 0..RUNS {
        let metrics = Arc::new(FeedMetrics::new());
        let mut surface = Surface::new(
            ConsumerKind::FeedPanel,
            Arc::new(FloodSource),
            &FeedConfig::default(),
            Arc::clone(&metrics),
        );
        surface.mount();
        tokio::time::sleep(Duration::from_millis(2)).await;
        surface.unmount();

        let before = newest(surface.consumer()).map(|e| e.id);
        let pushed = metrics.snapshot().entries_pushed;
        tokio::time::sleep(Duration::from_millis(5)).await;

        assert_eq!(newest(surface.consumer()).map(|e| e.id), before);
        assert_eq!(metrics.snapshot().entries_pushed, pushed);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_shared_feed_unmount_stops_deliveries() {
    for _ in 0..RUNS {
        let metrics = Arc::new(FeedMetrics::new());
        let mut feed = SharedFeed::for_kinds(
            Arc::new(FloodSource),
            &ConsumerKind::ALL,
            &FeedConfig::default(),
            Arc::clone(&metrics),
        );
        feed.mount();
        tokio::time::sleep(Duration::from_millis(2)).await;
        feed.unmount();

        let panel = feed.consumer("feed_panel").unwrap();
        let before = newest(panel).map(|e| e.id);
        let pushed = metrics.snapshot().entries_pushed;
        tokio::time::sleep(Duration::from_millis(5)).await;

        assert_eq!(newest(panel).map(|e| e.id), before);
        assert_eq!(metrics.snapshot().entries_pushed, pushed);
    }
}
