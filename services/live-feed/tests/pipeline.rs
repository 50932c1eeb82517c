//! End-to-end pipeline: frames in, rendered entries out.

mod common;

use std::sync::Arc;

use serde_json::json;

use common::{frame, joined, End, ScriptedSource, Step};
use feed_types::entry::FormattedEntry;
use live_feed::metrics::FeedMetrics;
use live_feed::{ConsumerKind, FeedConfig, Surface};

fn mounted(kind: ConsumerKind, frames: Vec<String>) -> (Surface, Arc<FeedMetrics>) {
    let metrics = Arc::new(FeedMetrics::new());
    let source = ScriptedSource::new(vec![Step::Serve(frames, End::Hold)]);
    let mut surface = Surface::new(kind, source, &FeedConfig::default(), Arc::clone(&metrics));
    surface.mount();
    (surface, metrics)
}

async fn settle(surface: &Surface) {
    let mut status = surface.status();
    status.wait_for(|s| s.connected).await.unwrap();
    tokio::task::yield_now().await;
}

#[tokio::test(start_paused = true)]
async fn test_sixty_frames_keep_newest_fifty() {
    let frames = (0..60).map(|i| joined(&format!("P{}", i))).collect();
    let (surface, metrics) = mounted(ConsumerKind::FeedPanel, frames);

    let mut entries = surface.entries();
    let view = entries
        .wait_for(|v| v.first().is_some_and(|e| e.plain_text() == "P59 joined the galaxy"))
        .await
        .unwrap()
        .clone();

    assert_eq!(view.len(), 50);
    let expected: Vec<String> = (10..60)
        .rev()
        .map(|i| format!("P{} joined the galaxy", i))
        .collect();
    let actual: Vec<String> = view.iter().map(FormattedEntry::plain_text).collect();
    assert_eq!(actual, expected);
    assert!(view.windows(2).all(|w| w[0].id > w[1].id));
    assert_eq!(metrics.snapshot().entries_pushed, 60);
}

#[tokio::test(start_paused = true)]
async fn test_panel_skips_tick_and_stats() {
    let (surface, metrics) = mounted(
        ConsumerKind::FeedPanel,
        vec![
            frame("tick", json!({"tick": 1})),
            frame("player_stats", json!({"online_players": 20})),
        ],
    );
    settle(&surface).await;

    assert!(surface.consumer().is_waiting());
    assert!(surface.entries().borrow().is_empty());
    assert_eq!(metrics.snapshot().entries_filtered, 2);
    assert_eq!(metrics.snapshot().frames_received, 2);
}

#[tokio::test(start_paused = true)]
async fn test_malformed_frames_are_dropped_silently() {
    let (surface, metrics) = mounted(
        ConsumerKind::FeedPanel,
        vec![
            "{not json".to_string(),
            r#"{"data":{"player":"Ann"}}"#.to_string(),
            joined("Ann"),
        ],
    );
    settle(&surface).await;

    let view = surface.entries().borrow().clone();
    assert_eq!(view.len(), 1);
    assert_eq!(view[0].plain_text(), "Ann joined the galaxy");
    assert_eq!(metrics.snapshot().frames_malformed, 2);
}

#[tokio::test(start_paused = true)]
async fn test_script_payload_never_rendered_raw() {
    let attack = "<script>alert(1)</script>";
    let (surface, _) = mounted(
        ConsumerKind::FeedPanel,
        vec![
            frame("chat", json!({"sender": attack, "channel": attack, "message": attack})),
            frame("wormhole_opened", json!({"player": attack, "system_name": attack})),
            json!({
                "type": "player_joined",
                "data": {"player": "Ann"},
                "player_info": {"Ann": {"empire": attack, "faction_tag": attack}}
            })
            .to_string(),
        ],
    );
    settle(&surface).await;

    let view = surface.entries().borrow().clone();
    assert_eq!(view.len(), 3);
    for entry in &view {
        let markup = entry.rendered_text();
        assert!(!markup.contains("<script>"), "{}", markup);
        assert!(markup.contains("&lt;script&gt;"), "{}", markup);
    }
    // the unknown tag keeps its fallback rendering and default icon
    assert_eq!(view[1].event_type, "wormhole_opened");
    assert_eq!(view[1].icon.key(), "signal");
}

#[tokio::test(start_paused = true)]
async fn test_ticker_shows_fills_only() {
    let (surface, _) = mounted(
        ConsumerKind::Ticker,
        vec![
            frame(
                "trade",
                json!({"seller": "Ann", "buyer": "Bob", "quantity": 5, "item_name": "Ore"}),
            ),
            frame(
                "exchange_fill",
                json!({
                    "buyer": "Bob",
                    "seller": "Ann",
                    "quantity": 1500,
                    "item_name": "Ice",
                    "price": 2.5
                }),
            ),
        ],
    );
    settle(&surface).await;

    let view = surface.entries().borrow().clone();
    assert_eq!(view.len(), 1);
    assert_eq!(
        view[0].plain_text(),
        "Bob bought 1,500x Ice from Ann at 2.5 cr each (3,750 cr total)"
    );
}

#[tokio::test(start_paused = true)]
async fn test_envelope_timestamp_sets_occurred_at() {
    let (surface, _) = mounted(
        ConsumerKind::FeedPanel,
        vec![json!({
            "type": "player_joined",
            "data": {"player": "Ann"},
            "timestamp": "2024-02-17T00:00:00Z"
        })
        .to_string()],
    );
    settle(&surface).await;
    assert_eq!(surface.entries().borrow()[0].occurred_at, 1_708_128_000_000);
}
