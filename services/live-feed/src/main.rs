use anyhow::Context;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use feed_types::entry::{EntryId, FormattedEntry};
use live_feed::{ConnectionStatus, FeedConfig, SharedFeed};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = FeedConfig::from_env().context("invalid feed configuration")?;
    let mut feed = SharedFeed::from_config(&config).context("failed to set up feed")?;

    info!(origin = %config.origin, path = %config.events_path, "Starting live feed");

    for consumer in feed.consumers() {
        tokio::spawn(log_entries(consumer.name().to_string(), consumer.entries()));
    }
    tokio::spawn(log_status(feed.status()));

    feed.mount();
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;

    feed.unmount();
    let metrics = serde_json::to_string(&feed.metrics().snapshot())?;
    info!(%metrics, "Live feed stopped");
    Ok(())
}

/// Log entries as they arrive, oldest first.
async fn log_entries(consumer: String, mut entries: watch::Receiver<Vec<FormattedEntry>>) {
    let mut last_seen = EntryId::new(0);
    while entries.changed().await.is_ok() {
        let view = entries.borrow_and_update().clone();
        let fresh: Vec<&FormattedEntry> = view.iter().take_while(|e| e.id > last_seen).collect();
        for entry in fresh.iter().rev() {
            info!(
                consumer = %consumer,
                id = %entry.id,
                icon = %entry.icon,
                "{}",
                entry.plain_text()
            );
        }
        if let Some(newest) = view.first() {
            last_seen = newest.id;
        }
    }
}

async fn log_status(mut status: watch::Receiver<ConnectionStatus>) {
    while status.changed().await.is_ok() {
        let current = *status.borrow_and_update();
        info!(connected = current.connected, "{}", current.text);
    }
}
