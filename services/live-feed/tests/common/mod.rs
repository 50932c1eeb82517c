//! Scripted event source shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::future;
use futures::stream::{self, StreamExt};
use serde_json::{json, Value};

use feed_types::errors::TransportError;
use live_feed::{EventSource, FrameStream};

/// How a scripted connection ends after its frames.
#[derive(Debug, Clone, Copy)]
pub enum End {
    /// Server closes the stream.
    Close,
    /// Body fails mid-stream.
    Error,
    /// Stays open until dropped.
    Hold,
}

#[derive(Debug, Clone)]
pub enum Step {
    /// `open()` fails.
    Refuse,
    /// `open()` never completes.
    Stall,
    Serve(Vec<String>, End),
}

/// Counts connections that are currently open.
struct LiveGuard(Arc<Counters>);

impl LiveGuard {
    fn new(counters: Arc<Counters>) -> Self {
        let live = counters.live.fetch_add(1, Ordering::SeqCst) + 1;
        counters.max_live.fetch_max(live, Ordering::SeqCst);
        Self(counters)
    }
}

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.live.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct Counters {
    pub attempts: AtomicUsize,
    pub live: AtomicUsize,
    pub max_live: AtomicUsize,
}

/// Plays one step per `open()`; once the script runs out every further
/// connection opens and stays silent.
pub struct ScriptedSource {
    steps: Mutex<VecDeque<Step>>,
    pub counters: Arc<Counters>,
}

impl ScriptedSource {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            counters: Arc::new(Counters::default()),
        })
    }

    pub fn attempts(&self) -> usize {
        self.counters.attempts.load(Ordering::SeqCst)
    }

    pub fn live(&self) -> usize {
        self.counters.live.load(Ordering::SeqCst)
    }

    pub fn max_live(&self) -> usize {
        self.counters.max_live.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventSource for ScriptedSource {
    async fn open(&self) -> Result<FrameStream, TransportError> {
        self.counters.attempts.fetch_add(1, Ordering::SeqCst);
        let step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Step::Serve(Vec::new(), End::Hold));

        let (frames, end) = match step {
            Step::Refuse => {
                return Err(TransportError::Request {
                    message: "connection refused".to_string(),
                })
            }
            Step::Stall => return future::pending().await,
            Step::Serve(frames, end) => (frames, end),
        };

        let guard = LiveGuard::new(Arc::clone(&self.counters));
        let body = stream::iter(frames.into_iter().map(Ok));
        let tail: FrameStream = match end {
            End::Close => Box::pin(stream::empty()),
            End::Error => Box::pin(stream::once(async {
                Err(TransportError::Stream {
                    message: "connection reset".to_string(),
                })
            })),
            End::Hold => Box::pin(stream::pending()),
        };
        Ok(Box::pin(body.chain(tail).map(move |item| {
            let _held = &guard;
            item
        })))
    }
}

/// Serves an endless stream of joins, yielding between frames.
pub struct FloodSource;

#[async_trait]
impl EventSource for FloodSource {
    async fn open(&self) -> Result<FrameStream, TransportError> {
        let frames = stream::unfold(0u64, |n| async move {
            tokio::task::yield_now().await;
            Some((Ok(joined(&format!("P{}", n))), n + 1))
        });
        Ok(Box::pin(frames))
    }
}

pub fn frame(event_type: &str, data: Value) -> String {
    json!({"type": event_type, "data": data}).to_string()
}

pub fn joined(player: &str) -> String {
    frame("player_joined", json!({"player": player}))
}
