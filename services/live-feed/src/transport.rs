//! Push-stream transport
//!
//! An [`EventSource`] opens one long-lived stream and yields decoded frame
//! payloads. The connection manager owns at most one open stream at a
//! time; dropping the stream closes the underlying connection.

use std::collections::VecDeque;
use std::fmt;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, Stream, StreamExt};
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use reqwest::{Client, Url};
use tracing::debug;

use feed_types::errors::{FeedError, TransportError};

use crate::config::FeedConfig;
use crate::sse::SseDecoder;

/// Frame payloads of one open stream, in arrival order.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String, TransportError>> + Send>>;

/// Something that can open the `/events` stream.
#[async_trait]
pub trait EventSource: Send + Sync + 'static {
    /// Open a new stream. Each call is an independent connection.
    async fn open(&self) -> Result<FrameStream, TransportError>;
}

/// `text/event-stream` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpEventSource {
    client: Client,
    url: Url,
}

impl HttpEventSource {
    pub fn new(url: Url, connect_timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| TransportError::Request {
                message: e.to_string(),
            })?;
        Ok(Self { client, url })
    }

    pub fn from_config(config: &FeedConfig) -> Result<Self, FeedError> {
        let url = config.events_url()?;
        Ok(Self::new(url, config.connect_timeout)?)
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl EventSource for HttpEventSource {
    async fn open(&self) -> Result<FrameStream, TransportError> {
        debug!(url = %self.url, "Opening event stream");
        let response = self
            .client
            .get(self.url.clone())
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|e| TransportError::Request {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
            });
        }

        Ok(decode_frames(response.bytes_stream()))
    }
}

/// Adapt a byte-chunk stream into a stream of SSE frame payloads.
///
/// The first chunk error ends the useful life of the stream; the manager
/// drops it and reconnects.
pub fn decode_frames<S, B, E>(bytes: S) -> FrameStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    let state = (Box::pin(bytes), SseDecoder::new(), VecDeque::new());
    Box::pin(stream::unfold(
        state,
        |(mut bytes, mut decoder, mut pending)| async move {
            loop {
                if let Some(frame) = pending.pop_front() {
                    return Some((Ok(frame), (bytes, decoder, pending)));
                }
                match bytes.next().await {
                    Some(Ok(chunk)) => pending.extend(decoder.feed(chunk.as_ref())),
                    Some(Err(err)) => {
                        let err = TransportError::Stream {
                            message: err.to_string(),
                        };
                        return Some((Err(err), (bytes, decoder, pending)));
                    }
                    None => return None,
                }
            }
        },
    ))
}
