//! Server-Sent Events transport over HTTP
//!
//! Issues a `GET` with `Accept: text/event-stream` through `reqwest`, checks
//! the response status and content type, then spawns a reader task that feeds
//! the body into an `SseDecoder`. The request is scoped to the subscribed
//! channels with a `channels=` query parameter and resumed with
//! `Last-Event-ID`.

use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use reqwest::{Client, Url};
use tokio::sync::mpsc;

use crate::error::TransportError;

use super::message::EventMessage;
use super::sse::SseDecoder;
use super::transport::{ConnectRequest, EventReceiver, EventTransport};

const LAST_EVENT_ID: &str = "Last-Event-ID";

/// SSE transport over HTTP(S)
#[derive(Debug, Clone)]
pub struct HttpEventTransport {
    client: Client,
    url: Url,
    channel_capacity: usize,
}

impl HttpEventTransport {
    /// Create a transport for an `http://` or `https://` endpoint
    pub fn from_url(url: &str) -> Result<Self, TransportError> {
        let client = Client::builder().build()?;
        Self::with_client(client, url)
    }

    /// Create a transport sharing an existing HTTP client
    pub fn with_client(client: Client, url: &str) -> Result<Self, TransportError> {
        let url = Url::parse(url)
            .map_err(|e| TransportError::ConnectFailed(format!("invalid URL {}: {}", url, e)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(TransportError::ConnectFailed(format!(
                "unsupported URL scheme: {}",
                url.scheme()
            )));
        }
        if url.host_str().is_none() {
            return Err(TransportError::ConnectFailed(format!("missing host in URL: {}", url)));
        }

        Ok(Self {
            client,
            url,
            channel_capacity: 256,
        })
    }

    /// Set the buffered message capacity
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Endpoint URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// URL requested for `request`, including the channel query
    pub fn request_url(&self, request: &ConnectRequest) -> Url {
        let mut url = self.url.clone();
        if request.channels.is_empty() {
            return url;
        }

        let scoped = format!("channels={}", request.channels.join(","));
        let query = match url.query() {
            Some(existing) if !existing.is_empty() => format!("{}&{}", existing, scoped),
            _ => scoped,
        };
        url.set_query(Some(&query));
        url
    }
}

impl EventTransport for HttpEventTransport {
    async fn open(&self, request: ConnectRequest) -> Result<EventReceiver, TransportError> {
        let url = self.request_url(&request);

        let mut builder = self
            .client
            .get(url.clone())
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache");
        if let Some(ref id) = request.last_event_id {
            builder = builder.header(LAST_EVENT_ID, id.as_str());
        }

        let mut response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::BadStatus(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();
        if !content_type.starts_with("text/event-stream") {
            return Err(TransportError::InvalidResponse(format!(
                "unexpected content type: {:?}",
                content_type
            )));
        }

        tracing::debug!(
            url = %url,
            channels = ?request.channels,
            resume = ?request.last_event_id,
            "Event stream opened"
        );

        let (tx, rx) = mpsc::channel(self.channel_capacity);

        tokio::spawn(async move {
            let mut decoder = SseDecoder::new();

            let err = loop {
                let chunk = tokio::select! {
                    chunk = response.chunk() => chunk,
                    // Receiver gone; dropping the response closes the connection
                    _ = tx.closed() => return,
                };

                match chunk {
                    Ok(Some(bytes)) => {
                        if !deliver(&mut decoder, &bytes, &tx).await {
                            return;
                        }
                    }
                    Ok(None) => break TransportError::Closed,
                    Err(e) => break TransportError::from(e),
                }
            };

            let _ = tx.send(Err(err)).await;
        });

        Ok(rx)
    }
}

/// Forward decoded events; `false` once the receiver is gone
async fn deliver(
    decoder: &mut SseDecoder,
    bytes: &[u8],
    tx: &mpsc::Sender<Result<EventMessage, TransportError>>,
) -> bool {
    for event in decoder.feed(bytes) {
        if tx.send(Ok(event)).await.is_err() {
            return false;
        }
    }
    true
}
