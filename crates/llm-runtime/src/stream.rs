//! Streaming Channel
//!
//! One worker task per stream owns the HTTP response, decodes
//! server-sent `data:` frames and forwards text deltas over a bounded
//! channel. The response is dropped when the worker returns, whichever way
//! it returns: end of body, read error, consumer gone or cancellation.

use futures::StreamExt;
use llm_core::TextStream;
use reqwest::Response;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Deltas buffered between the worker and the consumer
pub const CHANNEL_CAPACITY: usize = 32;

const DONE_MARKER: &str = "[DONE]";

#[derive(Debug, Deserialize)]
struct ChunkFrame {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Decode one line of a chat-completion event stream into a text delta
fn parse_line(line: &[u8]) -> Option<String> {
    let line = std::str::from_utf8(line).ok()?.trim();
    let data = line.strip_prefix("data:")?.trim();
    if data.is_empty() || data == DONE_MARKER {
        return None;
    }

    let frame: ChunkFrame = match serde_json::from_str(data) {
        Ok(frame) => frame,
        Err(e) => {
            warn!(error = %e, "skipping malformed stream frame");
            return None;
        }
    };

    frame
        .choices
        .into_iter()
        .next()?
        .delta
        .content
        .filter(|content| !content.is_empty())
}

/// Hand the response body to a worker task and return the consumer end
pub(crate) fn spawn_delta_stream(response: Response, cancel: Option<CancellationToken>) -> TextStream {
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    let cancel = cancel.unwrap_or_default();

    tokio::spawn(async move {
        let mut body = response.bytes_stream();
        let mut buffer: Vec<u8> = Vec::new();

        loop {
            let chunk = tokio::select! {
                () = cancel.cancelled() => {
                    debug!("stream cancelled");
                    return;
                }
                () = tx.closed() => {
                    debug!("stream consumer dropped");
                    return;
                }
                chunk = body.next() => chunk,
            };

            match chunk {
                Some(Ok(bytes)) => {
                    buffer.extend_from_slice(&bytes);
                    while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                        let line: Vec<u8> = buffer.drain(..=pos).collect();
                        if let Some(delta) = parse_line(&line) {
                            if !forward(&tx, &cancel, delta).await {
                                return;
                            }
                        }
                    }
                }
                Some(Err(e)) => {
                    warn!(error = %e, "stream read failed");
                    return;
                }
                None => break,
            }
        }

        if let Some(delta) = parse_line(&buffer) {
            forward(&tx, &cancel, delta).await;
        }
    });

    Box::pin(ReceiverStream::new(rx))
}

/// Push one delta; `false` once the worker should stop
async fn forward(tx: &mpsc::Sender<String>, cancel: &CancellationToken, delta: String) -> bool {
    tokio::select! {
        () = cancel.cancelled() => false,
        sent = tx.send(delta) => sent.is_ok(),
    }
}
