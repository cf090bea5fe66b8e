//! User event stream over the Mastodon streaming WebSocket
//!
//! A reader task decodes frames into [`Event`]s and forwards them on a
//! bounded channel. The stream is never reconnected: when the socket drops
//! the channel closes and the dispatcher treats that as fatal.

use futures_util::{Stream, StreamExt};
use reqwest::Url;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::{debug, info, warn};

use crate::error::{BotError, Result};
use crate::model::{Event, Notification, Status};

/// Each item is either a decoded event or a fatal decoding failure
pub type StreamItem = Result<Event>;

const STREAM_CHANNEL_CAPACITY: usize = 256;

/// Raw streaming frame: `{"event": "...", "payload": "..."}`
#[derive(Debug, Deserialize)]
struct Frame {
    event: String,
    #[serde(default)]
    payload: Option<String>,
}

pub struct EventStream;

impl EventStream {
    /// Build the user stream URL from the advertised streaming endpoint,
    /// falling back to the server URL with a WebSocket scheme.
    pub fn user_stream_url(
        server: &str,
        streaming_api: Option<&str>,
        access_token: &str,
    ) -> Result<Url> {
        let base = match streaming_api {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => server.to_string(),
        };
        let mut url = Url::parse(&base)
            .map_err(|e| BotError::Stream(format!("streaming URL {:?}: {}", base, e)))?;

        let scheme = match url.scheme() {
            "https" | "wss" => "wss",
            _ => "ws",
        };
        url.set_scheme(scheme)
            .map_err(|_| BotError::Stream(format!("cannot use {} for {:?}", scheme, base)))?;

        url.set_path("/api/v1/streaming");
        url.query_pairs_mut()
            .clear()
            .append_pair("stream", "user")
            .append_pair("access_token", access_token);
        Ok(url)
    }

    /// Connect and spawn the reader task
    pub async fn connect(url: Url) -> Result<mpsc::Receiver<StreamItem>> {
        let (socket, _) = connect_async(url.as_str())
            .await
            .map_err(|e| BotError::Stream(e.to_string()))?;

        info!(host = url.host_str().unwrap_or_default(), "Connected to user stream");

        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);

        tokio::spawn(forward_messages(socket, tx));

        Ok(rx)
    }
}

/// Pump socket messages into `tx` until the socket ends.
///
/// Text frames are decoded and forwarded; a malformed frame is forwarded
/// as an error and ends the stream. A transport error is forwarded as
/// [`Event::Error`] and ends the stream. Ping, pong and binary frames are
/// skipped.
pub(crate) async fn forward_messages<S>(messages: S, tx: mpsc::Sender<StreamItem>)
where
    S: Stream<Item = std::result::Result<Message, WsError>>,
{
    let mut messages = std::pin::pin!(messages);
    while let Some(message) = messages.next().await {
        match message {
            Ok(Message::Text(text)) => {
                let item = decode_frame(&text);
                let malformed = item.is_err();
                if tx.send(item).await.is_err() || malformed {
                    break;
                }
            }
            Ok(Message::Close(frame)) => {
                warn!(?frame, "Stream closed by server");
                break;
            }
            Ok(_) => continue,
            Err(e) => {
                let _ = tx.send(Ok(Event::Error(e.to_string()))).await;
                break;
            }
        }
    }
    debug!("Stream reader finished");
}

/// Decode one text frame from the streaming API
pub fn decode_frame(text: &str) -> Result<Event> {
    let frame: Frame = serde_json::from_str(text)
        .map_err(|e| BotError::MalformedEvent(format!("{}: {}", e, truncate(text))))?;

    let payload = || {
        frame
            .payload
            .as_deref()
            .ok_or_else(|| BotError::MalformedEvent(format!("{} without payload", frame.event)))
    };

    let event = match frame.event.as_str() {
        "update" => {
            let status: Status = serde_json::from_str(payload()?)
                .map_err(|e| BotError::MalformedEvent(format!("update: {}", e)))?;
            Event::Update(Box::new(status))
        }
        "notification" => {
            let notification: Notification = serde_json::from_str(payload()?)
                .map_err(|e| BotError::MalformedEvent(format!("notification: {}", e)))?;
            Event::Notification(Box::new(notification))
        }
        "delete" => Event::Delete(payload()?.to_string()),
        other => Event::Unknown(other.to_string()),
    };
    Ok(event)
}

fn truncate(text: &str) -> &str {
    match text.char_indices().nth(120) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
