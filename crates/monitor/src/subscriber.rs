//! Broker subscription over the WebSocket bridge.
//!
//! Connects to the broker's WebSocket endpoint, subscribes to
//! `<prefix>/#`, and forwards every published message into the ingest
//! channel. Reconnects with a fixed delay when the connection drops.
//! The bridge frames each published message as
//! `{"topic": "<routing key>", "payload": "<raw payload>"}`.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use crate::ingest::InboundMessage;

/// Reconnection delay after a WebSocket failure.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Subscription request sent to the bridge after connecting.
#[derive(Debug, Serialize)]
struct SubscribeRequest<'a> {
    subscribe: &'a str,
}

/// One published message as framed by the bridge.
#[derive(Debug, Deserialize)]
struct BridgeFrame {
    topic: String,
    payload: String,
}

/// Run the subscription loop indefinitely.
///
/// Exits only when the ingest channel is closed (the pipeline is gone).
pub async fn run(ws_url: &str, topic_prefix: &str, tx: mpsc::Sender<InboundMessage>) {
    let topic_filter = format!("{topic_prefix}/#");

    loop {
        tracing::info!(url = %ws_url, topic = %topic_filter, "Connecting to broker bridge");

        match connect_async(ws_url).await {
            Ok((ws_stream, _response)) => {
                tracing::info!("Broker bridge connected");
                if run_session(ws_stream, &topic_filter, &tx).await.is_err() {
                    // Pipeline side hung up; nothing left to deliver to.
                    tracing::info!("Ingest channel closed, subscriber exiting");
                    return;
                }
                tracing::warn!("Broker session ended, reconnecting");
            }
            Err(e) => {
                tracing::error!(error = %e, "Broker connection failed");
            }
        }

        tokio::time::sleep(RECONNECT_DELAY).await;
    }
}

/// Drive a single bridge session. Returns `Err(())` when the ingest
/// channel is closed, `Ok(())` when the session should be retried.
async fn run_session(
    ws_stream: tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >,
    topic_filter: &str,
    tx: &mpsc::Sender<InboundMessage>,
) -> Result<(), ()> {
    let (mut sink, mut stream) = ws_stream.split();

    let request = SubscribeRequest {
        subscribe: topic_filter,
    };
    let json = serde_json::to_string(&request).expect("SubscribeRequest is always serialisable");
    if let Err(e) = sink.send(Message::Text(json)).await {
        tracing::error!(error = %e, "Failed to send subscription request");
        return Ok(());
    }

    while let Some(msg) = stream.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let frame = match serde_json::from_str::<BridgeFrame>(&text) {
                    Ok(frame) => frame,
                    Err(e) => {
                        tracing::warn!(error = %e, raw = %text, "Unparseable bridge frame");
                        continue;
                    }
                };
                let inbound = InboundMessage {
                    topic: frame.topic,
                    payload: frame.payload.into_bytes(),
                };
                if tx.send(inbound).await.is_err() {
                    return Err(());
                }
            }
            Ok(Message::Ping(_) | Message::Pong(_)) => {
                // Handled automatically by tungstenite.
            }
            Ok(Message::Close(frame)) => {
                tracing::info!(?frame, "Broker closed WebSocket");
                break;
            }
            Ok(_) => {
                // Binary / Frame — ignore.
            }
            Err(e) => {
                tracing::error!(error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    Ok(())
}
