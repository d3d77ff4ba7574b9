// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Socket factory seam. Production code opens real WebSockets; tests plug in
//! an in-memory connector.

use std::pin::Pin;

use futures_util::future::{self, BoxFuture};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio_tungstenite::tungstenite::Message;

use crate::error::ClientError;

/// Outbound half: accepts serialized JSON text frames.
pub type FrameSink = Pin<Box<dyn Sink<String, Error = ClientError> + Send>>;
/// Inbound half: text frames until the peer closes (stream end).
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String, ClientError>> + Send>>;

/// An open socket, split into halves.
pub struct Connection {
    pub sink: FrameSink,
    pub stream: FrameStream,
}

/// Opens sockets to the relay.
pub trait Connector: Send + Sync + 'static {
    fn connect(&self, url: &str) -> BoxFuture<'static, Result<Connection, ClientError>>;
}

/// [`Connector`] backed by `tokio-tungstenite`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteConnector;

impl Connector for TungsteniteConnector {
    fn connect(&self, url: &str) -> BoxFuture<'static, Result<Connection, ClientError>> {
        let url = url.to_owned();
        Box::pin(async move {
            let (ws, _) = tokio_tungstenite::connect_async(url)
                .await
                .map_err(|e| ClientError::Connect(e.to_string()))?;
            let (tx, rx) = ws.split();

            let sink = tx
                .sink_map_err(|e| ClientError::Transport(e.to_string()))
                .with(|text: String| future::ready(Ok::<_, ClientError>(Message::Text(text.into()))));

            let stream = rx.filter_map(|msg| {
                future::ready(match msg {
                    Ok(msg) => frame_text(msg).map(Ok),
                    Err(e) => Some(Err(ClientError::Transport(e.to_string()))),
                })
            });

            Ok(Connection { sink: Box::pin(sink), stream: Box::pin(stream) })
        })
    }
}

/// Text payload of an inbound frame. The relay protocol is text-only, so
/// binary frames are dropped. Close is followed by end of stream and
/// ping/pong is answered by tungstenite.
fn frame_text(msg: Message) -> Option<String> {
    match msg {
        Message::Text(text) => Some(text.as_str().to_owned()),
        Message::Binary(data) => {
            tracing::debug!(len = data.len(), "dropping binary frame");
            None
        }
        _ => None,
    }
}

#[cfg(test)]
#[path = "connector_tests.rs"]
mod tests;
