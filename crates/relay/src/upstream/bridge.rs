// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-user bridge: one client WebSocket paired with one upstream WebSocket.
//!
//! Frames are forwarded verbatim in arrival order on each leg. A close or
//! error on either leg tears the whole pair down; the relay never retries
//! upstream, reconnecting is the client's job.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, Utf8Bytes, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message as UpstreamMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

use crate::error::{RelayError, CLOSE_NORMAL};
use crate::registry::PairEntry;
use crate::state::Relay;
use crate::upstream::upstream_url;

type UpstreamStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type ClientRx = SplitStream<WebSocket>;
type ClientTx = SplitSink<WebSocket, Message>;

/// How the upstream handshake ended.
enum Handshake {
    Connected(Box<UpstreamStream>),
    ClientGone,
    Cancelled,
    Failed { err: RelayError, cause: String },
}

/// Accept an upgraded client socket: register it, then bridge it upstream.
pub async fn accept(relay: Arc<Relay>, user_id: String, socket: WebSocket) {
    let entry = relay.new_pair(&user_id);
    match relay.registry.register(Arc::clone(&entry), relay.config.on_duplicate).await {
        Ok(Some(prior)) => {
            tracing::info!(
                user_id = %user_id,
                prior = %prior.connection_id,
                conn_id = %entry.connection_id,
                "replacing existing pair"
            );
        }
        Ok(None) => {}
        Err(e) => {
            tracing::info!(user_id = %user_id, "rejecting duplicate connection");
            reject(socket, e).await;
            return;
        }
    }

    run_pair(&relay, &entry, socket).await;
}

/// Close a freshly upgraded socket with the error's close code and reason.
pub async fn reject(mut socket: WebSocket, err: RelayError) {
    let frame = CloseFrame { code: err.close_code(), reason: Utf8Bytes::from_static(err.message()) };
    if let Err(e) = socket.send(Message::Close(Some(frame))).await {
        tracing::debug!(err = %e, "failed to send close frame");
    }
}

/// Bridge a registered pair until either leg goes away.
async fn run_pair(relay: &Relay, entry: &PairEntry, socket: WebSocket) {
    let url = upstream_url(&relay.config.backend_url, &entry.user_id);
    let (mut client_tx, mut client_rx) = socket.split();

    tracing::info!(user_id = %entry.user_id, conn_id = %entry.connection_id, "client connected");

    let handshake = connect_upstream(
        &url,
        &entry.cancel,
        &mut client_rx,
        relay.config.upstream_connect_timeout(),
    )
    .await;

    let mut failure = None;
    let reason = match handshake {
        Handshake::Connected(upstream) => {
            tracing::debug!(user_id = %entry.user_id, "upstream connected");
            let (mut upstream_tx, upstream_rx) = (*upstream).split();
            let reason = forward(&entry.cancel, &mut client_tx, client_rx, &mut upstream_tx, upstream_rx).await;
            if let Err(e) = upstream_tx.close().await {
                tracing::debug!(user_id = %entry.user_id, err = %e, "upstream close failed");
            }
            reason
        }
        Handshake::Failed { err, cause } => {
            tracing::warn!(
                user_id = %entry.user_id,
                url = %url,
                code = err.as_str(),
                cause = %cause,
                "upstream connect failed"
            );
            failure = Some(err);
            "upstream connect failed"
        }
        Handshake::ClientGone => "client closed during upstream connect",
        Handshake::Cancelled => "cancelled",
    };

    // Registry first, so a client that observes the close sees no entry.
    relay.registry.remove(&entry.user_id, entry.connection_id).await;
    close_client(&mut client_tx, failure).await;

    tracing::info!(
        user_id = %entry.user_id,
        conn_id = %entry.connection_id,
        reason,
        "pair closed"
    );
}

/// Open the upstream socket while watching the client leg.
///
/// Client frames arriving before the upstream leg is open are dropped.
async fn connect_upstream(
    url: &str,
    cancel: &CancellationToken,
    client_rx: &mut ClientRx,
    timeout: Option<Duration>,
) -> Handshake {
    let mut connect = Box::pin(tokio_tungstenite::connect_async(url.to_owned()));
    let deadline = async move {
        match timeout {
            Some(t) => tokio::time::sleep(t).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return Handshake::Cancelled,
            _ = &mut deadline => {
                return Handshake::Failed {
                    err: RelayError::UpstreamError,
                    cause: "connect timed out".to_owned(),
                };
            }
            result = &mut connect => {
                return match result {
                    Ok((stream, _)) => Handshake::Connected(Box::new(stream)),
                    Err(e) => Handshake::Failed { err: RelayError::UpstreamError, cause: e.to_string() },
                };
            }
            msg = client_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(_) | Message::Binary(_))) => {
                        tracing::debug!("upstream not open, dropping client frame");
                    }
                    Some(Ok(Message::Close(_))) | None => return Handshake::ClientGone,
                    Some(Err(e)) => {
                        tracing::debug!(err = %e, "client WS error during upstream connect");
                        return Handshake::ClientGone;
                    }
                    _ => {}
                }
            }
        }
    }
}

/// Pump frames both ways until a leg closes. Returns the teardown reason.
async fn forward(
    cancel: &CancellationToken,
    client_tx: &mut ClientTx,
    mut client_rx: ClientRx,
    upstream_tx: &mut SplitSink<UpstreamStream, UpstreamMessage>,
    mut upstream_rx: SplitStream<UpstreamStream>,
) -> &'static str {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return "cancelled",

            msg = client_rx.next() => {
                let out = match msg {
                    Some(Ok(Message::Text(text))) => UpstreamMessage::Text(text.as_str().to_owned().into()),
                    Some(Ok(Message::Binary(data))) => UpstreamMessage::Binary(data),
                    Some(Ok(Message::Close(_))) | None => return "client closed",
                    Some(Err(e)) => {
                        tracing::debug!(err = %e, "client WS error");
                        return "client error";
                    }
                    _ => continue, // ping/pong
                };
                if let Err(e) = upstream_tx.send(out).await {
                    tracing::debug!(err = %e, "upstream send failed");
                    return "upstream send failed";
                }
            }

            msg = upstream_rx.next() => {
                let out = match msg {
                    Some(Ok(UpstreamMessage::Text(text))) => Message::Text(text.as_str().to_owned().into()),
                    Some(Ok(UpstreamMessage::Binary(data))) => Message::Binary(data),
                    Some(Ok(UpstreamMessage::Close(_))) | None => return "upstream closed",
                    Some(Err(e)) => {
                        tracing::warn!(err = %e, "upstream WS error");
                        return "upstream error";
                    }
                    _ => continue, // ping/pong/raw frames
                };
                if let Err(e) = client_tx.send(out).await {
                    tracing::debug!(err = %e, "client send failed");
                    return "client send failed";
                }
            }
        }
    }
}

/// Close the client leg. Failures carry their reason but still close with
/// the error's close code, which is normal closure for upstream errors.
async fn close_client(client_tx: &mut ClientTx, failure: Option<RelayError>) {
    let frame = match failure {
        Some(err) => CloseFrame { code: err.close_code(), reason: Utf8Bytes::from_static(err.message()) },
        None => CloseFrame { code: CLOSE_NORMAL, reason: Utf8Bytes::from_static("") },
    };
    if client_tx.send(Message::Close(Some(frame))).await.is_err() {
        // Client already gone.
        return;
    }
    if let Err(e) = client_tx.close().await {
        tracing::debug!(err = %e, "client close failed");
    }
}
