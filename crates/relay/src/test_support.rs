// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test helpers: an in-process relay server and a scriptable stand-in for
//! the upstream notification backend.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::{DuplicatePolicy, RelayConfig};
use crate::state::Relay;
use crate::upstream::NOTIFICATION_PATH;

/// Relay config pointed at `backend_url`, bound to an ephemeral port.
pub fn relay_config(backend_url: &str) -> RelayConfig {
    RelayConfig {
        host: "127.0.0.1".to_owned(),
        port: 0,
        backend_url: backend_url.to_owned(),
        on_duplicate: DuplicatePolicy::Replace,
        upstream_connect_timeout_ms: 0,
    }
}

/// Start a relay on a random port. Returns the relay and its address.
pub async fn spawn_relay(config: RelayConfig) -> anyhow::Result<(Arc<Relay>, SocketAddr)> {
    let relay = Arc::new(Relay::new(config, CancellationToken::new()));
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let (addr, _handle) = crate::spawn_server(Arc::clone(&relay), listener)?;
    Ok((relay, addr))
}

/// Something observed by the mock backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendEvent {
    Connected(String),
    Frame(String, String),
    Closed(String),
}

enum BackendCommand {
    Send(String),
    Close,
}

#[derive(Default)]
struct BackendShared {
    connects: Mutex<Vec<String>>,
    controls: Mutex<HashMap<String, mpsc::UnboundedSender<BackendCommand>>>,
    events: Mutex<Option<mpsc::UnboundedSender<BackendEvent>>>,
}

/// Mock upstream notification backend serving `/ws/notifications/patient/{id}`.
pub struct MockBackend {
    pub addr: SocketAddr,
    shared: Arc<BackendShared>,
    events: Mutex<mpsc::UnboundedReceiver<BackendEvent>>,
    _handle: JoinHandle<()>,
}

impl MockBackend {
    pub async fn start() -> anyhow::Result<Self> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(BackendShared::default());
        *shared.events.lock().await = Some(event_tx);

        let router = Router::new()
            .route(&format!("{NOTIFICATION_PATH}/{{user_id}}"), get(backend_ws))
            .with_state(Arc::clone(&shared));
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Ok(Self { addr, shared, events: Mutex::new(event_rx), _handle: handle })
    }

    /// Backend base URL suitable for [`RelayConfig::backend_url`].
    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// User ids of every upstream connection accepted so far, in order.
    pub async fn connects(&self) -> Vec<String> {
        self.shared.connects.lock().await.clone()
    }

    /// Push a text frame to the upstream socket of `user_id`.
    pub async fn send(&self, user_id: &str, text: impl Into<String>) -> anyhow::Result<()> {
        self.command(user_id, BackendCommand::Send(text.into())).await
    }

    /// Close the upstream socket of `user_id`.
    pub async fn close(&self, user_id: &str) -> anyhow::Result<()> {
        self.command(user_id, BackendCommand::Close).await
    }

    async fn command(&self, user_id: &str, cmd: BackendCommand) -> anyhow::Result<()> {
        let controls = self.shared.controls.lock().await;
        let tx = controls
            .get(user_id)
            .ok_or_else(|| anyhow::anyhow!("no upstream socket for {user_id}"))?;
        tx.send(cmd).map_err(|_| anyhow::anyhow!("upstream socket for {user_id} is gone"))
    }

    /// Next backend event, or an error after `timeout`.
    pub async fn next_event(&self, timeout: Duration) -> anyhow::Result<BackendEvent> {
        let mut events = self.events.lock().await;
        tokio::time::timeout(timeout, events.recv())
            .await
            .map_err(|_| anyhow::anyhow!("backend event timeout"))?
            .ok_or_else(|| anyhow::anyhow!("backend event channel closed"))
    }

    /// Wait until `user_id` has an open upstream socket.
    pub async fn wait_connected(&self, user_id: &str, timeout: Duration) -> anyhow::Result<()> {
        loop {
            match self.next_event(timeout).await? {
                BackendEvent::Connected(id) if id == user_id => return Ok(()),
                _ => continue,
            }
        }
    }
}

async fn backend_ws(
    State(shared): State<Arc<BackendShared>>,
    Path(user_id): Path<String>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| backend_session(shared, user_id, socket))
}

async fn backend_session(shared: Arc<BackendShared>, user_id: String, socket: WebSocket) {
    let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel();
    shared.controls.lock().await.insert(user_id.clone(), cmd_tx);
    shared.connects.lock().await.push(user_id.clone());
    let events = shared.events.lock().await.clone();
    let emit = |event: BackendEvent| {
        if let Some(ref tx) = events {
            let _ = tx.send(event);
        }
    };
    emit(BackendEvent::Connected(user_id.clone()));

    let (mut tx, mut rx) = socket.split();
    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => match cmd {
                Some(BackendCommand::Send(text)) => {
                    if tx.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Some(BackendCommand::Close) | None => {
                    let _ = tx.send(Message::Close(None)).await;
                    break;
                }
            },
            msg = rx.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    emit(BackendEvent::Frame(user_id.clone(), text.as_str().to_owned()));
                }
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                _ => {}
            },
        }
    }
    emit(BackendEvent::Closed(user_id));
}
