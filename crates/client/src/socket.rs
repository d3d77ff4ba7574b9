// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reconnecting socket to the notification relay.
//!
//! One background task owns the live connection. It appends parsed JSON
//! objects to the message list, writes outbound frames only while open, and
//! reconnects after the policy's delay whenever the socket closes. Dropping
//! or closing the handle is the only way to stop it.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{broadcast, mpsc, watch, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::{ClientConfig, ReconnectPolicy};
use crate::connector::{Connection, Connector};
use crate::error::ClientError;
use crate::notification::{Notification, Record};
use crate::state::{ConnEvent, ConnectionState};
use crate::url::relay_url;

/// State shared between the handle and its connection task.
struct Shared {
    state: watch::Sender<ConnectionState>,
    connected: watch::Sender<bool>,
    messages: RwLock<Vec<Record>>,
    received: broadcast::Sender<Record>,
}

impl Shared {
    fn new(config: &ClientConfig) -> Self {
        let (received, _) = broadcast::channel(config.broadcast_capacity());
        Self {
            state: watch::Sender::new(ConnectionState::Idle),
            connected: watch::Sender::new(false),
            messages: RwLock::new(Vec::new()),
            received,
        }
    }

    fn apply(&self, event: ConnEvent) -> ConnectionState {
        let mut next = ConnectionState::Idle;
        self.state.send_modify(|state| {
            *state = state.on(event);
            next = *state;
        });
        self.connected.send_if_modified(|connected| {
            let open = next.is_connected();
            let changed = *connected != open;
            *connected = open;
            changed
        });
        next
    }

    async fn push_frame(&self, text: &str) {
        let record = match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(record)) => record,
            Ok(other) => {
                tracing::warn!(kind = json_kind(&other), "dropping non-object message");
                return;
            }
            Err(e) => {
                tracing::warn!(err = %e, "dropping malformed message");
                return;
            }
        };
        self.messages.write().await.push(record.clone());
        // No subscribers is fine.
        let _ = self.received.send(record);
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// How a live connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PumpEnd {
    Closed,
    Errored,
    Disposed,
}

/// Best-effort live connection to the relay for one user.
pub struct ReconnectingSocket {
    shared: Arc<Shared>,
    outbound: Option<mpsc::UnboundedSender<String>>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ReconnectingSocket {
    /// Start connecting to the relay at `origin` as `user_id`.
    ///
    /// An empty `user_id` yields an idle socket that never connects. Must be
    /// called within a tokio runtime.
    pub fn connect(
        user_id: &str,
        origin: &str,
        config: ClientConfig,
        connector: Arc<dyn Connector>,
    ) -> Result<Self, ClientError> {
        let shared = Arc::new(Shared::new(&config));
        let cancel = CancellationToken::new();

        if user_id.is_empty() {
            tracing::debug!("no user id, relay socket stays idle");
            return Ok(Self { shared, outbound: None, cancel, task: None });
        }

        let url = relay_url(origin, user_id)?;
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(
            Arc::clone(&shared),
            connector,
            url,
            config.reconnect,
            outbound_rx,
            cancel.clone(),
        ));

        Ok(Self { shared, outbound: Some(outbound_tx), cancel, task: Some(task) })
    }

    pub fn state(&self) -> ConnectionState {
        *self.shared.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        *self.shared.connected.borrow()
    }

    pub fn watch_connected(&self) -> watch::Receiver<bool> {
        self.shared.connected.subscribe()
    }

    /// All messages received so far, in receipt order.
    pub async fn messages(&self) -> Vec<Record> {
        self.shared.messages.read().await.clone()
    }

    /// Received messages decoded into known notification kinds.
    pub async fn notifications(&self) -> Vec<Notification> {
        self.shared.messages.read().await.iter().map(Notification::from_record).collect()
    }

    /// Stream of messages received from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Record> {
        self.shared.received.subscribe()
    }

    /// Serialize `payload` and send it if the socket is open.
    ///
    /// Otherwise the message is dropped and logged; nothing is queued.
    pub fn send_message<T: Serialize + ?Sized>(&self, payload: &T) {
        if !self.state().is_connected() {
            tracing::warn!(state = %self.state(), "relay socket not open, message dropped");
            return;
        }
        let Some(ref outbound) = self.outbound else {
            return;
        };
        match serde_json::to_string(payload) {
            Ok(text) => {
                if outbound.send(text).is_err() {
                    tracing::warn!("relay socket task gone, message dropped");
                }
            }
            Err(e) => tracing::warn!(err = %e, "failed to serialize outbound message"),
        }
    }

    /// Close the socket and stop reconnecting.
    pub async fn close(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::debug!(err = %e, "relay socket task failed");
            }
        }
        self.shared.apply(ConnEvent::Dispose);
    }
}

impl Drop for ReconnectingSocket {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Connection task: connect, pump, wait, repeat.
async fn run(
    shared: Arc<Shared>,
    connector: Arc<dyn Connector>,
    url: String,
    policy: ReconnectPolicy,
    mut outbound_rx: mpsc::UnboundedReceiver<String>,
    cancel: CancellationToken,
) {
    let mut failures: u32 = 0;
    shared.apply(ConnEvent::Connect);

    loop {
        let result = tokio::select! {
            _ = cancel.cancelled() => break,
            result = connector.connect(&url) => result,
        };

        match result {
            Ok(conn) => {
                failures = 0;
                shared.apply(ConnEvent::Opened);
                tracing::info!(url = %url, "relay socket open");

                let end = pump(&shared, conn, &mut outbound_rx, &cancel).await;
                if end == PumpEnd::Disposed {
                    break;
                }
                shared.apply(ConnEvent::Closed);
                tracing::info!(url = %url, ?end, "relay socket closed");
            }
            Err(e) => {
                shared.apply(ConnEvent::Closed);
                tracing::warn!(url = %url, err = %e, "relay connect failed");
            }
        }

        // Frames written while closed are lost, not replayed on the next socket.
        let mut dropped = 0usize;
        while outbound_rx.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            tracing::warn!(dropped, "discarded messages sent during disconnect");
        }

        failures = failures.saturating_add(1);
        if policy.exhausted(failures) {
            tracing::warn!(url = %url, failures, "giving up on relay socket");
            return;
        }

        let delay = policy.delay_for(failures);
        tracing::debug!(url = %url, delay_ms = delay.as_millis() as u64, "reconnecting");
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }
        shared.apply(ConnEvent::RetryElapsed);
    }

    shared.apply(ConnEvent::Dispose);
}

/// Pump one live connection until it closes, errors, or is disposed.
async fn pump(
    shared: &Shared,
    conn: Connection,
    outbound_rx: &mut mpsc::UnboundedReceiver<String>,
    cancel: &CancellationToken,
) -> PumpEnd {
    let Connection { mut sink, mut stream } = conn;

    let end = loop {
        tokio::select! {
            _ = cancel.cancelled() => break PumpEnd::Disposed,

            out = outbound_rx.recv() => match out {
                Some(text) => {
                    if let Err(e) = sink.send(text).await {
                        tracing::warn!(err = %e, "relay socket write failed");
                        break PumpEnd::Errored;
                    }
                }
                None => break PumpEnd::Disposed,
            },

            frame = stream.next() => match frame {
                Some(Ok(text)) => shared.push_frame(&text).await,
                Some(Err(e)) => {
                    tracing::warn!(err = %e, "relay socket error");
                    break PumpEnd::Errored;
                }
                None => break PumpEnd::Closed,
            },
        }
    };

    if end != PumpEnd::Closed {
        if end == PumpEnd::Errored {
            shared.apply(ConnEvent::Errored);
        }
        if let Err(e) = sink.close().await {
            tracing::debug!(err = %e, "relay socket close failed");
        }
    }
    end
}

#[cfg(test)]
#[path = "socket_tests.rs"]
mod tests;
