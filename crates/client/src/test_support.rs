// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory [`Connector`] for driving the reconnecting socket without a
//! network. Works under a paused tokio clock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::sink;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::connector::{Connection, Connector};
use crate::error::ClientError;

/// One connect attempt seen by the mock.
#[derive(Debug, Clone)]
pub struct Attempt {
    pub url: String,
    pub at: Instant,
}

/// Server side of one accepted mock connection.
pub struct MockPeer {
    pub url: String,
    to_client: Option<mpsc::UnboundedSender<Result<String, ClientError>>>,
    from_client: mpsc::UnboundedReceiver<String>,
}

impl MockPeer {
    /// Deliver a text frame to the client.
    pub fn send_text(&self, text: impl Into<String>) -> anyhow::Result<()> {
        let tx = self.to_client.as_ref().ok_or_else(|| anyhow::anyhow!("peer already closed"))?;
        tx.send(Ok(text.into())).map_err(|_| anyhow::anyhow!("client stream dropped"))
    }

    /// Inject a transport error on the client's read side.
    pub fn send_error(&self) -> anyhow::Result<()> {
        let tx = self.to_client.as_ref().ok_or_else(|| anyhow::anyhow!("peer already closed"))?;
        tx.send(Err(ClientError::Transport("injected".to_owned())))
            .map_err(|_| anyhow::anyhow!("client stream dropped"))
    }

    /// Close from the server side: the client's stream ends.
    pub fn close(&mut self) {
        self.to_client = None;
    }

    /// Next frame written by the client. `None` once the client dropped its sink.
    pub async fn recv(&mut self, timeout: Duration) -> anyhow::Result<Option<String>> {
        tokio::time::timeout(timeout, self.from_client.recv())
            .await
            .map_err(|_| anyhow::anyhow!("peer recv timeout"))
    }

    /// Frame already written by the client, without waiting.
    pub fn try_recv(&mut self) -> Option<String> {
        self.from_client.try_recv().ok()
    }
}

/// Scriptable in-memory connector.
pub struct MockConnector {
    attempts: Mutex<Vec<Attempt>>,
    refuse: AtomicBool,
    peers_tx: mpsc::UnboundedSender<MockPeer>,
    peers_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<MockPeer>>,
}

impl MockConnector {
    pub fn new() -> Arc<Self> {
        let (peers_tx, peers_rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            attempts: Mutex::new(Vec::new()),
            refuse: AtomicBool::new(false),
            peers_tx,
            peers_rx: tokio::sync::Mutex::new(peers_rx),
        })
    }

    /// Make subsequent connects fail (or succeed again).
    pub fn set_refuse(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }

    pub fn attempts(&self) -> Vec<Attempt> {
        match self.attempts.lock() {
            Ok(attempts) => attempts.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Wait for the next accepted connection.
    pub async fn next_peer(&self, timeout: Duration) -> anyhow::Result<MockPeer> {
        let mut rx = self.peers_rx.lock().await;
        tokio::time::timeout(timeout, rx.recv())
            .await
            .map_err(|_| anyhow::anyhow!("no connection before timeout"))?
            .ok_or_else(|| anyhow::anyhow!("connector dropped"))
    }
}

impl Connector for MockConnector {
    fn connect(&self, url: &str) -> BoxFuture<'static, Result<Connection, ClientError>> {
        let attempt = Attempt { url: url.to_owned(), at: Instant::now() };
        match self.attempts.lock() {
            Ok(mut attempts) => attempts.push(attempt),
            Err(poisoned) => poisoned.into_inner().push(attempt),
        }

        if self.refuse.load(Ordering::SeqCst) {
            return Box::pin(async { Err(ClientError::Connect("refused".to_owned())) });
        }

        let (to_client, client_rx) = mpsc::unbounded_channel();
        let (client_tx, from_client) = mpsc::unbounded_channel::<String>();
        let peer = MockPeer { url: url.to_owned(), to_client: Some(to_client), from_client };
        let accepted = self.peers_tx.send(peer).is_ok();

        Box::pin(async move {
            if !accepted {
                return Err(ClientError::Connect("mock connector dropped".to_owned()));
            }
            let sink = sink::unfold(client_tx, |tx, text: String| async move {
                tx.send(text).map_err(|_| ClientError::Closed)?;
                Ok::<_, ClientError>(tx)
            });
            Ok(Connection {
                sink: Box::pin(sink),
                stream: Box::pin(UnboundedReceiverStream::new(client_rx)),
            })
        })
    }
}
