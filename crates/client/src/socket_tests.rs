// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use super::ReconnectingSocket;
use crate::config::{ClientConfig, ReconnectPolicy};
use crate::connector::Connector;
use crate::notification::Notification;
use crate::state::ConnectionState;
use crate::test_support::MockConnector;

// Longer than any reconnect delay, so the paused clock fires reconnects first.
const TIMEOUT: Duration = Duration::from_secs(60);
const ORIGIN: &str = "http://localhost:3000";

fn connect_socket(
    user_id: &str,
    connector: &Arc<MockConnector>,
    policy: ReconnectPolicy,
) -> anyhow::Result<ReconnectingSocket> {
    let config = ClientConfig { reconnect: policy, ..ClientConfig::default() };
    let connector: Arc<dyn Connector> = Arc::clone(connector) as Arc<dyn Connector>;
    Ok(ReconnectingSocket::connect(user_id, ORIGIN, config, connector)?)
}

async fn wait_connected(socket: &ReconnectingSocket, want: bool) -> anyhow::Result<()> {
    let mut rx = socket.watch_connected();
    tokio::time::timeout(TIMEOUT, rx.wait_for(|c| *c == want))
        .await
        .map_err(|_| anyhow::anyhow!("connected never became {want}"))?
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn reconnects_after_fixed_delay_across_repeated_closes() -> anyhow::Result<()> {
    let connector = MockConnector::new();
    let socket = connect_socket("42", &connector, ReconnectPolicy::default())?;

    for _ in 0..4 {
        let mut peer = connector.next_peer(TIMEOUT).await?;
        wait_connected(&socket, true).await?;
        peer.close();
        wait_connected(&socket, false).await?;
    }

    let attempts = connector.attempts();
    assert_eq!(attempts.len(), 4);
    for pair in attempts.windows(2) {
        let gap = pair[1].at - pair[0].at;
        assert!(gap >= Duration::from_millis(5000), "reconnected too early: {gap:?}");
        assert!(gap <= Duration::from_millis(5050), "reconnected too late: {gap:?}");
    }
    assert!(attempts.iter().all(|a| a.url == "ws://localhost:3000/ws/notifications?userId=42"));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn appends_json_objects_and_drops_malformed() -> anyhow::Result<()> {
    let connector = MockConnector::new();
    let socket = connect_socket("42", &connector, ReconnectPolicy::default())?;
    let peer = connector.next_peer(TIMEOUT).await?;
    wait_connected(&socket, true).await?;
    let mut received = socket.subscribe();

    let first = json!({ "type": "message", "body": "one" });
    let second = json!({ "type": "lab_result_ready", "nested": { "ok": [true, null, 1.5] } });
    peer.send_text(first.to_string())?;
    peer.send_text("not json")?;
    peer.send_text("[1,2,3]")?;
    peer.send_text(second.to_string())?;

    let got_first = tokio::time::timeout(TIMEOUT, received.recv()).await??;
    let got_second = tokio::time::timeout(TIMEOUT, received.recv()).await??;
    assert_eq!(Value::Object(got_first), first);
    assert_eq!(Value::Object(got_second), second);

    let messages: Vec<Value> = socket.messages().await.into_iter().map(Value::Object).collect();
    assert_eq!(messages, vec![first, second]);
    assert!(socket.is_connected(), "malformed frames must not affect the connection");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn notifications_decode_received_records() -> anyhow::Result<()> {
    let connector = MockConnector::new();
    let socket = connect_socket("42", &connector, ReconnectPolicy::default())?;
    let peer = connector.next_peer(TIMEOUT).await?;
    wait_connected(&socket, true).await?;
    let mut received = socket.subscribe();

    peer.send_text(r#"{"type":"appointment_reminder","scheduled_at":"2026-10-20T09:00:00Z"}"#)?;
    peer.send_text(r#"{"type":"promo"}"#)?;
    tokio::time::timeout(TIMEOUT, received.recv()).await??;
    tokio::time::timeout(TIMEOUT, received.recv()).await??;

    let kinds: Vec<String> =
        socket.notifications().await.iter().map(|n| n.kind().to_owned()).collect();
    assert_eq!(kinds, ["appointment_reminder", "promo"]);
    assert!(matches!(socket.notifications().await[1], Notification::Other(_)));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn send_while_closed_is_dropped_not_queued() -> anyhow::Result<()> {
    let connector = MockConnector::new();
    let socket = connect_socket("42", &connector, ReconnectPolicy::default())?;

    let mut peer = connector.next_peer(TIMEOUT).await?;
    wait_connected(&socket, true).await?;
    socket.send_message(&json!({ "n": 1 }));
    assert_eq!(peer.recv(TIMEOUT).await?, Some(r#"{"n":1}"#.to_owned()));

    peer.close();
    wait_connected(&socket, false).await?;
    socket.send_message(&json!({ "n": 2 }));

    let mut next = connector.next_peer(TIMEOUT).await?;
    wait_connected(&socket, true).await?;
    socket.send_message(&json!({ "n": 3 }));
    assert_eq!(next.recv(TIMEOUT).await?, Some(r#"{"n":3}"#.to_owned()));
    assert_eq!(next.try_recv(), None);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn empty_user_id_never_connects() -> anyhow::Result<()> {
    let connector = MockConnector::new();
    let socket = connect_socket("", &connector, ReconnectPolicy::default())?;

    tokio::time::sleep(Duration::from_secs(30)).await;
    socket.send_message(&json!({ "x": 1 }));

    assert!(connector.attempts().is_empty());
    assert_eq!(socket.state(), ConnectionState::Idle);
    assert!(!socket.is_connected());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn error_force_closes_and_reconnects() -> anyhow::Result<()> {
    let connector = MockConnector::new();
    let socket = connect_socket("42", &connector, ReconnectPolicy::default())?;

    let mut peer = connector.next_peer(TIMEOUT).await?;
    wait_connected(&socket, true).await?;
    peer.send_error()?;
    wait_connected(&socket, false).await?;

    // Client dropped its write half.
    assert_eq!(peer.recv(TIMEOUT).await?, None);

    let _next = connector.next_peer(TIMEOUT).await?;
    wait_connected(&socket, true).await?;
    assert_eq!(connector.attempts().len(), 2);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn close_disposes_and_stops_reconnecting() -> anyhow::Result<()> {
    let connector = MockConnector::new();
    let socket = connect_socket("42", &connector, ReconnectPolicy::default())?;
    let state = socket.watch_state();

    let mut peer = connector.next_peer(TIMEOUT).await?;
    wait_connected(&socket, true).await?;

    socket.close().await;
    assert_eq!(peer.recv(TIMEOUT).await?, None);
    assert_eq!(*state.borrow(), ConnectionState::Disposed);

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(connector.attempts().len(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn drop_during_reconnect_delay_cancels_retry() -> anyhow::Result<()> {
    let connector = MockConnector::new();
    let socket = connect_socket("42", &connector, ReconnectPolicy::default())?;

    let mut peer = connector.next_peer(TIMEOUT).await?;
    wait_connected(&socket, true).await?;
    peer.close();
    wait_connected(&socket, false).await?;

    drop(socket);
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(connector.attempts().len(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn max_attempts_stops_after_consecutive_failures() -> anyhow::Result<()> {
    let connector = MockConnector::new();
    connector.set_refuse(true);
    let policy = ReconnectPolicy { max_attempts: Some(3), ..ReconnectPolicy::fixed(Duration::from_secs(1)) };
    let socket = connect_socket("42", &connector, policy)?;

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(connector.attempts().len(), 3);
    assert_eq!(socket.state(), ConnectionState::Idle);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn backoff_grows_between_failed_attempts() -> anyhow::Result<()> {
    let connector = MockConnector::new();
    connector.set_refuse(true);
    let policy = ReconnectPolicy {
        delay: Duration::from_millis(100),
        multiplier: 2.0,
        max_delay: Duration::from_millis(400),
        max_attempts: Some(5),
    };
    let _socket = connect_socket("42", &connector, policy)?;

    tokio::time::sleep(Duration::from_secs(10)).await;
    let attempts = connector.attempts();
    let gaps: Vec<u128> = attempts.windows(2).map(|p| (p[1].at - p[0].at).as_millis()).collect();
    assert_eq!(gaps, [100, 200, 400, 400]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn successful_open_resets_failure_count() -> anyhow::Result<()> {
    let connector = MockConnector::new();
    let policy = ReconnectPolicy { max_attempts: Some(2), ..ReconnectPolicy::fixed(Duration::from_secs(1)) };
    let socket = connect_socket("42", &connector, policy)?;

    // Each close counts as one failure; a successful open clears the count,
    // so two failures are never consecutive here.
    for _ in 0..3 {
        let mut peer = connector.next_peer(TIMEOUT).await?;
        wait_connected(&socket, true).await?;
        peer.close();
        wait_connected(&socket, false).await?;
    }
    assert_eq!(connector.attempts().len(), 3);
    Ok(())
}
