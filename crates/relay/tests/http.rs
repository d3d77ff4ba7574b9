// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP-level tests for the relay router.
//!
//! Uses `axum_test::TestServer` — no real TCP needed.

use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use tokio_util::sync::CancellationToken;

use medrelay::config::DuplicatePolicy;
use medrelay::state::Relay;
use medrelay::test_support::relay_config;
use medrelay::transport::build_router;

fn test_state() -> Arc<Relay> {
    Arc::new(Relay::new(relay_config("ws://127.0.0.1:9"), CancellationToken::new()))
}

fn test_server(relay: Arc<Relay>) -> TestServer {
    TestServer::new(build_router(relay)).expect("failed to create test server")
}

#[tokio::test]
async fn plain_get_on_relay_path_is_bad_request() {
    let server = test_server(test_state());

    let resp = server.get("/ws/notifications").add_query_param("userId", "42").await;
    resp.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = resp.json();
    assert_eq!(body, serde_json::json!({ "error": "Not a WebSocket request" }));
}

#[tokio::test]
async fn plain_get_without_user_id_is_bad_request() {
    let server = test_server(test_state());

    let resp = server.get("/ws/notifications").await;
    resp.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["error"], "Not a WebSocket request");
}

#[tokio::test]
async fn plain_get_with_repeated_user_id_is_json_bad_request() {
    let server = test_server(test_state());

    let resp = server
        .get("/ws/notifications")
        .add_query_param("userId", "a")
        .add_query_param("userId", "b")
        .await;
    resp.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = resp.json();
    assert_eq!(body, serde_json::json!({ "error": "Not a WebSocket request" }));
}

#[tokio::test]
async fn health_reports_connection_count() {
    let state = test_state();
    let server = test_server(Arc::clone(&state));

    let resp = server.get("/api/v1/health").await;
    resp.assert_status(StatusCode::OK);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["status"], "running");
    assert_eq!(body["connection_count"], 0);

    let entry = state.new_pair("patient-7");
    state.registry.register(entry, DuplicatePolicy::Replace).await.expect("register");

    let body: serde_json::Value = server.get("/api/v1/health").await.json();
    assert_eq!(body["connection_count"], 1);
}

#[tokio::test]
async fn connections_lists_registered_pairs() {
    let state = test_state();
    for id in ["b-user", "a-user"] {
        state.registry.register(state.new_pair(id), DuplicatePolicy::Replace).await.expect("register");
    }
    let server = test_server(state);

    let resp = server.get("/api/v1/connections").await;
    resp.assert_status(StatusCode::OK);
    let body: Vec<serde_json::Value> = resp.json();
    assert_eq!(body.len(), 2);
    assert_eq!(body[0]["user_id"], "a-user");
    assert_eq!(body[1]["user_id"], "b-user");
    assert!(body[0]["connection_id"].as_str().is_some_and(|s| !s.is_empty()));
    assert!(body[0]["connected_for_ms"].is_u64());
}

#[tokio::test]
async fn shutdown_cancels_registered_pairs() {
    let state = test_state();
    let entry = state.new_pair("patient-1");
    state.registry.register(Arc::clone(&entry), DuplicatePolicy::Replace).await.expect("register");

    state.shutdown().await;

    assert!(entry.cancel.is_cancelled());
    assert!(state.shutdown.is_cancelled());
    assert!(state.registry.is_empty().await);
}
