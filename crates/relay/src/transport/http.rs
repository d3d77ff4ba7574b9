// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP handlers for relay introspection.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::state::Relay;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub connection_count: usize,
}

#[derive(Debug, Serialize)]
pub struct ConnectionInfo {
    pub user_id: String,
    pub connection_id: String,
    pub connected_for_ms: u64,
}

/// `GET /api/v1/health`
pub async fn health(State(relay): State<Arc<Relay>>) -> impl IntoResponse {
    let connection_count = relay.registry.len().await;
    Json(HealthResponse { status: "running".to_owned(), connection_count })
}

/// `GET /api/v1/connections` — live pairs, sorted by user id.
pub async fn list_connections(State(relay): State<Arc<Relay>>) -> impl IntoResponse {
    let infos: Vec<ConnectionInfo> = relay
        .registry
        .snapshot()
        .await
        .iter()
        .map(|e| ConnectionInfo {
            user_id: e.user_id.clone(),
            connection_id: e.connection_id.to_string(),
            connected_for_ms: u64::try_from(e.registered_at.elapsed().as_millis()).unwrap_or(u64::MAX),
        })
        .collect();
    Json(infos)
}
