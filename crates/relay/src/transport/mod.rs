// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP + WebSocket transport for the relay.

pub mod http;
pub mod ws;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::Relay;

/// Public path of the relay WebSocket endpoint.
pub const RELAY_PATH: &str = "/ws/notifications";

/// Build the axum `Router` with all relay routes.
pub fn build_router(relay: Arc<Relay>) -> Router {
    Router::new()
        .route("/api/v1/health", get(http::health))
        .route("/api/v1/connections", get(http::list_connections))
        .route(RELAY_PATH, get(ws::relay_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(relay)
}
