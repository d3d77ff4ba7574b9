// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Relay WebSocket endpoint.

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::error::RelayError;
use crate::state::Relay;
use crate::upstream::bridge;

/// Query parameters for the relay upgrade, kept as ordered pairs so that
/// repeated keys do not fail extraction.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct RelayQuery {
    pub params: Vec<(String, String)>,
}

impl RelayQuery {
    /// The first non-empty `userId` value.
    pub fn user_id(&self) -> Option<&str> {
        self.params
            .iter()
            .filter(|(key, _)| key == "userId")
            .map(|(_, value)| value.as_str())
            .find(|id| !id.is_empty())
    }
}

/// `GET /ws/notifications?userId=...` — bridge to the user's upstream socket.
pub async fn relay_handler(
    State(relay): State<Arc<Relay>>,
    query: Result<Query<RelayQuery>, QueryRejection>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => {
            tracing::debug!(%rejection, "non-WebSocket request on relay endpoint");
            return RelayError::NotWebSocket.to_http_response().into_response();
        }
    };

    // An unparseable query counts as a missing user id.
    let query = query.map(|Query(q)| q).unwrap_or_else(|rejection| {
        tracing::debug!(%rejection, "unparseable relay query");
        RelayQuery::default()
    });

    let Some(user_id) = query.user_id().map(str::to_owned) else {
        tracing::debug!("relay upgrade without userId");
        return ws
            .on_upgrade(|socket| bridge::reject(socket, RelayError::UserIdRequired))
            .into_response();
    };

    ws.on_upgrade(move |socket| bridge::accept(relay, user_id, socket)).into_response()
}

#[cfg(test)]
#[path = "ws_tests.rs"]
mod tests;
