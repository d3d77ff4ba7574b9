// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Close code sent when the upgrade carries no `userId`.
pub const CLOSE_USER_ID_REQUIRED: u16 = 4000;
/// Close code sent to a rejected duplicate connection.
pub const CLOSE_DUPLICATE_SESSION: u16 = 4009;
/// Normal closure. Used for every teardown, upstream failures included.
pub const CLOSE_NORMAL: u16 = 1000;

/// Error codes for the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelayError {
    NotWebSocket,
    UserIdRequired,
    DuplicateSession,
    UpstreamError,
}

impl RelayError {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::NotWebSocket | Self::UserIdRequired => 400,
            Self::DuplicateSession => 409,
            Self::UpstreamError => 502,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotWebSocket => "NOT_WEBSOCKET",
            Self::UserIdRequired => "USER_ID_REQUIRED",
            Self::DuplicateSession => "DUPLICATE_SESSION",
            Self::UpstreamError => "UPSTREAM_ERROR",
        }
    }

    /// Human-readable message, also used as the WebSocket close reason.
    pub fn message(&self) -> &'static str {
        match self {
            Self::NotWebSocket => "Not a WebSocket request",
            Self::UserIdRequired => "UserId required",
            Self::DuplicateSession => "Session already active",
            Self::UpstreamError => "Upstream connection failed",
        }
    }

    /// WebSocket close code for errors reported after the upgrade.
    ///
    /// Upstream failures close like a normal disconnect so clients simply retry.
    pub fn close_code(&self) -> u16 {
        match self {
            Self::UserIdRequired => CLOSE_USER_ID_REQUIRED,
            Self::DuplicateSession => CLOSE_DUPLICATE_SESSION,
            Self::NotWebSocket | Self::UpstreamError => CLOSE_NORMAL,
        }
    }

    pub fn to_http_response(&self) -> (StatusCode, Json<ErrorResponse>) {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ErrorResponse { error: self.message().to_owned() }))
    }
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::error::Error for RelayError {}

/// JSON error body: `{"error": "<message>"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
