// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;

/// Errors raised by the relay client.
///
/// Transport errors never reach UI callers; they drive reconnects and are
/// only logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Page origin is not `http://` or `https://`.
    InvalidOrigin(String),
    /// WebSocket handshake failed.
    Connect(String),
    /// Read or write failed on an open socket.
    Transport(String),
    /// The socket is gone.
    Closed,
}

impl ClientError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidOrigin(_) => "INVALID_ORIGIN",
            Self::Connect(_) => "CONNECT",
            Self::Transport(_) => "TRANSPORT",
            Self::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidOrigin(origin) => write!(f, "invalid page origin: {origin}"),
            Self::Connect(e) => write!(f, "connect failed: {e}"),
            Self::Transport(e) => write!(f, "transport error: {e}"),
            Self::Closed => f.write_str("socket closed"),
        }
    }
}

impl std::error::Error for ClientError {}
