// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection state machine for the reconnecting socket.

use serde::Serialize;

/// Client-observed state of the client-to-relay leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Not connected; a reconnect may be pending.
    #[default]
    Idle,
    Connecting,
    Open,
    /// Force-closing after an error.
    Closing,
    /// Disposed by its owner. Terminal.
    Disposed,
}

/// Inputs to [`ConnectionState::on`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnEvent {
    /// First connect requested by the owner.
    Connect,
    /// Handshake completed.
    Opened,
    /// Socket closed, or the handshake failed.
    Closed,
    /// Read or write error on the socket.
    Errored,
    /// Reconnect delay elapsed.
    RetryElapsed,
    /// Owner dropped or closed the socket.
    Dispose,
}

impl ConnectionState {
    /// Next state after `event`. Events that don't apply leave the state as is.
    pub fn on(self, event: ConnEvent) -> Self {
        use ConnEvent::*;
        use ConnectionState::*;
        match (self, event) {
            (Disposed, _) | (_, Dispose) => Disposed,
            (Idle, Connect | RetryElapsed) => Connecting,
            (Connecting, Opened) => Open,
            (Connecting, Closed | Errored) => Idle,
            (Open, Errored) => Closing,
            (Open | Closing, Closed) => Idle,
            (state, _) => state,
        }
    }

    /// The boolean flag exposed to UI code.
    pub fn is_connected(self) -> bool {
        self == Self::Open
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closing => "closing",
            Self::Disposed => "disposed",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
