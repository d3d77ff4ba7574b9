// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

/// What to do when a second client connects with an already-registered user id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum DuplicatePolicy {
    /// Close the prior pair and register the new one (newest tab wins).
    #[default]
    Replace,
    /// Keep the prior pair and close the new socket with 4009.
    Reject,
}

/// Configuration for the notification relay.
#[derive(Debug, Clone, clap::Args)]
pub struct RelayConfig {
    /// Host to bind on.
    #[arg(long, default_value = "127.0.0.1", env = "MEDRELAY_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 3001, env = "MEDRELAY_PORT")]
    pub port: u16,

    /// Base URL of the notification backend (`https://`, `http://`, `wss://` or `ws://`).
    #[arg(long, default_value = "wss://api.example.com", env = "MEDRELAY_BACKEND_URL")]
    pub backend_url: String,

    /// Handling of a second connection for the same user id.
    #[arg(long, value_enum, default_value_t = DuplicatePolicy::Replace, env = "MEDRELAY_ON_DUPLICATE")]
    pub on_duplicate: DuplicatePolicy,

    /// Upstream handshake timeout in milliseconds. 0 disables the timeout.
    #[arg(long, default_value_t = 0, env = "MEDRELAY_UPSTREAM_CONNECT_TIMEOUT_MS")]
    pub upstream_connect_timeout_ms: u64,
}

impl RelayConfig {
    pub fn upstream_connect_timeout(&self) -> Option<Duration> {
        match self.upstream_connect_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
