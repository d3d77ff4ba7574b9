// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::RelayConfig;
use crate::registry::{PairEntry, Registry};

/// Shared relay state: one instance per server.
///
/// Every pair's cancellation token is a child of `shutdown`, so cancelling
/// the relay tears down all pairs.
pub struct Relay {
    pub config: RelayConfig,
    pub registry: Registry,
    pub shutdown: CancellationToken,
}

impl Relay {
    pub fn new(config: RelayConfig, shutdown: CancellationToken) -> Self {
        Self { config, registry: Registry::new(), shutdown }
    }

    /// Create a pair entry whose lifetime is bounded by the relay's.
    pub fn new_pair(&self, user_id: &str) -> Arc<PairEntry> {
        PairEntry::new(user_id, self.shutdown.child_token())
    }

    /// Close all tracked pairs and stop the server.
    pub async fn shutdown(&self) {
        let closed = self.registry.close_all().await;
        self.shutdown.cancel();
        tracing::info!(closed, "relay shut down");
    }
}
