// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry of live connection pairs, keyed by user id.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::DuplicatePolicy;
use crate::error::RelayError;

/// One bridged client/upstream pair.
///
/// Cancelling `cancel` tears down both legs of the pair.
pub struct PairEntry {
    pub user_id: String,
    pub connection_id: Uuid,
    pub registered_at: Instant,
    pub cancel: CancellationToken,
}

impl PairEntry {
    pub fn new(user_id: impl Into<String>, cancel: CancellationToken) -> Arc<Self> {
        Arc::new(Self {
            user_id: user_id.into(),
            connection_id: Uuid::new_v4(),
            registered_at: Instant::now(),
            cancel,
        })
    }
}

/// `user_id -> pair` bookkeeping. Holds at most one pair per user id.
#[derive(Default)]
pub struct Registry {
    pairs: RwLock<HashMap<String, Arc<PairEntry>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pair under its user id, applying `policy` on collision.
    ///
    /// With [`DuplicatePolicy::Replace`] the prior pair is cancelled and
    /// returned. With [`DuplicatePolicy::Reject`] a live prior pair makes this
    /// fail with [`RelayError::DuplicateSession`].
    pub async fn register(
        &self,
        entry: Arc<PairEntry>,
        policy: DuplicatePolicy,
    ) -> Result<Option<Arc<PairEntry>>, RelayError> {
        let mut pairs = self.pairs.write().await;
        if let Some(prior) = pairs.get(&entry.user_id) {
            if policy == DuplicatePolicy::Reject && !prior.cancel.is_cancelled() {
                return Err(RelayError::DuplicateSession);
            }
        }
        let prior = pairs.insert(entry.user_id.clone(), entry);
        if let Some(ref prior) = prior {
            prior.cancel.cancel();
        }
        Ok(prior)
    }

    /// Remove the entry for `user_id` if it still belongs to `connection_id`.
    ///
    /// A replaced pair tearing down must not evict its successor.
    pub async fn remove(&self, user_id: &str, connection_id: Uuid) -> bool {
        let mut pairs = self.pairs.write().await;
        match pairs.get(user_id) {
            Some(entry) if entry.connection_id == connection_id => {
                pairs.remove(user_id);
                true
            }
            _ => false,
        }
    }

    pub async fn get(&self, user_id: &str) -> Option<Arc<PairEntry>> {
        self.pairs.read().await.get(user_id).map(Arc::clone)
    }

    pub async fn contains(&self, user_id: &str) -> bool {
        self.pairs.read().await.contains_key(user_id)
    }

    pub async fn len(&self) -> usize {
        self.pairs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.pairs.read().await.is_empty()
    }

    /// Snapshot of all entries, sorted by user id.
    pub async fn snapshot(&self) -> Vec<Arc<PairEntry>> {
        let pairs = self.pairs.read().await;
        let mut entries: Vec<_> = pairs.values().map(Arc::clone).collect();
        entries.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        entries
    }

    /// Cancel every tracked pair and clear the registry.
    pub async fn close_all(&self) -> usize {
        let drained: Vec<_> = self.pairs.write().await.drain().map(|(_, e)| e).collect();
        for entry in &drained {
            entry.cancel.cancel();
        }
        drained.len()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
