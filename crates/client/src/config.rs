// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

/// Default delay between a close and the next connect attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(5000);

/// When and how often to reconnect after the relay socket closes.
///
/// The default is a fixed 5 s delay, retried forever.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    /// Delay before the first reconnect attempt.
    pub delay: Duration,
    /// Growth factor per consecutive failure. `1.0` keeps the delay fixed.
    pub multiplier: f64,
    /// Upper bound on the grown delay.
    pub max_delay: Duration,
    /// Stop after this many consecutive failures. `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            delay: DEFAULT_RECONNECT_DELAY,
            multiplier: 1.0,
            max_delay: DEFAULT_RECONNECT_DELAY,
            max_attempts: None,
        }
    }
}

impl ReconnectPolicy {
    /// Fixed delay, unlimited retries.
    pub fn fixed(delay: Duration) -> Self {
        Self { delay, multiplier: 1.0, max_delay: delay, max_attempts: None }
    }

    /// Delay before reconnect number `attempt` (1-based, counted since the
    /// last successful open).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if self.multiplier <= 1.0 {
            return self.delay;
        }
        let exp = attempt.saturating_sub(1).min(63) as i32;
        let grown = self.delay.as_secs_f64() * self.multiplier.powi(exp);
        let capped = grown.min(self.max_delay.as_secs_f64()).max(self.delay.as_secs_f64());
        Duration::from_secs_f64(capped)
    }

    /// Whether `failures` consecutive failures exhaust the policy.
    pub fn exhausted(&self, failures: u32) -> bool {
        self.max_attempts.is_some_and(|max| failures >= max)
    }
}

/// Client configuration.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub reconnect: ReconnectPolicy,
    /// Capacity of the new-message broadcast. Slow subscribers skip ahead.
    pub broadcast_capacity: Option<usize>,
}

impl ClientConfig {
    pub(crate) fn broadcast_capacity(&self) -> usize {
        self.broadcast_capacity.unwrap_or(256).max(1)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
