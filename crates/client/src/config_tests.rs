// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use super::ReconnectPolicy;

#[test]
fn default_is_fixed_five_seconds_forever() {
    let policy = ReconnectPolicy::default();
    for attempt in [1, 2, 10, 1000] {
        assert_eq!(policy.delay_for(attempt), Duration::from_millis(5000));
    }
    assert!(!policy.exhausted(u32::MAX));
}

#[yare::parameterized(
    first = { 1, 100 },
    second = { 2, 200 },
    third = { 3, 400 },
    capped = { 6, 1000 },
    far_out = { 500, 1000 },
)]
fn exponential_growth_is_capped(attempt: u32, expected_ms: u64) {
    let policy = ReconnectPolicy {
        delay: Duration::from_millis(100),
        multiplier: 2.0,
        max_delay: Duration::from_millis(1000),
        max_attempts: None,
    };
    assert_eq!(policy.delay_for(attempt), Duration::from_millis(expected_ms));
}

#[test]
fn max_attempts_exhausts() {
    let policy = ReconnectPolicy { max_attempts: Some(3), ..ReconnectPolicy::default() };
    assert!(!policy.exhausted(2));
    assert!(policy.exhausted(3));
}
