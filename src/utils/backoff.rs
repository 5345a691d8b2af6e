//! Exponential backoff utilities for polling loops.

use crate::constants::{MAX_BACKOFF_DELAY_MS, STARTING_BACKOFF_DELAY_MS};
use std::time::Duration;

/// Delay for a given 0-based attempt: 10ms, 20ms, 40ms... capped at 500ms.
#[must_use]
pub fn backoff_delay(attempt: u32) -> Duration {
    let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
    let delay = STARTING_BACKOFF_DELAY_MS.saturating_mul(factor).min(MAX_BACKOFF_DELAY_MS);
    Duration::from_millis(delay)
}

/// Sleeps for [`backoff_delay`] of `attempt` and returns the next attempt number.
pub async fn exponential_backoff_with_delay(attempt: u32) -> u32 {
    tokio::time::sleep(backoff_delay(attempt)).await;
    attempt.saturating_add(1)
}
