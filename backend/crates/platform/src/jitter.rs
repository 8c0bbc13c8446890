//! Jitter for periodic jobs
//!
//! Spreads recurring outbound work so several instances started at the same
//! moment do not hit an upstream API in lockstep.

use rand::Rng;
use std::time::Duration;

/// Random delay in `[0, max]` (millisecond resolution)
pub fn random_delay(max: Duration) -> Duration {
    let max_ms = max.as_millis().min(u64::MAX as u128) as u64;
    if max_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::rng().random_range(0..=max_ms))
}
