//! Exponential backoff for batch fetch retries

use std::time::Duration;

/// Backoff before retrying after the failed attempt `attempt`
/// (0-based): `base * 2^attempt`. No jitter, no cap.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base * 2u32.pow(attempt)
}
