use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};

/// Reads the `Retry-After` header as a delay in seconds.
///
/// Fractional values are accepted. HTTP-date values, negative numbers and
/// garbage yield `None`, which makes the throttler fall back to its default
/// backoff.
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();
    let seconds = value.parse::<f64>().ok()?;
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(seconds).ok()
}
