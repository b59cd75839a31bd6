//! Retry with randomized delays for page fetches.
//!
//! Unlike exponential back-off, every pause is drawn uniformly from a fixed
//! window so the gaps between requests to the listing site carry no
//! detectable rhythm.

use std::future::Future;
use std::ops::RangeInclusive;
use std::time::Duration;

use rand::Rng;

use crate::error::ScraperError;

/// Returns `true` for failures that another attempt might fix.
///
/// Retriable:
/// - [`ScraperError::Http`]: WebDriver endpoint unreachable, connection reset.
/// - [`ScraperError::WebDriver`]: navigation or script error reported by the browser.
/// - [`ScraperError::UnexpectedStatus`]: non-2xx from the WebDriver server.
/// - [`ScraperError::MarkerTimeout`]: the listing never rendered its items.
///
/// Everything else is a configuration or data problem and is returned as-is.
pub(crate) fn is_retriable(err: &ScraperError) -> bool {
    matches!(
        err,
        ScraperError::Http(_)
            | ScraperError::WebDriver { .. }
            | ScraperError::UnexpectedStatus { .. }
            | ScraperError::MarkerTimeout { .. }
    )
}

/// Draws a delay uniformly from `window_ms`. An inverted window yields its start.
pub(crate) fn jitter_delay(window_ms: &RangeInclusive<u64>) -> Duration {
    let (lo, hi) = (*window_ms.start(), *window_ms.end());
    let ms = if lo >= hi {
        lo
    } else {
        rand::rng().random_range(lo..=hi)
    };
    Duration::from_millis(ms)
}

/// Runs `operation` up to `max_attempts` times in total.
///
/// Between attempts it sleeps a random delay from `delay_ms`; there is no
/// sleep after the final attempt. Non-retriable errors are returned
/// immediately. A `max_attempts` of zero behaves like one.
pub(crate) async fn retry_with_jitter<T, F, Fut>(
    max_attempts: u32,
    delay_ms: RangeInclusive<u64>,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1u32;

    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_attempts {
                    return Err(err);
                }
                let delay = jitter_delay(&delay_ms);
                tracing::warn!(
                    attempt,
                    max_attempts,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "page attempt failed, retrying after jittered delay"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
