// Window arithmetic and retry helpers for PermitScanExecutor

use std::collections::{BTreeSet, HashSet};
use std::future::Future;
use std::time::Duration;

use chrono::NaiveDate;
use rand::Rng;
use rec_gov::RecGovError;
use tokio::time::sleep;
use tracing::warn;

use crate::scan_types::{DateWindow, RetryPolicy, month_start};

/// Months to fetch for `window`: the month of its first day and the month
/// of its last day, deduplicated and ascending.
pub fn months_to_query(window: &DateWindow) -> Vec<NaiveDate> {
    let months: BTreeSet<NaiveDate> = [month_start(window.start()), month_start(window.end())]
        .into_iter()
        .collect();
    months.into_iter().collect()
}

/// Days of `window` that appear in `available`, in window order
pub fn window_hits(window: &DateWindow, available: &HashSet<NaiveDate>) -> Vec<NaiveDate> {
    window.days().filter(|day| available.contains(day)).collect()
}

/// ISO strings of `hits` not yet in `seen`, keeping the order of `hits`
pub fn new_hits(hits: &[NaiveDate], seen: &BTreeSet<String>) -> Vec<String> {
    hits.iter()
        .map(|day| day.format("%Y-%m-%d").to_string())
        .filter(|day| !seen.contains(day))
        .collect()
}

/// Delay before retry number `retry` (1-based): exponential on
/// `base_delay` plus up to one `base_delay` of random jitter.
pub fn backoff_delay(policy: &RetryPolicy, retry: u32) -> Duration {
    let exponent = retry.saturating_sub(1).min(16);
    let backoff = policy.base_delay.saturating_mul(1u32 << exponent);

    let base_ms = policy.base_delay.as_millis() as u64;
    if base_ms == 0 {
        return backoff;
    }
    let jitter = Duration::from_millis(rand::rng().random_range(0..base_ms));
    backoff.saturating_add(jitter)
}

/// Run `op` until it succeeds, fails with a non-transient error, or the
/// policy's attempts are used up. The last error is returned.
pub async fn retry_transient<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut op: F,
) -> Result<T, RecGovError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RecGovError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < max_attempts => {
                let delay = backoff_delay(policy, attempt);
                warn!(
                    "{} failed (attempt {}/{}): {}; retrying in {:?}",
                    label, attempt, max_attempts, e, delay
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
