//! Bounded polling for remote state that appears asynchronously

use std::future::Future;
use std::time::Duration;
use tokio::time::interval;
use tp_core::PatchError;
use tracing::debug;

/// Call `probe` once per `period` until it returns true.
///
/// The first probe runs immediately. After `max_attempts` false results the
/// poll fails with [`PatchError::Timeout`]. A zero `period` is rejected with
/// [`PatchError::Validation`].
pub async fn poll_until<F, Fut>(period: Duration, max_attempts: u32, mut probe: F) -> Result<(), PatchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    if period.is_zero() {
        return Err(PatchError::Validation("poll period must be greater than zero".to_string()));
    }
    let mut timer = interval(period);

    for attempt in 1..=max_attempts {
        timer.tick().await;
        if probe().await {
            debug!("condition met after {} attempt(s)", attempt);
            return Ok(());
        }
        debug!("attempt {}/{} not yet satisfied", attempt, max_attempts);
    }

    Err(PatchError::Timeout(format!(
        "condition not met after {} attempts at {:?} intervals",
        max_attempts, period
    )))
}
