//! Waiting for external state to settle after a simulated interaction.
//!
//! Both primitives are time based and therefore sensitive to slow
//! environments: a transition that takes longer than the ceiling is reported
//! as not settled even if it would eventually finish.

use crate::config::SettleConfig;
use crate::error::{HarnessError, Result};
use core::time::Duration;
use tokio::time::{Instant, sleep};

/// Poll `predicate` until it holds or the ceiling elapses.
///
/// Returns the time it took for the predicate to hold.
///
/// # Errors
/// Returns [`HarnessError::SettleTimeout`] if the predicate still fails once
/// the ceiling has elapsed.
pub async fn wait_until<F>(mut predicate: F, settle: SettleConfig) -> Result<Duration>
where
    F: FnMut() -> bool,
{
    let start = Instant::now();
    let ceiling = settle.ceiling();

    loop {
        if predicate() {
            return Ok(start.elapsed());
        }

        let elapsed = start.elapsed();
        if elapsed >= ceiling {
            tracing::debug!("Settle condition still false after {elapsed:?}");
            return Err(HarnessError::SettleTimeout(ceiling));
        }

        sleep(settle.poll_interval().min(ceiling - elapsed)).await;
    }
}

/// Fixed settle delay, the fallback when no predicate is available.
pub async fn settle(delay: Duration) {
    sleep(delay).await;
}
