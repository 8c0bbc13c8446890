//! Recurring Sweep
//!
//! Runs [`CheckResultsUseCase::check_all_pending`] on a fixed period for the
//! lifetime of the process. The first sweep starts immediately.

use crate::application::check_results::CheckResultsUseCase;
use crate::domain::draw_source::DrawSource;
use crate::domain::repository::TicketRepository;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Spawn the recurring sweep
///
/// Each sweep waits a random delay of at most `jitter` first. A failed sweep
/// is logged and the next one runs on schedule. Abort the returned handle to
/// stop it.
pub fn schedule_recurring<R, D>(
    use_case: Arc<CheckResultsUseCase<R, D>>,
    interval: Duration,
    jitter: Duration,
) -> JoinHandle<()>
where
    R: TicketRepository + Send + Sync + 'static,
    D: DrawSource + Send + Sync + 'static,
{
    tracing::info!(
        interval_secs = interval.as_secs(),
        jitter_secs = jitter.as_secs(),
        "Recurring sweep scheduled"
    );

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let delay = platform::jitter::random_delay(jitter);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            if let Err(e) = use_case.check_all_pending().await {
                tracing::error!(error = %e, "Sweep failed");
            }
        }
    })
}
