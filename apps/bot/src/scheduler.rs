//! Timer loops that fire the bot's jobs.
//!
//! Each loop owns one job and stops when the shared cancellation token fires.
//! A job is awaited to completion before the next wait starts, so a slow run
//! delays the following one instead of overlapping it.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, NaiveTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Runs `job` every `period`, first after one full period.
pub fn spawn_interval<F, Fut>(
    name: &'static str,
    period: Duration,
    cancel: CancellationToken,
    job: F,
) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("{name}: every {}s", period.as_secs());

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => job().await,
            }
        }
        info!("{name}: stopped");
    })
}

/// Runs `job` every day at `at` wall-clock time in `offset`.
pub fn spawn_daily<F, Fut>(
    name: &'static str,
    at: NaiveTime,
    offset: FixedOffset,
    cancel: CancellationToken,
    job: F,
) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    tokio::spawn(async move {
        loop {
            let wait = duration_until_next(Utc::now(), at, &offset);
            info!("{name}: next run in {}m", wait.as_secs() / 60);

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(wait) => job().await,
            }
        }
        info!("{name}: stopped");
    })
}

/// Time from `now` until the next `at` in `offset`. Never zero: a run due
/// exactly now is scheduled for tomorrow.
pub fn duration_until_next(now: DateTime<Utc>, at: NaiveTime, offset: &FixedOffset) -> Duration {
    let local = now.with_timezone(offset).naive_local();
    let mut target = local.date().and_time(at);
    if target <= local {
        target += chrono::Duration::days(1);
    }
    (target - local).to_std().unwrap_or(Duration::ZERO)
}
