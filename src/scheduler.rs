//! Half-hour post scheduler
//!
//! Waits for the next wall-clock half hour with a one-shot deadline, then
//! switches to a fixed 30 minute interval. Only one timer is live at a time.

use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::time::{interval_at, sleep_until, Instant, Interval, MissedTickBehavior};
use tracing::info;

pub const PERIOD: Duration = Duration::from_secs(30 * 60);

/// Time from `now` until the next half-hour boundary strictly after it
pub fn delay_until_next_half_hour(now: DateTime<Utc>) -> Duration {
    let period_ms = PERIOD.as_millis() as i64;
    let into_period = now.timestamp_millis().rem_euclid(period_ms);
    Duration::from_millis((period_ms - into_period) as u64)
}

#[derive(Debug)]
pub enum SchedulerState {
    AwaitingFirstBoundary { deadline: Instant },
    Periodic { interval: Interval },
}

/// Which timer produced a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickPhase {
    FirstBoundary,
    Periodic,
}

#[derive(Debug)]
pub struct Scheduler {
    state: SchedulerState,
}

impl Scheduler {
    /// Schedule the first post for the half hour after the current time
    pub fn new() -> Self {
        let delay = delay_until_next_half_hour(Utc::now());
        info!(first_post_in_secs = delay.as_secs(), "Scheduler armed");
        Self::with_first_delay(delay)
    }

    /// Schedule the first post `delay` from now
    pub fn with_first_delay(delay: Duration) -> Self {
        Self {
            state: SchedulerState::AwaitingFirstBoundary {
                deadline: Instant::now() + delay,
            },
        }
    }

    pub fn state(&self) -> &SchedulerState {
        &self.state
    }

    /// Wait for the next post time.
    ///
    /// Cancel safe: dropping the future before it completes leaves the
    /// schedule unchanged, so this can sit in a `select!` loop.
    pub async fn tick(&mut self) -> TickPhase {
        match &mut self.state {
            SchedulerState::AwaitingFirstBoundary { deadline } => {
                let deadline = *deadline;
                sleep_until(deadline).await;

                let mut interval = interval_at(deadline + PERIOD, PERIOD);
                interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
                self.state = SchedulerState::Periodic { interval };
                TickPhase::FirstBoundary
            }
            SchedulerState::Periodic { interval } => {
                interval.tick().await;
                TickPhase::Periodic
            }
        }
    }
}
