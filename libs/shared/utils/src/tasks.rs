use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{debug, warn};

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// A timer-driven task owned by the component that started it.
///
/// Dropping the handle aborts the task, so a callback can never run after its
/// owner has been torn down.
#[derive(Debug)]
pub struct ScheduledTask {
    name: String,
    handle: JoinHandle<()>,
}

impl ScheduledTask {
    /// Runs `task` once after `delay`.
    pub fn after<F>(name: impl Into<String>, delay: Duration, task: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        let handle = tokio::spawn(async move {
            sleep(delay).await;
            task.await;
        });

        debug!("Scheduled task '{}' to run in {:?}", name, delay);
        Self { name, handle }
    }

    /// Runs `tick` immediately and then every `period` until cancelled.
    /// A zero period is raised to one millisecond.
    pub fn every<F, Fut>(name: impl Into<String>, period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        let period = if period.is_zero() {
            warn!("Scheduled task '{}' given a zero period, using {:?}", name, MIN_PERIOD);
            MIN_PERIOD
        } else {
            period
        };
        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                tick().await;
            }
        });

        debug!("Scheduled task '{}' every {:?}", name, period);
        Self { name, handle }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cancel(&self) {
        if !self.handle.is_finished() {
            debug!("Cancelling scheduled task '{}'", self.name);
            self.handle.abort();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.cancel();
    }
}
