//! Cancelable one-shot inactivity timer
//!
//! The timer task only sleeps and then calls back with the epoch it was
//! armed under. The owner checks that epoch with [`Watchdog::claim`] while
//! holding its own lock, so a timer that woke just before being cancelled
//! never acts.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Debug, Default)]
pub struct Watchdog {
    epoch: u64,
    task: Option<JoinHandle<()>>,
}

impl Watchdog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) the timer
    ///
    /// `on_fire` receives the epoch to hand back to [`Watchdog::claim`].
    pub fn arm<F, Fut>(&mut self, timeout: Duration, on_fire: F)
    where
        F: FnOnce(u64) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let epoch = self.epoch;
        self.task = Some(tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            on_fire(epoch).await;
        }));
        tracing::debug!(epoch, timeout_secs = timeout.as_secs(), "Watchdog armed");
    }

    /// Stop the timer; any callback already in flight becomes stale
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!(epoch = self.epoch, "Watchdog cancelled");
        }
        self.epoch += 1;
    }

    /// Accept a firing from the timer armed under `epoch`
    ///
    /// Returns `false` if the timer was cancelled or re-armed since. On
    /// success the watchdog is disarmed without aborting the calling task.
    pub fn claim(&mut self, epoch: u64) -> bool {
        if self.task.is_none() || epoch != self.epoch {
            return false;
        }
        self.task = None;
        self.epoch += 1;
        true
    }

    pub fn is_armed(&self) -> bool {
        self.task.is_some()
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
