//! [`TickTimer`] – the only scheduling primitive of a session.
//!
//! Runs a Tokio interval on its own task and calls back on every period.
//! Starting an already running timer cancels the previous task first, and
//! stopping aborts it, so at most one tick source exists at a time.

use std::time::Duration;

use scenegeo_types::SceneError;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::debug;

/// Default positioning cadence.
pub const DEFAULT_TICK_HZ: f64 = 10.0;

pub struct TickTimer {
    period: Duration,
    task: Option<JoinHandle<()>>,
}

impl TickTimer {
    pub fn new(period: Duration) -> Self {
        Self { period, task: None }
    }

    /// A timer firing `hz` times per second.
    ///
    /// # Errors
    ///
    /// [`SceneError::Config`] unless `hz` is finite and positive.
    pub fn from_hz(hz: f64) -> Result<Self, SceneError> {
        if !(hz.is_finite() && hz > 0.0) {
            return Err(SceneError::Config(format!(
                "tick rate must be positive, got {hz}"
            )));
        }
        Ok(Self::new(Duration::from_secs_f64(1.0 / hz)))
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Begin calling `on_tick` every period, replacing any running timer.
    /// The timer ends by itself when `on_tick` returns `false`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start<F>(&mut self, mut on_tick: F)
    where
        F: FnMut() -> bool + Send + 'static,
    {
        self.stop();
        let period = self.period;
        self.task = Some(tokio::spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if !on_tick() {
                    break;
                }
            }
        }));
        debug!(period_ms = period.as_millis() as u64, "Tick timer started");
    }

    /// Cancel the running timer, if any.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("Tick timer stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for TickTimer {
    fn drop(&mut self) {
        self.stop();
    }
}
