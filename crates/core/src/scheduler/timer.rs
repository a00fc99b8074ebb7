//! Cancellable timers.
//!
//! Each timer owns one spawned task and one stop channel. Disarming signals
//! the task; a firing already in progress runs to completion.

use std::future::Future;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};

struct Armed {
    stop: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl Armed {
    fn disarm(self) {
        let _ = self.stop.send(());
    }

    fn is_live(&self) -> bool {
        !self.handle.is_finished()
    }
}

/// Fires `tick` every `period`, starting one period after arming.
pub struct RepeatingTimer {
    armed: Option<Armed>,
}

impl RepeatingTimer {
    pub fn arm<F, Fut>(period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (stop, mut stop_rx) = oneshot::channel();
        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = &mut stop_rx => break,
                    _ = interval.tick() => tick().await,
                }
            }
        });
        Self {
            armed: Some(Armed { stop, handle }),
        }
    }

    pub fn disarm(&mut self) {
        if let Some(armed) = self.armed.take() {
            armed.disarm();
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed.as_ref().is_some_and(Armed::is_live)
    }
}

impl Drop for RepeatingTimer {
    fn drop(&mut self) {
        self.disarm();
    }
}

/// Fires `fire` once after `delay` unless disarmed first.
pub struct OneShotTimer {
    armed: Option<Armed>,
}

impl OneShotTimer {
    pub fn arm<F, Fut>(delay: Duration, fire: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (stop, stop_rx) = oneshot::channel();
        let handle = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = stop_rx => {}
                _ = sleep(delay) => fire().await,
            }
        });
        Self {
            armed: Some(Armed { stop, handle }),
        }
    }

    pub fn disarm(&mut self) {
        if let Some(armed) = self.armed.take() {
            armed.disarm();
        }
    }

    /// True until the timer has fired (and finished) or was disarmed.
    pub fn is_armed(&self) -> bool {
        self.armed.as_ref().is_some_and(Armed::is_live)
    }
}

impl Drop for OneShotTimer {
    fn drop(&mut self) {
        self.disarm();
    }
}
