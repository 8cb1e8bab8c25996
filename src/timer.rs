//! Periodic timer used to drive the signal coalescer.
//!
//! Each timer owns a dedicated thread that invokes a tick callback at a
//! resettable interval. Stopping the timer runs a stop callback exactly
//! once, on the timer thread, after which the thread exits and everything
//! captured by the callbacks is dropped.

use crate::error::{Error, Result};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

struct TimerState {
    interval: Duration,
    /// Bumped on every reset so an in-progress wait restarts with the new
    /// interval instead of firing against the old deadline.
    epoch: u64,
    stopped: bool,
}

struct TimerShared {
    state: Mutex<TimerState>,
    cond: Condvar,
}

/// Handle controlling a periodic timer thread.
pub struct Timer {
    shared: Arc<TimerShared>,
}

impl Timer {
    /// Start a timer firing `on_tick` every `interval`, measured from the
    /// previous fire (or the latest reset).
    pub fn spawn<T, S>(interval: Duration, mut on_tick: T, on_stop: S) -> Result<Timer>
    where
        T: FnMut() + Send + 'static,
        S: FnOnce() + Send + 'static,
    {
        let shared = Arc::new(TimerShared {
            state: Mutex::new(TimerState {
                interval,
                epoch: 0,
                stopped: false,
            }),
            cond: Condvar::new(),
        });

        let thread_shared = Arc::clone(&shared);
        thread::Builder::new()
            .name("signal-timer".into())
            .spawn(move || {
                'timer: loop {
                    let mut state = thread_shared.state.lock();
                    let epoch = state.epoch;
                    let deadline = Instant::now() + state.interval;
                    loop {
                        if state.stopped {
                            break 'timer;
                        }
                        if state.epoch != epoch {
                            continue 'timer;
                        }
                        if thread_shared
                            .cond
                            .wait_until(&mut state, deadline)
                            .timed_out()
                        {
                            break;
                        }
                    }
                    drop(state);
                    on_tick();
                }
                on_stop();
            })
            .map_err(|e| Error::Resource(e.to_string()))?;

        Ok(Timer { shared })
    }

    /// Reschedule the next fire to `interval` from now and make `interval`
    /// the new period. No-op once the timer has been stopped.
    pub fn reset(&self, interval: Duration) {
        let mut state = self.shared.state.lock();
        if state.stopped {
            return;
        }
        state.interval = interval;
        state.epoch += 1;
        self.shared.cond.notify_all();
    }

    /// Ask the timer thread to exit. The stop callback runs exactly once,
    /// on the timer thread; repeat calls are no-ops.
    pub fn stop(&self) {
        let mut state = self.shared.state.lock();
        if state.stopped {
            return;
        }
        state.stopped = true;
        self.shared.cond.notify_all();
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.stop();
    }
}
