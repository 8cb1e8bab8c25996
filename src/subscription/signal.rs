//! Signal coalescer: wakes the delivery side periodically instead of
//! broadcasting the condition on every enqueue under load.

use super::sub::{Subscription, SLOW_SIGNAL_INTERVAL};
use crate::error::Result;
use crate::timer::Timer;
use log::trace;
use std::sync::Arc;

/// Consecutive failed lock attempts tolerated before a tick blocks for the
/// lock instead of skipping.
const SIGNAL_FAIL_LIMIT: u32 = 10;

/// Start the signal timer for `sub`, initially in slow mode. The tick
/// closure owns one handle to the subscription, released when the timer
/// thread exits after `stop`.
///
/// Each tick tries the subscription lock without blocking so a busy
/// delivery side is left alone; only `SIGNAL_FAIL_LIMIT` consecutive
/// misses force a blocking acquire. With the lock held, an empty queue
/// sends the timer back to slow mode, and a non-empty queue with waiters
/// gets a broadcast.
pub(super) fn spawn_signal_timer(sub: &Arc<Subscription>) -> Result<Timer> {
    let tick_sub = Arc::clone(sub);
    let sid = sub.id();
    // Touched only by the timer thread.
    let mut fail_count = 0u32;

    Timer::spawn(
        SLOW_SIGNAL_INTERVAL,
        move || {
            let mut inner = match tick_sub.mu.try_lock() {
                Some(inner) => {
                    fail_count = 0;
                    inner
                }
                None => {
                    fail_count += 1;
                    if fail_count < SIGNAL_FAIL_LIMIT {
                        return;
                    }
                    fail_count = 0;
                    tick_sub.mu.lock()
                }
            };

            if inner.list.is_empty() {
                if inner.signal_interval != SLOW_SIGNAL_INTERVAL {
                    inner.signal_interval = SLOW_SIGNAL_INTERVAL;
                    if let Some(timer) = tick_sub.signal_timer.get() {
                        timer.reset(SLOW_SIGNAL_INTERVAL);
                    }
                    trace!("signal timer for subscription {} back to slow mode", sid);
                }
            } else if inner.in_wait > 0 {
                tick_sub.cond.notify_all();
            }
        },
        move || {
            trace!("signal timer for subscription {} stopped", sid);
        },
    )
}
