//! Synchronous message retrieval.

use super::sub::Subscription;
use crate::error::{Error, Result};
use crate::message::Message;
use std::time::{Duration, Instant};

impl Subscription {
    /// Return the next message available to a synchronous subscription,
    /// waiting up to `timeout`. A zero timeout never blocks: either a
    /// message is already pending or the call fails with
    /// [`Error::Timeout`] immediately.
    pub fn next_msg(&self, timeout: Duration) -> Result<Message> {
        let mut inner = self.mu.lock();

        if inner.conn_closed {
            return Err(Error::ConnectionClosed);
        }
        if inner.closed {
            if inner.max > 0 && inner.delivered >= inner.max {
                return Err(Error::MaxDeliveredMsgs);
            }
            return Err(Error::InvalidSubscription);
        }
        if self.is_async() {
            return Err(Error::IllegalState(
                "asynchronous subscription cannot be polled",
            ));
        }
        if inner.slow_consumer {
            inner.slow_consumer = false;
            return Err(Error::SlowConsumer);
        }

        if timeout.is_zero() {
            if inner.list.is_empty() {
                return Err(Error::Timeout);
            }
        } else {
            // Absolute deadline, computed once; spurious wakes re-wait
            // against the same instant.
            let deadline = Instant::now() + timeout;
            inner.in_wait += 1;
            let mut timed_out = false;
            while inner.list.is_empty() && !inner.closed && !timed_out {
                timed_out = self.cond.wait_until(&mut inner, deadline).timed_out();
            }
            inner.in_wait -= 1;

            if inner.closed {
                if inner.max > 0 && inner.delivered >= inner.max {
                    return Err(Error::MaxDeliveredMsgs);
                }
                return Err(Error::InvalidSubscription);
            }
            if inner.list.is_empty() {
                return Err(Error::Timeout);
            }
        }

        inner.delivered += 1;
        let mut remove_sub = false;
        if inner.max > 0 {
            if inner.delivered > inner.max {
                return Err(Error::MaxDeliveredMsgs);
            }
            if inner.delivered == inner.max {
                remove_sub = true;
            }
        }

        let msg = match inner.list.dequeue() {
            Some(msg) => msg,
            None => return Err(Error::Timeout),
        };
        drop(inner);

        if remove_sub {
            self.close(false);
            self.conn.remove_subscription(self, true);
        }
        Ok(msg)
    }
}
