//! Delivery worker for asynchronous subscriptions.

use super::sub::{MsgHandler, Subscription};
use crate::error::{Error, Result};
use log::debug;
use std::sync::Arc;
use std::thread;

/// Start the delivery thread for an asynchronous subscription. The thread
/// owns the handler and one handle to the subscription for its whole life;
/// the handle drops when the loop exits.
pub(super) fn spawn_worker(sub: &Arc<Subscription>, mut handler: MsgHandler) -> Result<()> {
    let sub = Arc::clone(sub);
    thread::Builder::new()
        .name(format!("deliver-{}", sub.id()))
        .spawn(move || {
            loop {
                let mut inner = sub.mu.lock();

                inner.in_wait += 1;
                while inner.list.is_empty() && !inner.closed {
                    sub.cond.wait(&mut inner);
                }
                inner.in_wait -= 1;

                if inner.closed {
                    break;
                }

                // The wait above guarantees a head message; skip the round
                // if it is not there.
                let msg = match inner.list.dequeue() {
                    Some(msg) => msg,
                    None => continue,
                };

                inner.delivered += 1;
                let delivered = inner.delivered;
                let max = inner.max;
                drop(inner);

                if max == 0 || delivered <= max {
                    handler(&sub, msg);
                }
                // Not an else: removal happens once the final callback has
                // returned.
                if max > 0 && delivered >= max {
                    sub.close(false);
                    sub.conn.remove_subscription(&sub, true);
                    break;
                }
            }
            debug!("delivery worker for subscription {} exiting", sub.id());
        })
        .map_err(|e| Error::Resource(e.to_string()))?;
    Ok(())
}
