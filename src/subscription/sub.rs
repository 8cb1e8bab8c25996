//! Subscription identity, lifecycle, and the reader-facing queue side.

use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::message::{Message, MsgList};
use crate::timer::Timer;
use log::{debug, warn};
use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use super::{delivery, signal};

/// Interval the signal timer idles at while the pending queue is empty.
pub(crate) const SLOW_SIGNAL_INTERVAL: Duration = Duration::from_millis(10_000);

/// Interval the reader shifts the signal timer to once messages queue up.
pub(crate) const FAST_SIGNAL_INTERVAL: Duration = Duration::from_millis(1);

/// Default bound on pending messages before the consumer counts as slow.
pub const DEFAULT_PENDING_MAX: usize = 65_536;

/// Counter for generating subscription ids.
static NEXT_SID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a subscription, assigned at creation.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubId(pub u64);

impl fmt::Debug for SubId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubId({})", self.0)
    }
}

impl fmt::Display for SubId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Callback invoked by the delivery worker for each message. The callback
/// owns the message; callbacks for one subscription run serially on its
/// worker thread.
pub type MsgHandler = Box<dyn FnMut(&Subscription, Message) + Send + 'static>;

/// Creation options for a subscription.
#[derive(Clone, Debug)]
pub struct SubOptions {
    /// Pending messages buffered before the consumer counts as slow and
    /// further messages are discarded.
    /// Default: 65536
    pub pending_max: usize,

    /// Wake the delivery side on every enqueue instead of coalescing.
    /// Default: false
    pub no_delay: bool,
}

impl Default for SubOptions {
    fn default() -> Self {
        Self {
            pending_max: DEFAULT_PENDING_MAX,
            no_delay: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SubKind {
    Async,
    Sync,
}

/// Mutable state, protected by the subscription lock.
pub(crate) struct SubInner {
    pub(crate) list: MsgList,
    /// Messages handed to the consumer (callback invoked or pull returned).
    pub(crate) delivered: u64,
    /// Auto-unsubscribe threshold; 0 means unlimited.
    pub(crate) max: u64,
    pub(crate) pending_max: usize,
    /// 75% of `pending_max`; the reader shifts the timer to fast mode at
    /// this depth.
    pub(crate) signal_limit: usize,
    pub(crate) no_delay: bool,
    /// Threads currently blocked on the condition.
    pub(crate) in_wait: u32,
    pub(crate) closed: bool,
    pub(crate) conn_closed: bool,
    /// Latched by the reader on overflow, consumed by `next_msg`.
    pub(crate) slow_consumer: bool,
    pub(crate) signal_interval: Duration,
}

/// A single subscription on a connection.
///
/// Created by the `subscribe*` constructors and shared through
/// `Arc<Subscription>`: the creator holds one handle, the delivery worker
/// (async subscriptions) holds one for its whole life, and the signal
/// timer holds one until its stop callback runs. The subscription keeps
/// its connection alive while any handle remains.
pub struct Subscription {
    sid: SubId,
    subject: String,
    queue: Option<String>,
    pub(crate) conn: Arc<dyn Connection>,
    pub(crate) kind: SubKind,
    pub(crate) mu: Mutex<SubInner>,
    pub(crate) cond: Condvar,
    pub(crate) signal_timer: OnceLock<Timer>,
}

impl Subscription {
    /// Express interest in `subject`, delivering messages asynchronously
    /// through `handler`. The subject may contain wildcards; matching is a
    /// server-side concern.
    pub fn subscribe<F>(
        conn: Arc<dyn Connection>,
        subject: impl Into<String>,
        handler: F,
    ) -> Result<Arc<Self>>
    where
        F: FnMut(&Subscription, Message) + Send + 'static,
    {
        Self::subscribe_with(conn, subject, None, Some(Box::new(handler)), SubOptions::default())
    }

    /// Synchronous variant of [`subscribe`](Self::subscribe): no callback,
    /// messages are retrieved with [`next_msg`](Self::next_msg).
    pub fn subscribe_sync(conn: Arc<dyn Connection>, subject: impl Into<String>) -> Result<Arc<Self>> {
        Self::subscribe_with(conn, subject, None, None, SubOptions::default())
    }

    /// Asynchronous queue-group subscription. All subscribers sharing
    /// `queue` form a group and the server delivers each message to one
    /// member of it.
    pub fn queue_subscribe<F>(
        conn: Arc<dyn Connection>,
        subject: impl Into<String>,
        queue: impl Into<String>,
        handler: F,
    ) -> Result<Arc<Self>>
    where
        F: FnMut(&Subscription, Message) + Send + 'static,
    {
        Self::subscribe_with(
            conn,
            subject,
            Some(queue.into()),
            Some(Box::new(handler)),
            SubOptions::default(),
        )
    }

    /// Synchronous queue-group subscription.
    pub fn queue_subscribe_sync(
        conn: Arc<dyn Connection>,
        subject: impl Into<String>,
        queue: impl Into<String>,
    ) -> Result<Arc<Self>> {
        Self::subscribe_with(conn, subject, Some(queue.into()), None, SubOptions::default())
    }

    /// Full-control constructor behind the convenience variants.
    pub fn subscribe_with(
        conn: Arc<dyn Connection>,
        subject: impl Into<String>,
        queue: Option<String>,
        handler: Option<MsgHandler>,
        opts: SubOptions,
    ) -> Result<Arc<Self>> {
        let subject = subject.into();
        if subject.is_empty() {
            return Err(Error::InvalidArgument("subject must not be empty"));
        }
        if matches!(queue.as_deref(), Some("")) {
            return Err(Error::InvalidArgument("queue group must not be empty"));
        }

        let pending_max = opts.pending_max.max(1);
        let sub = Arc::new(Subscription {
            sid: SubId(NEXT_SID.fetch_add(1, Ordering::SeqCst)),
            subject,
            queue,
            conn,
            kind: if handler.is_some() {
                SubKind::Async
            } else {
                SubKind::Sync
            },
            mu: Mutex::new(SubInner {
                list: MsgList::new(),
                delivered: 0,
                max: 0,
                pending_max,
                signal_limit: pending_max * 3 / 4,
                no_delay: opts.no_delay,
                in_wait: 0,
                closed: false,
                conn_closed: false,
                slow_consumer: false,
                signal_interval: SLOW_SIGNAL_INTERVAL,
            }),
            cond: Condvar::new(),
            signal_timer: OnceLock::new(),
        });

        // A failure from here on tears down through close: the timer and
        // worker exit on the closed flag and drop their handles.
        if !opts.no_delay {
            match signal::spawn_signal_timer(&sub) {
                Ok(timer) => {
                    let _ = sub.signal_timer.set(timer);
                }
                Err(e) => {
                    sub.close(false);
                    return Err(e);
                }
            }
        }
        if let Some(handler) = handler {
            if let Err(e) = delivery::spawn_worker(&sub, handler) {
                sub.close(false);
                return Err(e);
            }
        }
        if let Err(e) = sub.conn.register(&sub) {
            sub.close(false);
            return Err(e);
        }

        debug!("subscription {} created on '{}'", sub.sid, sub.subject);
        Ok(sub)
    }

    /// Identifier assigned at creation.
    pub fn id(&self) -> SubId {
        self.sid
    }

    /// Subject this subscription expresses interest in.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Queue group, when part of one.
    pub fn queue_group(&self) -> Option<&str> {
        self.queue.as_deref()
    }

    /// Connection this subscription belongs to.
    pub fn connection(&self) -> &Arc<dyn Connection> {
        &self.conn
    }

    /// True when messages are delivered through a callback.
    pub fn is_async(&self) -> bool {
        self.kind == SubKind::Async
    }

    /// Messages handed to the consumer so far.
    pub fn delivered(&self) -> u64 {
        self.mu.lock().delivered
    }

    /// True when the pending bound was exceeded and messages were dropped
    /// since the flag was last consumed by [`next_msg`](Self::next_msg).
    pub fn is_slow_consumer(&self) -> bool {
        self.mu.lock().slow_consumer
    }

    /// Number of messages queued for delivery.
    pub fn queued_msgs(&self) -> Result<u64> {
        let inner = self.mu.lock();
        if inner.closed {
            return Err(Error::InvalidSubscription);
        }
        Ok(inner.list.len() as u64)
    }

    /// True while the subscription has not been closed or auto-unsubscribed.
    pub fn is_valid(&self) -> bool {
        !self.mu.lock().closed
    }

    /// Wake the delivery side on every enqueue from now on, trading
    /// batching for latency on request/reply paths. Idempotent.
    pub fn no_delivery_delay(&self) {
        let mut inner = self.mu.lock();
        if !inner.no_delay {
            inner.no_delay = true;
            if let Some(timer) = self.signal_timer.get() {
                timer.stop();
            }
        }
    }

    /// Remove interest in the subject. An in-flight callback keeps running
    /// until it returns.
    pub fn unsubscribe(&self) -> Result<()> {
        self.unsubscribe_with(0)
    }

    /// Ask the server to remove interest automatically once `max` messages
    /// have been delivered in total. Useful when requesting from an
    /// unknown number of responders.
    pub fn auto_unsubscribe(&self, max: u64) -> Result<()> {
        self.unsubscribe_with(max)
    }

    fn unsubscribe_with(&self, max: u64) -> Result<()> {
        {
            let mut inner = self.mu.lock();
            if inner.conn_closed {
                return Err(Error::ConnectionClosed);
            }
            if inner.closed {
                return Err(Error::InvalidSubscription);
            }
            if max > 0 {
                inner.max = max;
            }
        }

        self.conn.unsubscribe(self, max)?;
        if max == 0 {
            self.close(false);
        }
        Ok(())
    }

    /// Release the caller's handle, dropping interest first if the
    /// subscription is still active.
    pub fn destroy(self: Arc<Self>) {
        let open = !self.mu.lock().closed;
        if open {
            let _ = self.unsubscribe();
        }
    }

    /// Terminal transition: stops the signal timer, latches the closed
    /// flags, and wakes the delivery worker and any pull caller. No-op
    /// once closed. Invoked by the unsubscribe path, the delivery-limit
    /// path, and the connection on teardown (`conn_closed = true`).
    pub fn close(&self, conn_closed: bool) {
        let mut inner = self.mu.lock();
        if inner.closed {
            return;
        }
        if let Some(timer) = self.signal_timer.get() {
            timer.stop();
        }
        inner.closed = true;
        inner.conn_closed = conn_closed;
        self.cond.notify_all();
        debug!("subscription {} closed (conn_closed: {})", self.sid, conn_closed);
    }

    /// Append an inbound message. Called by the connection's reader thread
    /// for every message matching this subscription.
    ///
    /// Returns false when the message was discarded: the subscription is
    /// closed, or the pending bound was exceeded, which latches the
    /// slow-consumer flag.
    pub fn push(&self, msg: Message) -> bool {
        let mut inner = self.mu.lock();
        if inner.closed {
            return false;
        }
        if inner.list.len() >= inner.pending_max {
            inner.slow_consumer = true;
            warn!(
                "subscription {} on '{}' is a slow consumer, dropping message",
                self.sid, self.subject
            );
            return false;
        }

        let was_empty = inner.list.is_empty();
        inner.list.enqueue(msg);

        if inner.no_delay || was_empty {
            self.cond.notify_all();
        }
        if !inner.no_delay
            && (was_empty || inner.list.len() >= inner.signal_limit)
            && inner.signal_interval != FAST_SIGNAL_INTERVAL
        {
            inner.signal_interval = FAST_SIGNAL_INTERVAL;
            if let Some(timer) = self.signal_timer.get() {
                timer.reset(FAST_SIGNAL_INTERVAL);
            }
        }
        true
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("sid", &self.sid)
            .field("subject", &self.subject)
            .field("queue", &self.queue)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let undelivered = self.mu.get_mut().list.drain();
        if undelivered > 0 {
            debug!(
                "subscription {} dropped with {} undelivered messages",
                self.sid, undelivered
            );
        }
    }
}
