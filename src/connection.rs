//! Contract between the subscription core and the connection that owns it.

use crate::error::Result;
use crate::subscription::Subscription;

/// Operations the subscription core requires from its connection.
///
/// The connection side also holds obligations that flow the other way:
///
/// - Its reader thread hands every inbound message to
///   [`Subscription::push`], which applies the pending-message bound and
///   wakes or schedules the delivery side.
/// - On connection teardown it must invoke [`Subscription::close`] with
///   `conn_closed = true` for every live subscription, so blocked pull
///   callers and delivery workers unwind with the right cause.
/// - The subscription table entry is a strong handle (`Arc<Subscription>`);
///   [`remove_subscription`](Connection::remove_subscription) drops it.
pub trait Connection: Send + Sync + 'static {
    /// Wire-level registration, invoked once while the subscription is
    /// being created. On failure the partially-built subscription is torn
    /// down and the error is surfaced to the caller.
    fn register(&self, sub: &Subscription) -> Result<()>;

    /// Wire-level unsubscribe.
    ///
    /// When `max == 0` interest is dropped outright and the implementation
    /// must remove its table entry for `sub`; with `max > 0` the server is
    /// asked to cancel after `max` total deliveries and the entry stays
    /// until the limit is hit. A call for a subscription that is no longer
    /// in the table must return `Ok` without any wire action, which is what
    /// makes concurrent unsubscribe/destroy races settle on a single
    /// wire-level unsubscribe.
    fn unsubscribe(&self, sub: &Subscription, max: u64) -> Result<()>;

    /// Drop the connection's table entry for `sub`. `drain` is true when
    /// the removal was triggered by the delivery limit, meaning in-flight
    /// messages were still delivered first.
    fn remove_subscription(&self, sub: &Subscription, drain: bool);
}
