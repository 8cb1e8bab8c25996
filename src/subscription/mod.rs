//! Per-subscription state, delivery, and lifecycle.

mod delivery;
mod pull;
mod signal;
mod sub;

pub use sub::{MsgHandler, SubId, SubOptions, Subscription, DEFAULT_PENDING_MAX};
