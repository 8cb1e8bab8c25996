//! # Pub/Sub Client Core
//!
//! The subscription side of a client for a publish/subscribe messaging
//! service: per-subscription queues for inbound messages, asynchronous
//! delivery through user callbacks, and synchronous blocking pulls.
//!
//! ## Core Concepts
//!
//! - **Subscriptions**: interest in a subject, async (callback) or sync (pull)
//! - **Delivery worker**: one thread per async subscription, draining in FIFO order
//! - **Signal coalescing**: a periodic timer wakes the delivery side under load
//!   instead of broadcasting per message
//! - **Lifecycle**: shared-ownership handles that stay valid across in-flight
//!   callbacks, delivery limits, and connection loss
//!
//! ## Example
//!
//! ```ignore
//! use pubsub_client::{Message, Subscription};
//! use std::time::Duration;
//!
//! let sub = Subscription::subscribe(conn.clone(), "orders.created", |_sub, msg| {
//!     println!("received {} bytes on {}", msg.payload.len(), msg.subject);
//! })?;
//!
//! // Synchronous variant, polled with a deadline:
//! let poll = Subscription::subscribe_sync(conn, "orders.archived")?;
//! let msg = poll.next_msg(Duration::from_millis(500))?;
//!
//! sub.unsubscribe()?;
//! ```

pub mod connection;
pub mod error;
pub mod message;
pub mod subscription;
pub mod timer;

// Re-exports
pub use connection::Connection;
pub use error::{Error, Result};
pub use message::{Message, MsgList};
pub use subscription::{MsgHandler, SubId, SubOptions, Subscription, DEFAULT_PENDING_MAX};
pub use timer::Timer;
