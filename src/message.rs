//! Messages and the per-subscription pending queue.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A single inbound message.
///
/// Ownership moves from the connection's reader into a subscription's
/// pending queue, and from there to the consumer (async callback or
/// [`next_msg`](crate::Subscription::next_msg) caller). Messages are never
/// shared.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Subject the message was published on.
    pub subject: String,
    /// Reply subject for request/reply exchanges.
    pub reply: Option<String>,
    /// Raw payload bytes.
    pub payload: Vec<u8>,
}

impl Message {
    /// Create a message with a raw payload.
    pub fn new(subject: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            subject: subject.into(),
            reply: None,
            payload: payload.into(),
        }
    }

    /// Create a message with a JSON-encoded payload.
    pub fn json<T: Serialize>(subject: impl Into<String>, value: &T) -> Result<Self> {
        Ok(Self {
            subject: subject.into(),
            reply: None,
            payload: serde_json::to_vec(value)?,
        })
    }

    /// Set the reply subject.
    pub fn with_reply(mut self, reply: impl Into<String>) -> Self {
        self.reply = Some(reply.into());
        self
    }
}

/// FIFO of messages pending delivery, owned by exactly one subscription.
///
/// Callers mutate the list only while holding the owning subscription's
/// lock; the list itself enforces no capacity, bounds are applied by the
/// enqueuing side.
#[derive(Debug, Default)]
pub struct MsgList {
    msgs: VecDeque<Message>,
}

impl MsgList {
    pub fn new() -> Self {
        Self {
            msgs: VecDeque::new(),
        }
    }

    /// Append a message at the tail. O(1).
    pub fn enqueue(&mut self, msg: Message) {
        self.msgs.push_back(msg);
    }

    /// Remove and return the message at the head. O(1).
    pub fn dequeue(&mut self) -> Option<Message> {
        self.msgs.pop_front()
    }

    /// Drop every pending message, returning how many were discarded.
    pub fn drain(&mut self) -> usize {
        let count = self.msgs.len();
        self.msgs.clear();
        count
    }

    /// Number of pending messages.
    pub fn len(&self) -> usize {
        self.msgs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.msgs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enqueue_dequeue_fifo() {
        let mut list = MsgList::new();
        assert!(list.is_empty());
        assert_eq!(list.len(), 0);

        for i in 0..5 {
            list.enqueue(Message::new("updates", format!("msg-{}", i)));
        }
        assert_eq!(list.len(), 5);

        for i in 0..5 {
            let msg = list.dequeue().unwrap();
            assert_eq!(msg.payload, format!("msg-{}", i).into_bytes());
        }
        assert!(list.dequeue().is_none());
        assert!(list.is_empty());
    }

    #[test]
    fn test_drain() {
        let mut list = MsgList::new();
        list.enqueue(Message::new("a", "1"));
        list.enqueue(Message::new("a", "2"));

        assert_eq!(list.drain(), 2);
        assert!(list.is_empty());
        assert_eq!(list.drain(), 0);
    }

    #[test]
    fn test_json_payload() {
        let msg = Message::json("events", &serde_json::json!({"kind": "ping"})).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&msg.payload).unwrap();
        assert_eq!(value["kind"], "ping");
    }

    #[test]
    fn test_reply_subject() {
        let msg = Message::new("req", "hi").with_reply("inbox.42");
        assert_eq!(msg.reply.as_deref(), Some("inbox.42"));
    }
}
