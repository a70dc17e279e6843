//! Message shapes exchanged with the infrastructure and within a component.

use std::sync::Arc;

use crate::ids::MessageId;
use crate::predicate::{false_predicate, Predicate};

/// A message delivered by the infrastructure.
///
/// Inbound messages arrive in strictly increasing id order with no gaps or
/// duplicates, starting from the first id learned when the component attached.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Globally assigned message id.
    pub id: MessageId,
    /// Opaque payload, composed and interpreted by processes.
    pub payload: String,
    /// Predicate the sender attached; receivers evaluate it themselves.
    pub predicate: Arc<dyn Predicate>,
}

impl InboundMessage {
    #[must_use]
    pub fn new(id: MessageId, payload: impl Into<String>, predicate: Arc<dyn Predicate>) -> Self {
        Self {
            id,
            payload: payload.into(),
            predicate,
        }
    }
}

/// A message submitted to the infrastructure under a reserved id.
///
/// Ids are submitted in strictly increasing order with no gaps: a reserved id
/// a process decides not to use is consumed by a [sentinel](Self::sentinel)
/// instead.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    /// The id reserved for this message.
    pub id: MessageId,
    /// Opaque payload.
    pub payload: String,
    /// Predicate addressed to the receiving components' processes.
    pub predicate: Arc<dyn Predicate>,
}

impl OutboundMessage {
    #[must_use]
    pub fn new(id: MessageId, payload: impl Into<String>, predicate: Arc<dyn Predicate>) -> Self {
        Self {
            id,
            payload: payload.into(),
            predicate,
        }
    }

    /// The placeholder transmitted to consume a reserved id nobody will use:
    /// empty payload under the `False` predicate.
    #[must_use]
    pub fn sentinel(id: MessageId) -> Self {
        Self {
            id,
            payload: String::new(),
            predicate: false_predicate(),
        }
    }

    /// Whether this message is a placeholder no process can accept.
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        self.predicate.is_false()
    }
}

/// A process's send submission: the payload/predicate pair it composed, or a
/// withdrawal of the send.
///
/// An `invalid` submission keeps the id sequence gap-free: the component
/// transmits a sentinel under the reserved id and rolls back any tentative
/// attribute changes the process made while composing.
#[derive(Debug, Clone)]
pub struct MessagePredicate {
    /// Payload to transmit; empty for invalid submissions.
    pub payload: String,
    /// Addressing predicate; `False` for invalid submissions.
    pub predicate: Arc<dyn Predicate>,
    /// Whether the process withdrew the send.
    pub invalid: bool,
}

impl MessagePredicate {
    /// A real submission.
    #[must_use]
    pub fn send(payload: impl Into<String>, predicate: Arc<dyn Predicate>) -> Self {
        Self {
            payload: payload.into(),
            predicate,
            invalid: false,
        }
    }

    /// A withdrawn submission; the reserved id is consumed by a sentinel.
    #[must_use]
    pub fn invalid() -> Self {
        Self {
            payload: String::new(),
            predicate: false_predicate(),
            invalid: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_shape() {
        let sentinel = OutboundMessage::sentinel(7);
        assert_eq!(sentinel.id, 7);
        assert!(sentinel.payload.is_empty());
        assert!(sentinel.is_sentinel());
    }

    #[test]
    fn test_real_outbound_is_not_sentinel() {
        #[derive(Debug)]
        struct Anyone;
        impl Predicate for Anyone {}

        let message = OutboundMessage::new(0, "hello", Arc::new(Anyone));
        assert!(!message.is_sentinel());
    }

    #[test]
    fn test_invalid_submission_shape() {
        let draft = MessagePredicate::invalid();
        assert!(draft.invalid);
        assert!(draft.payload.is_empty());
        assert!(draft.predicate.is_false());
    }
}
