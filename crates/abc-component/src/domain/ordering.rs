//! Delivery-order bookkeeping.
//!
//! [`OrderingState`] tracks the next message id the component must process
//! (`nid`) and the two pools of ids known but not yet reached: messages
//! received from the infrastructure (`inbox`) and the component's own sends
//! whose acceptance has been notified (`sent`). Interleaving both pools under
//! a single cursor is what keeps a locally initiated send from racing ahead of
//! a lower-id inbound message.

use std::collections::{HashMap, HashSet};

use abc_types::{InboundMessage, MessageId};

/// Reader-local ordering state.
///
/// Pure bookkeeping: all channel handling lives in the Reader task, which
/// drives this state machine and is the only code that observes it.
#[derive(Debug)]
pub struct OrderingState {
    /// Next message id to process.
    nid: MessageId,
    /// Received messages with ids still ahead of `nid`.
    pub(crate) inbox: HashMap<MessageId, InboundMessage>,
    /// Locally originated ids whose acceptance was notified but not yet
    /// reached by `nid`.
    pub(crate) sent: HashSet<MessageId>,
    /// Flipped by the first process subscription; nothing is dispatched
    /// before.
    started: bool,
}

impl OrderingState {
    /// Fresh state positioned at the first id the transport will deliver.
    #[must_use]
    pub fn new(first_message_id: MessageId) -> Self {
        Self {
            nid: first_message_id,
            inbox: HashMap::new(),
            sent: HashSet::new(),
            started: false,
        }
    }

    /// The next id to process.
    #[must_use]
    pub fn nid(&self) -> MessageId {
        self.nid
    }

    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn mark_started(&mut self) {
        self.started = true;
    }

    /// Buffer a message delivered by the transport.
    pub fn record_inbound(&mut self, message: InboundMessage) {
        debug_assert!(message.id >= self.nid, "transport delivered a stale id");
        self.inbox.insert(message.id, message);
    }

    /// Record that a locally originated message with `mid` was handed to the
    /// transport.
    pub fn record_sent(&mut self, mid: MessageId) {
        debug_assert!(mid >= self.nid, "acceptance notified for a consumed id");
        self.sent.insert(mid);
    }

    /// Whether the current `nid` can make progress right now.
    #[must_use]
    pub fn actionable(&self) -> bool {
        self.started && (self.sent.contains(&self.nid) || self.inbox.contains_key(&self.nid))
    }

    /// Consume `nid` as one of our own sends, advancing past it.
    ///
    /// Returns whether `nid` was in the sent pool.
    pub fn take_own(&mut self) -> bool {
        if self.sent.remove(&self.nid) {
            self.nid += 1;
            true
        } else {
            false
        }
    }

    /// Detach the inbound message at `nid` for dispatch.
    ///
    /// The cursor does not advance: the id stays current until the dispatch
    /// completes and [`advance`](Self::advance) is called.
    pub fn take_inbound(&mut self) -> Option<InboundMessage> {
        self.inbox.remove(&self.nid)
    }

    /// Whether `mid` is the id currently being processed.
    #[must_use]
    pub fn is_current(&self, mid: MessageId) -> bool {
        mid == self.nid
    }

    /// Move past the current id once its processing completed.
    pub fn advance(&mut self) {
        self.nid += 1;
    }
}
