//! Global-order sequencing of submissions.
//!
//! Components submit outbound messages as soon as their clearance fires, so
//! submissions from different components can reach the infrastructure out of
//! global id order. The [`ReorderBuffer`] holds them until the id sequence is
//! contiguous again.

use std::collections::BTreeMap;

use abc_types::{MessageId, OutboundMessage};

/// An outbound message tagged with the component that submitted it.
#[derive(Debug)]
pub struct Submission {
    /// Identity of the submitting component; excluded from the delivery.
    pub sender: u64,
    /// The message, under its reserved id.
    pub message: OutboundMessage,
}

/// Buffer releasing submissions in contiguous id order.
#[derive(Debug)]
pub struct ReorderBuffer {
    next: MessageId,
    buffered: BTreeMap<MessageId, Submission>,
}

impl ReorderBuffer {
    /// A buffer whose first released id will be `first`.
    #[must_use]
    pub fn new(first: MessageId) -> Self {
        Self {
            next: first,
            buffered: BTreeMap::new(),
        }
    }

    /// The next id to be released, which is also the watermark a newly
    /// attached component starts observing from.
    #[must_use]
    pub fn next_id(&self) -> MessageId {
        self.next
    }

    /// Buffer a submission under its reserved id.
    pub fn insert(&mut self, submission: Submission) {
        debug_assert!(
            submission.message.id >= self.next,
            "submission under an already released id"
        );
        self.buffered.insert(submission.message.id, submission);
    }

    /// Release the next submission if the sequence is contiguous up to it.
    pub fn pop_ready(&mut self) -> Option<Submission> {
        let submission = self.buffered.remove(&self.next)?;
        self.next += 1;
        Some(submission)
    }

    /// Number of submissions waiting on a gap.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buffered.len()
    }
}
