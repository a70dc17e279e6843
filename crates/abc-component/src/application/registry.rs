//! The subscription registry.

use tokio::sync::mpsc;

use abc_types::ProcessId;

use crate::events::offer::MessageOffer;

/// A subscribed process, reachable through its offer channel.
#[derive(Debug)]
pub(crate) struct ProcessLink {
    pub(crate) id: ProcessId,
    pub(crate) offers: mpsc::Sender<MessageOffer>,
}

/// Insertion-ordered set of subscribed processes.
///
/// Insertion order is the dispatch order; no other fairness is promised.
#[derive(Debug, Default)]
pub(crate) struct SubscriptionRegistry {
    links: Vec<ProcessLink>,
}

impl SubscriptionRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Add a process; returns `false` (and keeps the existing link) if the id
    /// is already subscribed.
    pub(crate) fn subscribe(&mut self, link: ProcessLink) -> bool {
        if self.links.iter().any(|existing| existing.id == link.id) {
            return false;
        }
        self.links.push(link);
        true
    }

    /// Remove a process; unknown ids are a no-op.
    pub(crate) fn unsubscribe(&mut self, id: ProcessId) -> bool {
        let before = self.links.len();
        self.links.retain(|link| link.id != id);
        self.links.len() != before
    }

    /// The current recipients, in subscription order.
    pub(crate) fn snapshot(&self) -> Vec<ProcessId> {
        self.links.iter().map(|link| link.id).collect()
    }

    /// The offer channel of a still-subscribed process.
    pub(crate) fn offers(&self, id: ProcessId) -> Option<mpsc::Sender<MessageOffer>> {
        self.links
            .iter()
            .find(|link| link.id == id)
            .map(|link| link.offers.clone())
    }
}
