//! # Integration Tests Crate
//!
//! End-to-end tests for the AbC component runtime, driving real components
//! over real channels.
//!
//! ## Structure
//!
//! ```text
//! integration-tests/
//! ├── src/
//! │   ├── lib.rs                  # This file: shared harness helpers
//! │   ├── component_flows.rs      # Single-component scenarios over a
//! │   │                           # hand-built transport link
//! │   └── infrastructure_flows.rs # Multi-component flows over the
//! │                               # in-memory infrastructure
//! ```
//!
//! Single-component scenarios pin the coordination protocol: bootstrap
//! buffering, immediate clearance, accept/commit, interleaved own sends,
//! unsubscribe-during-offer, and withdrawn sends. Infrastructure flows pin
//! the cross-component guarantees: gap-free delivery, sentinel consumption of
//! reserved ids, and the contiguous global order every observer sees.

pub mod component_flows;
pub mod infrastructure_flows;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use abc_component::Subscription;
use abc_types::{
    InboundMessage, MessageId, MessageIdSource, OutboundMessage, Predicate, TransportLink,
};

/// Install a fmt subscriber for test logs; repeated calls are harmless.
pub fn init_tracing() {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// A predicate every process is willing to look at.
#[derive(Debug, Clone, Copy)]
pub struct Anyone;

impl Predicate for Anyone {}

/// Strictly increasing id reservation starting from a chosen value.
#[derive(Debug)]
pub struct CountingIds {
    next: AtomicU64,
}

impl CountingIds {
    #[must_use]
    pub fn starting_at(next: MessageId) -> Arc<Self> {
        Arc::new(Self {
            next: AtomicU64::new(next),
        })
    }
}

#[async_trait]
impl MessageIdSource for CountingIds {
    async fn reserve(&self) -> MessageId {
        self.next.fetch_add(1, Ordering::SeqCst)
    }
}

/// The test's side of a hand-built transport.
pub struct TestTransport {
    /// Feed inbound messages to the component.
    pub inbound: mpsc::Sender<InboundMessage>,
    /// Observe what the component transmits.
    pub outbound: mpsc::Receiver<OutboundMessage>,
}

/// A transport link wired straight to the test, with ids reserved from
/// `next_reserved`.
#[must_use]
pub fn test_link(
    first_message_id: MessageId,
    next_reserved: MessageId,
) -> (TransportLink, TestTransport) {
    let (inbound_tx, inbound_rx) = mpsc::channel(64);
    let (outbound_tx, outbound_rx) = mpsc::channel(16);
    (
        TransportLink {
            component_id: 0,
            first_message_id,
            inbound: inbound_rx,
            outbound: outbound_tx,
            ids: CountingIds::starting_at(next_reserved),
        },
        TestTransport {
            inbound: inbound_tx,
            outbound: outbound_rx,
        },
    )
}

#[must_use]
pub fn make_inbound(id: MessageId, payload: impl Into<String>) -> InboundMessage {
    InboundMessage::new(id, payload, Arc::new(Anyone))
}

/// A process that rejects every offer, reporting what it saw.
pub fn spawn_rejector(mut subscription: Subscription) -> mpsc::UnboundedReceiver<(MessageId, String)> {
    let (seen_tx, seen_rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(offer) = subscription.next_offer().await {
            let _ = seen_tx.send((offer.message.id, offer.message.payload.clone()));
            offer.reject();
        }
    });
    seen_rx
}

/// A process that accepts everything except sentinels, reporting what it
/// accepted.
pub fn spawn_acceptor(mut subscription: Subscription) -> mpsc::UnboundedReceiver<(MessageId, String)> {
    let (accepted_tx, accepted_rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(offer) = subscription.next_offer().await {
            if offer.message.predicate.is_false() {
                offer.reject();
                continue;
            }
            let _ = accepted_tx.send((offer.message.id, offer.message.payload.clone()));
            offer.accept();
        }
    });
    accepted_rx
}
