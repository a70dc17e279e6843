//! The Coordinator task: subscriptions, serial dispatch, and the send cycle.
//!
//! The Coordinator owns the attribute store and everything process-facing. It
//! processes at most one inbound message (a dispatch cycle) or one send (a
//! send cycle) at a time; subscribe and unsubscribe requests are serviced in
//! every state.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use abc_types::{InboundMessage, MessageId, MessageIdSource, OutboundMessage, ProcessId};

use crate::application::registry::{ProcessLink, SubscriptionRegistry};
use crate::domain::attributes::{AttributeStore, AttributeView};
use crate::events::offer::{MessageOffer, SendGrant, SendReceipt};
use crate::events::protocol::{ClearanceRequest, SendRequest, SendSubmission};
use crate::events::signals::UpdateSignal;

pub(crate) struct Coordinator {
    pub(crate) component_id: u64,
    pub(crate) attributes: Arc<RwLock<AttributeStore>>,
    pub(crate) registry: SubscriptionRegistry,
    pub(crate) update: UpdateSignal,
    pub(crate) subscribe_rx: mpsc::Receiver<ProcessLink>,
    pub(crate) unsubscribe_rx: mpsc::Receiver<ProcessId>,
    pub(crate) component_inbox: mpsc::Receiver<InboundMessage>,
    pub(crate) wants_to_send_rx: mpsc::Receiver<SendRequest>,
    pub(crate) evt_message_sent: mpsc::Sender<MessageId>,
    pub(crate) wait_for_mid: mpsc::Sender<ClearanceRequest>,
    /// Taken and fired by the first subscription ever.
    pub(crate) component_starts: Option<mpsc::Sender<()>>,
    pub(crate) outbox: mpsc::Sender<OutboundMessage>,
    pub(crate) ids: Arc<dyn MessageIdSource>,
}

impl Coordinator {
    pub(crate) async fn run(mut self) {
        loop {
            tokio::select! {
                Some(link) = self.subscribe_rx.recv() => self.on_subscribe(link),
                Some(process) = self.unsubscribe_rx.recv() => {
                    if self.registry.unsubscribe(process) {
                        debug!(component = self.component_id, %process, "process unsubscribed");
                    }
                }
                Some(message) = self.component_inbox.recv() => self.dispatch(message).await,
                Some(request) = self.wants_to_send_rx.recv() => self.send_cycle(request).await,
                else => {
                    debug!(component = self.component_id, "handles dropped; coordinator stopping");
                    return;
                }
            }
        }
    }

    fn on_subscribe(&mut self, link: ProcessLink) {
        let process = link.id;
        if !self.registry.subscribe(link) {
            return;
        }
        debug!(component = self.component_id, %process, "process subscribed");
        if let Some(starts) = self.component_starts.take() {
            // Capacity 1 and fired exactly once; try_send cannot fail here.
            let _ = starts.try_send(());
        }
    }

    /// Offer `message` to each subscribed process in turn until one accepts.
    ///
    /// The recipient list is snapshotted up front: processes subscribing while
    /// the message is in flight arrived too late and are not offered it.
    async fn dispatch(&mut self, message: InboundMessage) {
        let recipients = self.registry.snapshot();
        debug!(
            component = self.component_id,
            mid = message.id,
            recipients = recipients.len(),
            "dispatching message"
        );

        for recipient in recipients {
            let Some(offers) = self.registry.offers(recipient) else {
                // Unsubscribed since the snapshot.
                continue;
            };

            let (offer, verdict_rx) =
                MessageOffer::new(AttributeView::new(self.attributes.clone()), message.clone());
            let (cancel_tx, cancel_rx) = oneshot::channel();
            let (outcome_tx, mut outcome_rx) = oneshot::channel();
            tokio::spawn(offer_recipient(
                offers, offer, verdict_rx, cancel_rx, outcome_tx,
            ));

            let mut cancel_tx = Some(cancel_tx);
            let accepted = loop {
                tokio::select! {
                    Some(link) = self.subscribe_rx.recv() => self.on_subscribe(link),
                    Some(process) = self.unsubscribe_rx.recv() => {
                        self.registry.unsubscribe(process);
                        if process == recipient {
                            if let Some(cancel) = cancel_tx.take() {
                                let _ = cancel.send(());
                            }
                        }
                    }
                    outcome = &mut outcome_rx => break outcome.unwrap_or(false),
                }
            };

            if accepted {
                let changed = self.attributes.write().commit();
                self.notify_message_sent(message.id).await;
                info!(
                    component = self.component_id,
                    mid = message.id,
                    %recipient,
                    payload = %message.payload,
                    "message accepted"
                );
                debug!(
                    component = self.component_id,
                    attributes = ?*self.attributes.read(),
                    "attribute environment"
                );
                if changed {
                    self.update.fire();
                }
                return;
            }
            self.attributes.write().rollback();
        }

        // Nobody accepted; the id is consumed regardless.
        self.notify_message_sent(message.id).await;
    }

    /// Serve one process's send: reserve an id, wait for clearance while still
    /// coordinating, loan out the attribute store, and consume the reserved id
    /// with whatever comes back.
    async fn send_cycle(&mut self, request: SendRequest) {
        let mid = self.ids.reserve().await;
        let (clearance_tx, mut clearance_rx) = oneshot::channel();
        if self
            .wait_for_mid
            .send(ClearanceRequest {
                mid,
                reply: clearance_tx,
            })
            .await
            .is_err()
        {
            warn!(component = self.component_id, mid, "ordering engine gone; dropping send");
            return;
        }

        loop {
            tokio::select! {
                Some(link) = self.subscribe_rx.recv() => self.on_subscribe(link),
                Some(process) = self.unsubscribe_rx.recv() => {
                    self.registry.unsubscribe(process);
                }
                Some(message) = self.component_inbox.recv() => self.dispatch(message).await,
                granted = &mut clearance_rx => {
                    if granted.is_err() {
                        warn!(component = self.component_id, mid, "ordering engine gone; dropping send");
                        return;
                    }
                    break;
                }
            }
        }

        // Clearance fired: loan the store to the requesting process.
        let (submit_tx, mut submit_rx) = oneshot::channel();
        let grant = SendGrant::new(AttributeView::new(self.attributes.clone()), submit_tx);
        if request.reply.send(grant).is_err() {
            // The requester vanished after reserving; the id must still be
            // consumed so every component's cursor can move past it.
            self.consume_reserved(mid).await;
            return;
        }

        let submission = loop {
            tokio::select! {
                Some(link) = self.subscribe_rx.recv() => self.on_subscribe(link),
                Some(process) = self.unsubscribe_rx.recv() => {
                    self.registry.unsubscribe(process);
                }
                submitted = &mut submit_rx => break submitted,
            }
        };

        match submission {
            Ok(SendSubmission { draft, ack }) if !draft.invalid => {
                self.transmit(OutboundMessage::new(mid, draft.payload, draft.predicate))
                    .await;
                let changed = self.attributes.write().commit();
                if changed {
                    self.update.fire();
                }
                let _ = ack.send(SendReceipt {
                    id: mid,
                    update: None,
                });
            }
            Ok(SendSubmission { ack, .. }) => {
                self.transmit(OutboundMessage::sentinel(mid)).await;
                self.attributes.write().rollback();
                // The handle is captured after the rollback, so the process
                // wakes on the next committed change.
                let _ = ack.send(SendReceipt {
                    id: mid,
                    update: Some(self.update.handle()),
                });
            }
            Err(_) => self.consume_reserved(mid).await,
        }
    }

    /// Consume a reserved id on behalf of a requester that disappeared.
    async fn consume_reserved(&mut self, mid: MessageId) {
        debug!(component = self.component_id, mid, "send abandoned; consuming reserved id");
        self.transmit(OutboundMessage::sentinel(mid)).await;
        self.attributes.write().rollback();
    }

    /// Forward an outbound message, notifying the ordering engine first so the
    /// id is marked as our own before anything else can reference it.
    async fn transmit(&mut self, message: OutboundMessage) {
        self.notify_message_sent(message.id).await;
        if !message.is_sentinel() {
            info!(
                component = self.component_id,
                mid = message.id,
                payload = %message.payload,
                "sending message"
            );
        }
        if self.outbox.send(message).await.is_err() {
            warn!(component = self.component_id, "transport outbox closed; outbound dropped");
        }
    }

    async fn notify_message_sent(&mut self, mid: MessageId) {
        if self.evt_message_sent.send(mid).await.is_err() {
            warn!(component = self.component_id, mid, "ordering engine gone; completion lost");
        }
    }
}

/// Short-lived task that offers a message to one recipient, racing the
/// per-recipient cancellation at both steps. Unsubscription, like a recipient
/// that went away, resolves as rejection.
async fn offer_recipient(
    offers: mpsc::Sender<MessageOffer>,
    offer: MessageOffer,
    verdict_rx: oneshot::Receiver<bool>,
    mut cancel: oneshot::Receiver<()>,
    outcome: oneshot::Sender<bool>,
) {
    tokio::select! {
        delivered = offers.send(offer) => {
            if delivered.is_err() {
                let _ = outcome.send(false);
                return;
            }
        }
        _ = &mut cancel => {
            let _ = outcome.send(false);
            return;
        }
    }

    let verdict = tokio::select! {
        verdict = verdict_rx => verdict.unwrap_or(false),
        _ = &mut cancel => false,
    };
    let _ = outcome.send(verdict);
}
