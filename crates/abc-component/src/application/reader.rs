//! The Reader task: the component's delivery-order engine.
//!
//! The Reader is the only owner of the [`OrderingState`]. It multiplexes four
//! event sources (transport arrivals, notifications that a local send was
//! handed to the transport, clearance-wait registrations, and the one-time
//! start signal), and whenever the cursor points at something processable it
//! either skips the component's own send or hands the inbound message to the
//! Coordinator and waits for its completion. Coupling inbound and outbound
//! bookkeeping in one task is what makes it impossible for a local send to
//! overtake a lower-id inbound message.

use tokio::sync::mpsc;
use tracing::{debug, info};

use abc_types::{InboundMessage, MessageId};

use crate::domain::ordering::OrderingState;
use crate::events::protocol::ClearanceRequest;

pub(crate) struct Reader {
    component_id: u64,
    state: OrderingState,
    /// The registered clearance waiter, if any. The reply half was captured
    /// when the wait was registered, so a grant can only reach that sender.
    waiting: Option<ClearanceRequest>,
    /// Messages from the transport, in increasing id order.
    inbound: mpsc::Receiver<InboundMessage>,
    /// Ids of locally originated messages handed to the transport; also the
    /// completion notice for a dispatched inbound message.
    evt_message_sent: mpsc::Receiver<MessageId>,
    /// Clearance-wait registrations from the send cycle.
    wait_for_mid: mpsc::Receiver<ClearanceRequest>,
    /// Fired exactly once, by the first subscription.
    component_starts: mpsc::Receiver<()>,
    /// Handoff of the current inbound message to the Coordinator.
    component_inbox: mpsc::Sender<InboundMessage>,
}

impl Reader {
    pub(crate) fn new(
        component_id: u64,
        first_message_id: MessageId,
        inbound: mpsc::Receiver<InboundMessage>,
        evt_message_sent: mpsc::Receiver<MessageId>,
        wait_for_mid: mpsc::Receiver<ClearanceRequest>,
        component_starts: mpsc::Receiver<()>,
        component_inbox: mpsc::Sender<InboundMessage>,
    ) -> Self {
        Self {
            component_id,
            state: OrderingState::new(first_message_id),
            waiting: None,
            inbound,
            evt_message_sent,
            wait_for_mid,
            component_starts,
            component_inbox,
        }
    }

    pub(crate) async fn run(mut self) {
        loop {
            while !self.state.actionable() {
                tokio::select! {
                    Some(message) = self.inbound.recv() => {
                        debug!(component = self.component_id, mid = message.id, "buffered inbound message");
                        self.state.record_inbound(message);
                    }
                    Some(mid) = self.evt_message_sent.recv() => {
                        self.state.record_sent(mid);
                    }
                    Some(request) = self.wait_for_mid.recv() => {
                        self.waiting = Some(request);
                        self.try_grant();
                    }
                    Some(()) = self.component_starts.recv(), if !self.state.is_started() => {
                        debug!(component = self.component_id, nid = self.state.nid(), "component started");
                        self.state.mark_started();
                        self.try_grant();
                    }
                    else => {
                        debug!(component = self.component_id, "event sources closed; reader stopping");
                        return;
                    }
                }
            }

            loop {
                if self.state.take_own() {
                    self.try_grant();
                    continue;
                }
                let Some(message) = self.state.take_inbound() else {
                    break;
                };
                if !self.offer(message).await || !self.await_processed().await {
                    return;
                }
                self.try_grant();
            }
        }
    }

    /// Hand the current message to the Coordinator while continuing to absorb
    /// every other event source.
    async fn offer(&mut self, message: InboundMessage) -> bool {
        loop {
            let mut should_grant = false;
            tokio::select! {
                permit = self.component_inbox.reserve() => {
                    match permit {
                        Ok(permit) => {
                            debug!(component = self.component_id, mid = message.id, "message handed to coordinator");
                            permit.send(message);
                            return true;
                        }
                        Err(_) => return false,
                    }
                }
                Some(other) = self.inbound.recv() => self.state.record_inbound(other),
                Some(mid) = self.evt_message_sent.recv() => self.state.record_sent(mid),
                Some(request) = self.wait_for_mid.recv() => {
                    self.waiting = Some(request);
                    should_grant = true;
                }
            }
            if should_grant {
                self.try_grant();
            }
        }
    }

    /// Wait until the Coordinator reports the current id fully processed,
    /// then move past it.
    async fn await_processed(&mut self) -> bool {
        loop {
            tokio::select! {
                Some(mid) = self.evt_message_sent.recv() => {
                    if self.state.is_current(mid) {
                        self.state.advance();
                        return true;
                    }
                    self.state.record_sent(mid);
                }
                Some(other) = self.inbound.recv() => self.state.record_inbound(other),
                Some(request) = self.wait_for_mid.recv() => {
                    self.waiting = Some(request);
                    self.try_grant();
                }
                else => return false,
            }
        }
    }

    /// Release the registered waiter if its reserved id is now current.
    fn try_grant(&mut self) {
        if !self.state.is_started() {
            return;
        }
        let Some(request) = self.waiting.take() else {
            return;
        };
        if request.mid == self.state.nid() {
            info!(component = self.component_id, mid = request.mid, "clear to send");
            let _ = request.reply.send(());
        } else {
            self.waiting = Some(request);
        }
    }
}
