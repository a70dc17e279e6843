//! What a component hands to its processes: message offers during dispatch
//! and send grants after clearance.

use tokio::sync::oneshot;

use abc_types::{InboundMessage, MessageId, MessagePredicate};

use crate::domain::attributes::AttributeView;
use crate::domain::errors::ComponentError;
use crate::events::protocol::SendSubmission;
use crate::events::signals::UpdateHandle;

/// An inbound message presented to one subscribed process at a time.
///
/// The process inspects the message, evaluates its companion predicates
/// against the loaned attribute view (tentative writes included), and answers
/// with [`accept`](Self::accept) or [`reject`](Self::reject). Dropping the
/// offer without answering counts as a rejection.
#[derive(Debug)]
pub struct MessageOffer {
    /// The component's attribute environment, loaned for the decision.
    pub attributes: AttributeView,
    /// The message on offer.
    pub message: InboundMessage,
    verdict: oneshot::Sender<bool>,
}

impl MessageOffer {
    pub(crate) fn new(
        attributes: AttributeView,
        message: InboundMessage,
    ) -> (Self, oneshot::Receiver<bool>) {
        let (verdict_tx, verdict_rx) = oneshot::channel();
        (
            Self {
                attributes,
                message,
                verdict: verdict_tx,
            },
            verdict_rx,
        )
    }

    /// Accept the message; tentative attribute writes will be committed.
    pub fn accept(self) {
        let _ = self.verdict.send(true);
    }

    /// Reject the message; tentative attribute writes will be rolled back and
    /// the message moves on to the next subscriber.
    pub fn reject(self) {
        let _ = self.verdict.send(false);
    }
}

/// Authorisation to transmit under a reserved message id.
///
/// A grant is delivered once every lower id has been processed; the attribute
/// environment is on loan to the holder until it submits. Exactly one
/// submission consumes the grant; a withdrawn
/// ([invalid](MessagePredicate::invalid)) submission still consumes the
/// reserved id with a sentinel so the global sequence stays gap-free.
#[derive(Debug)]
pub struct SendGrant {
    attributes: AttributeView,
    submit: oneshot::Sender<SendSubmission>,
}

impl SendGrant {
    pub(crate) fn new(attributes: AttributeView, submit: oneshot::Sender<SendSubmission>) -> Self {
        Self { attributes, submit }
    }

    /// The loaned attribute environment to compose the message against.
    #[must_use]
    pub fn attributes(&self) -> &AttributeView {
        &self.attributes
    }

    /// Submit the composed message (or its withdrawal) and wait for the
    /// component to consume the reserved id.
    pub async fn submit(self, draft: MessagePredicate) -> Result<SendReceipt, ComponentError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.submit
            .send(SendSubmission {
                draft,
                ack: ack_tx,
            })
            .map_err(|_| ComponentError::Disconnected)?;
        ack_rx.await.map_err(|_| ComponentError::Disconnected)
    }

    /// Withdraw the send. Tentative attribute writes are rolled back and the
    /// receipt carries a fresh update handle to await attribute changes on
    /// before retrying.
    pub async fn abort(self) -> Result<SendReceipt, ComponentError> {
        self.submit(MessagePredicate::invalid()).await
    }
}

/// Outcome of a consumed send grant.
#[derive(Debug)]
pub struct SendReceipt {
    /// The id the submission (real or sentinel) was transmitted under.
    pub id: MessageId,
    /// For withdrawn sends: a handle on the attribute-change broadcast,
    /// captured after the rollback.
    pub update: Option<UpdateHandle>,
}
