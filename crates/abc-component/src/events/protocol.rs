//! Internal channel payloads between the component's tasks.

use tokio::sync::oneshot;

use abc_types::{MessageId, MessagePredicate};

use crate::events::offer::{SendGrant, SendReceipt};

/// Registration of a sender waiting for its reserved id to become current.
///
/// The reply half is captured at registration time, so the grant can only ever
/// reach the sender that registered this particular wait.
#[derive(Debug)]
pub(crate) struct ClearanceRequest {
    pub(crate) mid: MessageId,
    pub(crate) reply: oneshot::Sender<()>,
}

/// A process announcing it wants to send; answered with a [`SendGrant`] once
/// clearance fires.
#[derive(Debug)]
pub(crate) struct SendRequest {
    pub(crate) reply: oneshot::Sender<SendGrant>,
}

/// The draft a granted process submitted, with the channel its receipt goes
/// back on.
#[derive(Debug)]
pub(crate) struct SendSubmission {
    pub(crate) draft: MessagePredicate,
    pub(crate) ack: oneshot::Sender<SendReceipt>,
}
