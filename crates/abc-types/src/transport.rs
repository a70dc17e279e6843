//! The contract between a component and its infrastructure transport.
//!
//! The transport is an external collaborator: it delivers inbound messages in
//! strictly increasing id order and accepts outbound messages under ids
//! reserved through [`MessageIdSource`]. Everything a component needs from it
//! is bundled in a [`TransportLink`] handed over at construction.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::ids::MessageId;
use crate::messages::{InboundMessage, OutboundMessage};

/// Reservation of globally unique, strictly increasing message ids.
#[async_trait]
pub trait MessageIdSource: Send + Sync {
    /// Reserve the next fresh message id.
    ///
    /// Every reserved id must eventually be submitted, as a real outbound or
    /// as a sentinel, so the global sequence stays gap-free.
    async fn reserve(&self) -> MessageId;
}

/// A component's attachment to the infrastructure.
pub struct TransportLink {
    /// Identity assigned by the infrastructure, used in log lines.
    pub component_id: u64,
    /// First message id this component will observe.
    pub first_message_id: MessageId,
    /// Messages from the infrastructure, in strictly increasing id order.
    pub inbound: mpsc::Receiver<InboundMessage>,
    /// Outbound messages to the infrastructure.
    pub outbound: mpsc::Sender<OutboundMessage>,
    /// Id reservation shared with every other attached component.
    pub ids: Arc<dyn MessageIdSource>,
}
