//! # AbC Component Core
//!
//! The per-component coordinator of an attribute-based communication (AbC)
//! system. A [`Component`] pairs a private attribute environment with a set of
//! subscribed processes and aligns everything the component observes, inbound
//! messages and its own sends alike, with the infrastructure's global
//! message-id sequence.
//!
//! ## Architecture
//!
//! - **Domain**: the transactional [`AttributeStore`] and the pure
//!   [`OrderingState`](domain::ordering::OrderingState) bookkeeping
//! - **Ports**: the process-facing [`ComponentApi`] and the transport contract
//!   re-exported from `abc-types`
//! - **Events**: [`MessageOffer`]s presented to processes and the
//!   attribute-change broadcast ([`UpdateHandle`])
//! - **Application**: the two long-lived tasks (a Reader owning delivery
//!   order and a Coordinator owning subscriptions, dispatch and sends) wired
//!   together by [`Component::connect`]
//!
//! The two tasks communicate only through typed channels; the attribute store
//! is the single shared structure, mutated exclusively from the Coordinator
//! and loaned to one process at a time under the clearance-to-send protocol.

pub mod application;
pub mod config;
pub mod domain;
pub mod events;
pub mod ports;

pub use application::component::{Component, ComponentHandle, Subscription};
pub use config::ComponentConfig;
pub use domain::attributes::{AttributeStore, AttributeView};
pub use domain::errors::ComponentError;
pub use events::offer::{MessageOffer, SendGrant, SendReceipt};
pub use events::signals::UpdateHandle;
pub use ports::inbound::ComponentApi;
pub use abc_types::{
    false_predicate, False, InboundMessage, MessageId, MessageIdSource, MessagePredicate,
    OutboundMessage, Predicate, ProcessId, TransportLink,
};
