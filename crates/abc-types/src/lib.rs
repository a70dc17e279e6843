//! # Shared Types Crate
//!
//! Domain types shared by every crate in the attribute-based communication
//! (AbC) workspace. In AbC, autonomous *components*, each pairing a private
//! attribute environment with a set of cooperating processes, communicate by
//! multicast over a shared *infrastructure*. A sender annotates each outgoing
//! message with a predicate over attributes; receivers independently decide
//! whether to accept.
//!
//! ## Clusters
//!
//! - **Identity**: [`MessageId`], [`ProcessId`]
//! - **Messages**: [`InboundMessage`], [`OutboundMessage`], [`MessagePredicate`]
//! - **Predicates**: the opaque [`Predicate`] trait and the distinguished
//!   [`False`] constant
//! - **Transport contract**: [`TransportLink`], [`MessageIdSource`]

pub mod ids;
pub mod messages;
pub mod predicate;
pub mod transport;

pub use ids::{MessageId, ProcessId};
pub use messages::{InboundMessage, MessagePredicate, OutboundMessage};
pub use predicate::{false_predicate, False, Predicate};
pub use transport::{MessageIdSource, TransportLink};
