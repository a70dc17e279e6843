//! # In-Memory AbC Infrastructure
//!
//! A loopback infrastructure for single-process systems and tests. Components
//! attach and receive a transport link; every outbound message any of them
//! submits is sequenced into the global id order and multicast to every
//! *other* attached component (a sender consumes its own id locally through
//! its ordering engine).
//!
//! ## Guarantees
//!
//! - Message ids are reserved from one strictly increasing counter shared by
//!   all members.
//! - Deliveries reach each member in contiguous, strictly increasing id
//!   order: a submission whose predecessors are still outstanding is buffered
//!   until the gap closes.
//! - A member attached while traffic is flowing starts at the current
//!   delivery watermark and observes the contiguous suffix from there.

pub mod local;
pub mod sequencer;

pub use local::{InfrastructureError, LocalInfrastructure};
pub use sequencer::{ReorderBuffer, Submission};

/// Default inbound queue depth per attached component.
///
/// Components drain their inbox eagerly; the buffer only covers bursts.
pub const DEFAULT_INBOX_CAPACITY: usize = 64;

/// Default outbound queue depth per attached component.
pub const DEFAULT_OUTBOX_CAPACITY: usize = 16;
