//! Ports at the component's boundaries.
//!
//! The inbound port is what processes drive; the outbound (transport) contract
//! is shared across the workspace and lives in `abc-types`.

pub mod inbound;

pub use abc_types::transport::{MessageIdSource, TransportLink};
