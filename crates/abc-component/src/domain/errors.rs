//! Error types for the component core.
//!
//! Routine protocol outcomes such as rejection, or an unsubscribe racing an
//! offer, are not errors. The only failure a caller can observe is the
//! component itself being gone.

use thiserror::Error;

/// Errors surfaced by component handles.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ComponentError {
    /// The component's tasks have stopped; the handle is stale.
    #[error("component is no longer running")]
    Disconnected,
}
