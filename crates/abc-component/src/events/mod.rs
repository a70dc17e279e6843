//! Event types flowing between the component's tasks and its processes.

pub mod offer;
pub(crate) mod protocol;
pub mod signals;
