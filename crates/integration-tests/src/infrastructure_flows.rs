//! Multi-component flows over the in-memory infrastructure.
