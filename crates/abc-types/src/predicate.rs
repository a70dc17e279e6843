//! The opaque predicate contract.
//!
//! Predicates are boolean functions over attribute environments, evaluated by
//! the processes that receive a message, never by the coordination core. The
//! core inspects predicate identity for exactly one purpose: recognising the
//! distinguished [`False`] constant, which marks sentinel messages and is
//! skipped when logging sends.

use std::fmt;
use std::sync::Arc;

/// A predicate over attribute environments.
///
/// Evaluation semantics live with the behaviour language; the core only
/// carries predicates between components and recognises [`False`].
pub trait Predicate: fmt::Debug + Send + Sync {
    /// Whether this predicate is the distinguished constant that no
    /// environment satisfies.
    fn is_false(&self) -> bool {
        false
    }
}

/// The predicate satisfied by no attribute environment.
///
/// Sentinel outbound messages carry `False` so that a reserved message id is
/// consumed without any component accepting the message.
#[derive(Debug, Clone, Copy, Default)]
pub struct False;

impl Predicate for False {
    fn is_false(&self) -> bool {
        true
    }
}

/// Convenience constructor for a shared [`False`] predicate.
#[must_use]
pub fn false_predicate() -> Arc<dyn Predicate> {
    Arc::new(False)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Anyone;

    impl Predicate for Anyone {}

    #[test]
    fn test_false_is_false() {
        assert!(False.is_false());
        assert!(false_predicate().is_false());
    }

    #[test]
    fn test_custom_predicate_defaults_to_not_false() {
        assert!(!Anyone.is_false());
    }
}
