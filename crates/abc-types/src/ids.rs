//! Identity types for messages and subscribed processes.

use std::fmt;

/// A message identifier, assigned globally by the infrastructure in strictly
/// increasing order. Every component observes a contiguous prefix of ids.
pub type MessageId = u64;

/// Unique identifier for a process subscribed to a component.
///
/// Identifiers are allocated per component and never reused; equality is the
/// only meaningful operation besides display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcessId(pub u64);

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_id_display() {
        assert_eq!(ProcessId(3).to_string(), "p3");
    }

    #[test]
    fn test_process_id_equality() {
        assert_eq!(ProcessId(1), ProcessId(1));
        assert_ne!(ProcessId(1), ProcessId(2));
    }
}
