//! Invariant checks over the ordering state.
//!
//! Pure predicates used by tests to pin the properties the Reader relies on.

use crate::domain::ordering::OrderingState;

/// Every id still pending (buffered inbound or own-send) is at or ahead of
/// the cursor. Ids behind the cursor have been consumed.
#[must_use]
pub fn no_pending_id_behind_cursor(state: &OrderingState) -> bool {
    state.inbox.keys().all(|id| *id >= state.nid())
        && state.sent.iter().all(|id| *id >= state.nid())
}

/// No id is simultaneously a buffered inbound message and an own send.
#[must_use]
pub fn ids_form_partition(state: &OrderingState) -> bool {
    state.sent.iter().all(|id| !state.inbox.contains_key(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use abc_types::{false_predicate, InboundMessage};

    #[test]
    fn test_fresh_state_satisfies_invariants() {
        let state = OrderingState::new(0);
        assert!(no_pending_id_behind_cursor(&state));
        assert!(ids_form_partition(&state));
    }

    #[test]
    fn test_invariants_hold_across_progress() {
        let mut state = OrderingState::new(0);
        state.mark_started();
        state.record_sent(0);
        state.record_inbound(InboundMessage::new(1, "m1", false_predicate()));

        assert!(state.take_own());
        assert!(no_pending_id_behind_cursor(&state));
        assert!(ids_form_partition(&state));

        assert!(state.take_inbound().is_some());
        state.advance();
        assert!(no_pending_id_behind_cursor(&state));
        assert!(ids_form_partition(&state));
    }
}
