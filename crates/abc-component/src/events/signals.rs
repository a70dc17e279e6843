//! The attribute-change broadcast.
//!
//! Every committed attribute update wakes all processes currently waiting for
//! one. The signal is edge-triggered with a generation counter underneath:
//! a handle captures the current generation, and a later wait completes as
//! soon as the generation has moved past the captured one. Capturing the
//! handle *before* inspecting the state it guards therefore never loses a
//! wake-up.

use tokio::sync::watch;

/// Broadcast side of the attribute-change signal, owned by the Coordinator.
#[derive(Debug)]
pub(crate) struct UpdateSignal {
    generation: watch::Sender<u64>,
}

impl UpdateSignal {
    pub(crate) fn new() -> Self {
        let (generation, _) = watch::channel(0);
        Self { generation }
    }

    /// Wake every handle captured before this call.
    pub(crate) fn fire(&self) {
        self.generation.send_modify(|generation| *generation += 1);
    }

    /// A handle positioned at the current generation.
    pub(crate) fn handle(&self) -> UpdateHandle {
        UpdateHandle::from_watch(self.generation.subscribe())
    }

    /// A raw receiver for embedding in component handles.
    pub(crate) fn watch(&self) -> watch::Receiver<u64> {
        self.generation.subscribe()
    }
}

/// A waiter's handle on the attribute-change broadcast.
#[derive(Debug, Clone)]
pub struct UpdateHandle {
    generation: watch::Receiver<u64>,
}

impl UpdateHandle {
    pub(crate) fn from_watch(mut generation: watch::Receiver<u64>) -> Self {
        generation.borrow_and_update();
        Self { generation }
    }

    /// Wait until attributes change relative to the captured generation.
    ///
    /// Returns `false` if the component stopped instead.
    pub async fn changed(&mut self) -> bool {
        self.generation.changed().await.is_ok()
    }

    /// Re-anchor the handle at the current generation.
    pub fn mark_seen(&mut self) {
        self.generation.borrow_and_update();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_millis(100);

    #[tokio::test]
    async fn test_fire_wakes_captured_handle() {
        let signal = UpdateSignal::new();
        let mut handle = signal.handle();

        signal.fire();

        let woke = timeout(WAIT, handle.changed()).await.expect("wake-up");
        assert!(woke);
    }

    #[tokio::test]
    async fn test_handle_captured_after_fire_sees_nothing() {
        let signal = UpdateSignal::new();
        signal.fire();
        let mut handle = signal.handle();

        assert!(timeout(WAIT, handle.changed()).await.is_err());
    }

    #[tokio::test]
    async fn test_capture_before_fire_never_loses_the_event() {
        let signal = UpdateSignal::new();
        let mut handle = signal.handle();

        // Fire lands between capture and wait; the wait still completes.
        signal.fire();
        tokio::task::yield_now().await;

        let woke = timeout(WAIT, handle.changed()).await.expect("wake-up");
        assert!(woke);
    }

    #[tokio::test]
    async fn test_wait_fails_once_signal_is_dropped() {
        let signal = UpdateSignal::new();
        let mut handle = signal.handle();
        drop(signal);

        assert!(!handle.changed().await);
    }
}
