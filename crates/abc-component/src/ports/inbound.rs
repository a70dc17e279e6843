//! Inbound port: the API processes drive.

use async_trait::async_trait;

use abc_types::ProcessId;

use crate::application::component::Subscription;
use crate::domain::errors::ComponentError;
use crate::events::offer::SendGrant;

/// Process-facing operations of a component.
///
/// Behaviour implementations stay generic over this trait; the concrete
/// [`ComponentHandle`](crate::ComponentHandle) implements it.
#[async_trait]
pub trait ComponentApi: Send + Sync {
    /// Subscribe a new process. The first subscription ever starts the
    /// component's dispatch engine.
    async fn subscribe(&self) -> Result<Subscription, ComponentError>;

    /// Remove a subscription. Unknown ids are a no-op; if the process is
    /// currently being offered a message, the offer resolves as rejected.
    async fn unsubscribe(&self, process: ProcessId) -> Result<(), ComponentError>;

    /// Request authorisation to send. Resolves once every message id below
    /// the reserved one has been processed; the returned grant holds the
    /// attribute environment on loan.
    async fn request_send(&self) -> Result<SendGrant, ComponentError>;
}
