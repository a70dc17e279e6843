//! Component construction and the handles processes hold.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::info;

use abc_types::{ProcessId, TransportLink};

use crate::application::coordinator::Coordinator;
use crate::application::reader::Reader;
use crate::application::registry::{ProcessLink, SubscriptionRegistry};
use crate::config::ComponentConfig;
use crate::domain::attributes::AttributeStore;
use crate::domain::errors::ComponentError;
use crate::events::offer::{MessageOffer, SendGrant};
use crate::events::protocol::SendRequest;
use crate::events::signals::{UpdateHandle, UpdateSignal};
use crate::ports::inbound::ComponentApi;

/// A running AbC component: a private attribute environment plus the two
/// coordination tasks aligning it with the infrastructure's global message
/// order.
///
/// The component runs until dropped; dropping aborts both tasks and leaves
/// any outstanding handles [`Disconnected`](ComponentError::Disconnected).
pub struct Component {
    handle: ComponentHandle,
    reader_task: JoinHandle<()>,
    coordinator_task: JoinHandle<()>,
}

impl Component {
    /// Attach a component with an empty attribute environment.
    #[must_use]
    pub fn connect(link: TransportLink) -> Self {
        Self::connect_with_config(link, HashMap::new(), ComponentConfig::default())
    }

    /// Attach a component with an initial attribute environment.
    #[must_use]
    pub fn connect_with_attributes(
        link: TransportLink,
        attributes: HashMap<String, String>,
    ) -> Self {
        Self::connect_with_config(link, attributes, ComponentConfig::default())
    }

    /// Attach a component with explicit configuration.
    #[must_use]
    pub fn connect_with_config(
        link: TransportLink,
        attributes: HashMap<String, String>,
        config: ComponentConfig,
    ) -> Self {
        let TransportLink {
            component_id,
            first_message_id,
            inbound,
            outbound,
            ids,
        } = link;

        let (subscribe_tx, subscribe_rx) = mpsc::channel(config.control_capacity);
        let (unsubscribe_tx, unsubscribe_rx) = mpsc::channel(config.control_capacity);
        let (wants_to_send_tx, wants_to_send_rx) = mpsc::channel(1);
        let (evt_message_sent_tx, evt_message_sent_rx) = mpsc::channel(1);
        let (wait_for_mid_tx, wait_for_mid_rx) = mpsc::channel(1);
        let (component_starts_tx, component_starts_rx) = mpsc::channel(1);
        let (component_inbox_tx, component_inbox_rx) = mpsc::channel(1);

        let attributes = Arc::new(RwLock::new(AttributeStore::from_map(attributes)));
        let update = UpdateSignal::new();
        let update_rx = update.watch();

        let reader = Reader::new(
            component_id,
            first_message_id,
            inbound,
            evt_message_sent_rx,
            wait_for_mid_rx,
            component_starts_rx,
            component_inbox_tx,
        );
        let coordinator = Coordinator {
            component_id,
            attributes,
            registry: SubscriptionRegistry::new(),
            update,
            subscribe_rx,
            unsubscribe_rx,
            component_inbox: component_inbox_rx,
            wants_to_send_rx,
            evt_message_sent: evt_message_sent_tx,
            wait_for_mid: wait_for_mid_tx,
            component_starts: Some(component_starts_tx),
            outbox: outbound,
            ids,
        };

        info!(component = component_id, first_message_id, "component attached");

        Self {
            handle: ComponentHandle {
                component_id,
                subscribe_tx,
                unsubscribe_tx,
                wants_to_send_tx,
                update_rx,
                next_process_id: Arc::new(AtomicU64::new(0)),
                offer_capacity: config.offer_capacity,
            },
            reader_task: tokio::spawn(reader.run()),
            coordinator_task: tokio::spawn(coordinator.run()),
        }
    }

    /// A cloneable handle for processes.
    #[must_use]
    pub fn handle(&self) -> ComponentHandle {
        self.handle.clone()
    }

    /// The identity the infrastructure assigned at attach time.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.handle.component_id
    }
}

impl Drop for Component {
    fn drop(&mut self) {
        self.reader_task.abort();
        self.coordinator_task.abort();
    }
}

/// A process's entry point into its component.
#[derive(Debug, Clone)]
pub struct ComponentHandle {
    component_id: u64,
    subscribe_tx: mpsc::Sender<ProcessLink>,
    unsubscribe_tx: mpsc::Sender<ProcessId>,
    wants_to_send_tx: mpsc::Sender<SendRequest>,
    update_rx: watch::Receiver<u64>,
    next_process_id: Arc<AtomicU64>,
    offer_capacity: usize,
}

impl ComponentHandle {
    #[must_use]
    pub fn component_id(&self) -> u64 {
        self.component_id
    }

    /// Subscribe a new process and return its subscription.
    pub async fn subscribe(&self) -> Result<Subscription, ComponentError> {
        let id = ProcessId(self.next_process_id.fetch_add(1, Ordering::Relaxed));
        let (offers_tx, offers_rx) = mpsc::channel(self.offer_capacity);
        self.subscribe_tx
            .send(ProcessLink {
                id,
                offers: offers_tx,
            })
            .await
            .map_err(|_| ComponentError::Disconnected)?;
        Ok(Subscription {
            id,
            offers: offers_rx,
            handle: self.clone(),
        })
    }

    /// Remove a subscription; unknown ids are a no-op.
    pub async fn unsubscribe(&self, process: ProcessId) -> Result<(), ComponentError> {
        self.unsubscribe_tx
            .send(process)
            .await
            .map_err(|_| ComponentError::Disconnected)
    }

    /// Ask for send authorisation; resolves once clearance fires.
    pub async fn request_send(&self) -> Result<SendGrant, ComponentError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.wants_to_send_tx
            .send(SendRequest { reply: reply_tx })
            .await
            .map_err(|_| ComponentError::Disconnected)?;
        reply_rx.await.map_err(|_| ComponentError::Disconnected)
    }

    /// A handle on the attribute-change broadcast, anchored at the current
    /// state. Capture it before inspecting whatever you are waiting to see
    /// change.
    #[must_use]
    pub fn update_handle(&self) -> UpdateHandle {
        UpdateHandle::from_watch(self.update_rx.clone())
    }
}

#[async_trait]
impl ComponentApi for ComponentHandle {
    async fn subscribe(&self) -> Result<Subscription, ComponentError> {
        ComponentHandle::subscribe(self).await
    }

    async fn unsubscribe(&self, process: ProcessId) -> Result<(), ComponentError> {
        ComponentHandle::unsubscribe(self, process).await
    }

    async fn request_send(&self) -> Result<SendGrant, ComponentError> {
        ComponentHandle::request_send(self).await
    }
}

/// A live subscription: the stream of message offers for one process.
///
/// Dropping the subscription without unsubscribing is safe (any in-flight
/// offer resolves as rejected), but the registry entry lingers until
/// [`unsubscribe`](Self::unsubscribe) is called.
#[derive(Debug)]
pub struct Subscription {
    id: ProcessId,
    offers: mpsc::Receiver<MessageOffer>,
    handle: ComponentHandle,
}

impl Subscription {
    #[must_use]
    pub fn id(&self) -> ProcessId {
        self.id
    }

    /// The next message offered to this process, `None` once the component
    /// stopped.
    pub async fn next_offer(&mut self) -> Option<MessageOffer> {
        self.offers.recv().await
    }

    /// Withdraw this subscription.
    pub async fn unsubscribe(self) -> Result<(), ComponentError> {
        self.handle.unsubscribe(self.id).await
    }
}
