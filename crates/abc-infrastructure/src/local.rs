//! The in-process infrastructure implementation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

use abc_types::{InboundMessage, MessageId, MessageIdSource, OutboundMessage, TransportLink};

use crate::sequencer::{ReorderBuffer, Submission};
use crate::{DEFAULT_INBOX_CAPACITY, DEFAULT_OUTBOX_CAPACITY};

/// Errors from infrastructure operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InfrastructureError {
    /// The infrastructure was shut down.
    #[error("infrastructure closed")]
    Closed,
}

/// An in-memory AbC infrastructure.
///
/// A single sequencer task owns the member table and the reorder buffer;
/// attaching and submitting are command messages to it, so member bookkeeping
/// never races delivery. Dropping the infrastructure stops the sequencer and
/// isolates all attached components.
pub struct LocalInfrastructure {
    commands: mpsc::Sender<Command>,
    stats: Arc<Stats>,
    sequencer_task: JoinHandle<()>,
}

enum Command {
    Attach {
        reply: oneshot::Sender<TransportLink>,
    },
    Submit {
        sender: u64,
        message: OutboundMessage,
    },
}

#[derive(Debug, Default)]
struct Stats {
    sequenced: AtomicU64,
    members: AtomicU64,
}

impl LocalInfrastructure {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_INBOX_CAPACITY)
    }

    /// An infrastructure whose members get inbound queues of `inbox_capacity`.
    #[must_use]
    pub fn with_capacity(inbox_capacity: usize) -> Self {
        let (commands_tx, commands_rx) = mpsc::channel(DEFAULT_OUTBOX_CAPACITY);
        let stats = Arc::new(Stats::default());

        let sequencer = Sequencer {
            commands_rx,
            commands_tx: commands_tx.clone(),
            members: Vec::new(),
            next_component_id: 0,
            buffer: ReorderBuffer::new(0),
            ids: Arc::new(AtomicU64::new(0)),
            inbox_capacity,
            stats: stats.clone(),
        };

        Self {
            commands: commands_tx,
            stats,
            sequencer_task: tokio::spawn(sequencer.run()),
        }
    }

    /// Attach a new component, returning its transport link.
    ///
    /// The link's `first_message_id` is the current delivery watermark: the
    /// member observes the contiguous id sequence from there on.
    pub async fn attach(&self) -> Result<TransportLink, InfrastructureError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(Command::Attach { reply: reply_tx })
            .await
            .map_err(|_| InfrastructureError::Closed)?;
        reply_rx.await.map_err(|_| InfrastructureError::Closed)
    }

    /// Total messages released into the global order so far.
    #[must_use]
    pub fn messages_sequenced(&self) -> u64 {
        self.stats.sequenced.load(Ordering::Relaxed)
    }

    /// Number of currently attached components.
    #[must_use]
    pub fn member_count(&self) -> u64 {
        self.stats.members.load(Ordering::Relaxed)
    }
}

impl Default for LocalInfrastructure {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for LocalInfrastructure {
    fn drop(&mut self) {
        self.sequencer_task.abort();
    }
}

/// Shared reservation counter handed to every member.
struct SharedIds {
    counter: Arc<AtomicU64>,
}

#[async_trait]
impl MessageIdSource for SharedIds {
    async fn reserve(&self) -> MessageId {
        self.counter.fetch_add(1, Ordering::SeqCst)
    }
}

struct Member {
    component_id: u64,
    inbound: mpsc::Sender<InboundMessage>,
}

struct Sequencer {
    commands_rx: mpsc::Receiver<Command>,
    /// Cloned into per-member relays forwarding their outbox into the command
    /// stream.
    commands_tx: mpsc::Sender<Command>,
    members: Vec<Member>,
    next_component_id: u64,
    buffer: ReorderBuffer,
    ids: Arc<AtomicU64>,
    inbox_capacity: usize,
    stats: Arc<Stats>,
}

impl Sequencer {
    async fn run(mut self) {
        while let Some(command) = self.commands_rx.recv().await {
            match command {
                Command::Attach { reply } => self.attach(reply),
                Command::Submit { sender, message } => self.submit(sender, message).await,
            }
        }
    }

    fn attach(&mut self, reply: oneshot::Sender<TransportLink>) {
        let component_id = self.next_component_id;
        self.next_component_id += 1;

        let (inbound_tx, inbound_rx) = mpsc::channel(self.inbox_capacity);
        let (outbound_tx, mut outbound_rx) = mpsc::channel(DEFAULT_OUTBOX_CAPACITY);

        let commands = self.commands_tx.clone();
        tokio::spawn(async move {
            while let Some(message) = outbound_rx.recv().await {
                if commands
                    .send(Command::Submit {
                        sender: component_id,
                        message,
                    })
                    .await
                    .is_err()
                {
                    return;
                }
            }
        });

        let link = TransportLink {
            component_id,
            first_message_id: self.buffer.next_id(),
            inbound: inbound_rx,
            outbound: outbound_tx,
            ids: Arc::new(SharedIds {
                counter: self.ids.clone(),
            }),
        };

        self.members.push(Member {
            component_id,
            inbound: inbound_tx,
        });
        self.stats.members.fetch_add(1, Ordering::Relaxed);
        debug!(component = component_id, "component attached");

        let _ = reply.send(link);
    }

    async fn submit(&mut self, sender: u64, message: OutboundMessage) {
        debug!(sender, mid = message.id, "submission received");
        self.buffer.insert(Submission { sender, message });

        while let Some(Submission { sender, message }) = self.buffer.pop_ready() {
            self.deliver(sender, message).await;
            self.stats.sequenced.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Multicast one released message to every member but its sender.
    async fn deliver(&mut self, sender: u64, message: OutboundMessage) {
        let inbound = InboundMessage::new(message.id, message.payload, message.predicate);

        let mut detached = Vec::new();
        for member in &self.members {
            if member.component_id == sender {
                continue;
            }
            if member.inbound.send(inbound.clone()).await.is_err() {
                detached.push(member.component_id);
            }
        }

        if !detached.is_empty() {
            self.members
                .retain(|member| !detached.contains(&member.component_id));
            self.stats
                .members
                .fetch_sub(detached.len() as u64, Ordering::Relaxed);
            debug!(members = ?detached, "members detached");
        }
    }
}
