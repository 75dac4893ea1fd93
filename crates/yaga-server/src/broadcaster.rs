//! Message routing: public fan-out and private delivery.
//!
//! Every accepted message is handed to the persistence log first, exactly once,
//! whatever happens during routing. Then:
//!
//! - Public text goes to every session in a registry snapshot, each write
//!   under that recipient's own lock. A failed write is logged and skipped; it
//!   never stops delivery to the remaining recipients.
//! - A private command goes to the single session named as target, carrying
//!   only `<sender>:<body>`. A command targeting the sending session (by its
//!   registered name or by the name it claims) is not delivered; the sender
//!   gets [`SELF_ADDRESSED_WARNING`] instead. Unknown-target and malformed
//!   commands are dropped silently.

use std::sync::Arc;

use yaga_proto::{Message, PrivateMessage};

use crate::{
    persistence::PersistenceLog,
    registry::{Registry, SessionId},
    session::SessionHandle,
};

/// Plain-text notice sent back to a session that addressed a private message
/// to itself.
pub const SELF_ADDRESSED_WARNING: &str = "You cannot send a private message to yourself.";

/// What happened to one dispatched message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Public message fanned out to a snapshot of the registry.
    Broadcast {
        /// Recipients whose write succeeded
        delivered: usize,
        /// Recipients whose write failed
        failed: usize,
    },
    /// Private message written to its target.
    Delivered {
        /// Session that received it
        target: SessionId,
    },
    /// Private message whose write to the target failed.
    DeliveryFailed {
        /// Session the write was attempted on
        target: SessionId,
    },
    /// Private message addressed to its own sender; only the warning is sent.
    SelfAddressed,
    /// No live session has the target name.
    TargetNotFound,
    /// Private marker without the four required fields.
    Malformed,
}

/// Routes accepted messages to sessions.
#[derive(Clone)]
pub struct Broadcaster {
    registry: Arc<Registry>,
    persistence: PersistenceLog,
}

impl Broadcaster {
    /// Create a broadcaster over `registry`, recording to `persistence`.
    pub fn new(registry: Arc<Registry>, persistence: PersistenceLog) -> Self {
        Self { registry, persistence }
    }

    /// Persist and route one message from `sender`.
    pub async fn dispatch(&self, text: &str, sender: &SessionHandle) -> Dispatch {
        self.persistence.record_message(text);

        match Message::parse(text) {
            Message::Public(text) => self.broadcast(&text).await,
            Message::Private(pm) => self.deliver_private(&pm, sender).await,
            Message::Malformed(_) => {
                tracing::debug!(session = %sender.id(), "Dropping malformed private message");
                Dispatch::Malformed
            },
        }
    }

    async fn broadcast(&self, text: &str) -> Dispatch {
        let recipients = self.registry.snapshot().await;

        let mut delivered = 0;
        let mut failed = 0;

        for recipient in recipients {
            match recipient.send(text).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    failed += 1;
                    tracing::warn!(
                        "Broadcast write failed for {} ({}): {}",
                        recipient.id(),
                        recipient.name(),
                        e
                    );
                },
            }
        }

        Dispatch::Broadcast { delivered, failed }
    }

    async fn deliver_private(&self, pm: &PrivateMessage, sender: &SessionHandle) -> Dispatch {
        if pm.is_self_addressed() || pm.target == sender.name() {
            tracing::warn!(
                session = %sender.id(),
                "Private message from {} addressed to itself, not delivered",
                sender.name()
            );
            if let Err(e) = sender.send(SELF_ADDRESSED_WARNING).await {
                tracing::warn!(
                    "Warning write failed for {} ({}): {}",
                    sender.id(),
                    sender.name(),
                    e
                );
            }
            return Dispatch::SelfAddressed;
        }

        let Some(target) = self.registry.find(&pm.target).await else {
            tracing::debug!(session = %sender.id(), "Private message target {} not online", pm.target);
            return Dispatch::TargetNotFound;
        };

        match target.send(&pm.delivery_payload()).await {
            Ok(()) => Dispatch::Delivered { target: target.id() },
            Err(e) => {
                tracing::warn!("Private write failed for {} ({}): {}", target.id(), target.name(), e);
                Dispatch::DeliveryFailed { target: target.id() }
            },
        }
    }
}
