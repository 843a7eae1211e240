//! Membership notifications for applications built on the ring.
//!
//! Vnodes never call a [Delegate] directly. Events are pushed to a [DelegateQueue] and
//! a single worker task invokes the delegate in order, so a slow delegate cannot stall
//! ring maintenance.
#![warn(missing_docs)]
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::dht::Vnode;

/// Callbacks invoked when the neighbourhood of a local vnode changes.
/// Every method has an empty default.
pub trait Delegate: Send + Sync {
    /// `local` adopted `new` as predecessor, replacing `old`.
    fn new_predecessor(&self, _local: &Vnode, _new: &Vnode, _old: Option<&Vnode>) {}

    /// `local` is leaving the ring.
    fn leaving(&self, _local: &Vnode, _pred: Option<&Vnode>, _succ: Option<&Vnode>) {}

    /// The predecessor `old` of `local` announced it is leaving.
    fn predecessor_leaving(&self, _local: &Vnode, _old: &Vnode) {}

    /// The first successor `old` of `local` announced it is leaving.
    fn successor_leaving(&self, _local: &Vnode, _old: &Vnode) {}

    /// The ring is shutting down.
    fn shutdown(&self) {}
}

/// A delegate ignoring every event.
pub struct NoopDelegate;

impl Delegate for NoopDelegate {}

/// A delegate logging every event.
pub struct LoggingDelegate;

impl Delegate for LoggingDelegate {
    fn new_predecessor(&self, local: &Vnode, new: &Vnode, old: Option<&Vnode>) {
        tracing::info!("{:?} new predecessor {:?}, was {:?}", local, new, old);
    }

    fn leaving(&self, local: &Vnode, pred: Option<&Vnode>, succ: Option<&Vnode>) {
        tracing::info!(
            "{:?} leaving, predecessor {:?}, successor {:?}",
            local,
            pred,
            succ
        );
    }

    fn predecessor_leaving(&self, local: &Vnode, old: &Vnode) {
        tracing::info!("{:?} predecessor {:?} leaving", local, old);
    }

    fn successor_leaving(&self, local: &Vnode, old: &Vnode) {
        tracing::info!("{:?} successor {:?} leaving", local, old);
    }

    fn shutdown(&self) {
        tracing::info!("ring shutdown");
    }
}

/// One pending delegate invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DelegateEvent {
    /// See [Delegate::new_predecessor].
    NewPredecessor {
        /// vnode whose predecessor changed
        local: Vnode,
        /// adopted predecessor
        new: Vnode,
        /// replaced predecessor
        old: Option<Vnode>,
    },
    /// See [Delegate::leaving].
    Leaving {
        /// leaving vnode
        local: Vnode,
        /// its predecessor
        pred: Option<Vnode>,
        /// its first successor
        succ: Option<Vnode>,
    },
    /// See [Delegate::predecessor_leaving].
    PredecessorLeaving {
        /// notified vnode
        local: Vnode,
        /// leaving predecessor
        old: Vnode,
    },
    /// See [Delegate::successor_leaving].
    SuccessorLeaving {
        /// notified vnode
        local: Vnode,
        /// leaving successor
        old: Vnode,
    },
    /// See [Delegate::shutdown].
    Shutdown,
}

impl DelegateEvent {
    fn dispatch(&self, delegate: &dyn Delegate) {
        match self {
            DelegateEvent::NewPredecessor { local, new, old } => {
                delegate.new_predecessor(local, new, old.as_ref())
            }
            DelegateEvent::Leaving { local, pred, succ } => {
                delegate.leaving(local, pred.as_ref(), succ.as_ref())
            }
            DelegateEvent::PredecessorLeaving { local, old } => {
                delegate.predecessor_leaving(local, old)
            }
            DelegateEvent::SuccessorLeaving { local, old } => delegate.successor_leaving(local, old),
            DelegateEvent::Shutdown => delegate.shutdown(),
        }
    }
}

/// Sending half of the delegate queue, cheap to clone and shared by all vnodes of a ring.
#[derive(Clone)]
pub struct DelegateQueue {
    sender: mpsc::UnboundedSender<DelegateEvent>,
}

/// Receiving half of the delegate queue. Drive it with [DelegateWorker::run].
pub struct DelegateWorker {
    delegate: Arc<dyn Delegate>,
    receiver: mpsc::UnboundedReceiver<DelegateEvent>,
}

impl DelegateQueue {
    /// Create a queue feeding `delegate`.
    pub fn new(delegate: Arc<dyn Delegate>) -> (Self, DelegateWorker) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, DelegateWorker { delegate, receiver })
    }

    /// Enqueue an event, never blocks.
    pub fn push(&self, event: DelegateEvent) {
        if let Err(e) = self.sender.send(event) {
            tracing::debug!("delegate worker is gone, dropped {:?}", e.0);
        }
    }
}

impl DelegateWorker {
    /// Invoke the delegate for every queued event until all queues are dropped.
    pub async fn run(mut self) {
        while let Some(event) = self.receiver.recv().await {
            tracing::trace!("dispatch delegate event {:?}", event);
            event.dispatch(self.delegate.as_ref());
        }
        tracing::debug!("delegate worker stopped");
    }
}
