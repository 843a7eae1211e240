//! In-process transport for local rings and testing.
use std::sync::Arc;
use std::sync::Weak;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::DashSet;

use super::Transport;
use super::VnodeRpc;
use crate::dht::RingId;
use crate::dht::Vnode;
use crate::error::Error;
use crate::error::Result;

/// A transport that dispatches calls directly to vnodes registered in the same process.
/// Registered handlers are held weakly, a dropped vnode behaves as a dead peer.
///
/// Peers can be cut off with [MemoryTransport::set_unreachable], and the predecessor a
/// vnode reports can be forced with [MemoryTransport::override_predecessor].
#[derive(Default)]
pub struct MemoryTransport {
    handlers: DashMap<RingId, Weak<dyn VnodeRpc>>,
    unreachable: DashSet<RingId>,
    predecessors: DashMap<RingId, Option<Vnode>>,
}

impl MemoryTransport {
    /// Create an empty transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call to `id` fail, or restore it.
    pub fn set_unreachable(&self, id: &RingId, unreachable: bool) {
        if unreachable {
            self.unreachable.insert(id.clone());
        } else {
            self.unreachable.remove(id);
        }
    }

    /// Answer `get_predecessor` on `id` with `predecessor` instead of asking the vnode.
    pub fn override_predecessor(&self, id: &RingId, predecessor: Option<Vnode>) {
        self.predecessors.insert(id.clone(), predecessor);
    }

    /// Drop a predecessor set by [MemoryTransport::override_predecessor].
    pub fn clear_override(&self, id: &RingId) {
        self.predecessors.remove(id);
    }

    /// Number of registered vnodes, dead ones included.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    fn handler(&self, vnode: &Vnode) -> Result<Arc<dyn VnodeRpc>> {
        if self.unreachable.contains(&vnode.id) {
            return Err(Error::PeerUnreachable(vnode.to_string()));
        }
        self.handlers
            .get(&vnode.id)
            .and_then(|h| h.upgrade())
            .ok_or_else(|| Error::PeerUnreachable(vnode.to_string()))
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn ping(&self, vnode: &Vnode) -> bool {
        self.handler(vnode).is_ok()
    }

    async fn get_predecessor(&self, vnode: &Vnode) -> Result<Option<Vnode>> {
        let handler = self.handler(vnode)?;
        let forced = self.predecessors.get(&vnode.id).map(|p| p.value().clone());
        match forced {
            Some(predecessor) => Ok(predecessor),
            None => handler.get_predecessor().await,
        }
    }

    async fn notify(&self, target: &Vnode, local: &Vnode) -> Result<Vec<Vnode>> {
        self.handler(target)?.notify(local.clone()).await
    }

    async fn find_successors(&self, vnode: &Vnode, n: usize, key: &RingId) -> Result<Vec<Vnode>> {
        self.handler(vnode)?.find_successors(n, key.clone()).await
    }

    async fn clear_predecessor(&self, target: &Vnode, leaving: &Vnode) -> Result<()> {
        self.handler(target)?
            .clear_predecessor(leaving.clone())
            .await
    }

    async fn skip_successor(&self, target: &Vnode, leaving: &Vnode) -> Result<()> {
        self.handler(target)?.skip_successor(leaving.clone()).await
    }

    fn register(&self, vnode: &Vnode, handler: Arc<dyn VnodeRpc>) {
        tracing::debug!("register vnode {:?}", vnode);
        self.handlers
            .insert(vnode.id.clone(), Arc::downgrade(&handler));
    }

    fn deregister(&self, vnode: &Vnode) {
        tracing::debug!("deregister vnode {:?}", vnode);
        self.handlers.remove(&vnode.id);
    }
}
