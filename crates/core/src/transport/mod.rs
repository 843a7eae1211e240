//! Seam between a vnode and its remote peers.
//!
//! A [Transport] is the client side used by the maintenance and lookup code, a
//! [VnodeRpc] is the server side a local vnode exposes to its peers. How bytes travel
//! is up to the implementation. Any failure is reported as an error and treated by
//! callers as the peer being unreachable.
#![warn(missing_docs)]
use std::sync::Arc;

use async_trait::async_trait;

use crate::dht::RingId;
use crate::dht::Vnode;
use crate::error::Result;

mod memory;

pub use memory::MemoryTransport;

/// Handlers a vnode serves to remote peers.
#[async_trait]
pub trait VnodeRpc: Send + Sync {
    /// Current predecessor of the vnode.
    async fn get_predecessor(&self) -> Result<Option<Vnode>>;

    /// `candidate` believes it is our predecessor. Returns our successor list.
    async fn notify(&self, candidate: Vnode) -> Result<Vec<Vnode>>;

    /// Up to `n` vnodes responsible for `key`, in ring order.
    async fn find_successors(&self, n: usize, key: RingId) -> Result<Vec<Vnode>>;

    /// `leaving` is leaving the ring, forget it if it is our predecessor.
    async fn clear_predecessor(&self, leaving: Vnode) -> Result<()>;

    /// `leaving` is leaving the ring, skip it if it is our first successor.
    async fn skip_successor(&self, leaving: Vnode) -> Result<()>;
}

/// Client side of the vnode protocol.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Liveness probe, false when the peer cannot be reached.
    async fn ping(&self, vnode: &Vnode) -> bool;

    /// Ask `vnode` for its predecessor.
    async fn get_predecessor(&self, vnode: &Vnode) -> Result<Option<Vnode>>;

    /// Tell `target` that `local` may be its predecessor.
    async fn notify(&self, target: &Vnode, local: &Vnode) -> Result<Vec<Vnode>>;

    /// Ask `vnode` for up to `n` successors of `key`.
    async fn find_successors(&self, vnode: &Vnode, n: usize, key: &RingId) -> Result<Vec<Vnode>>;

    /// Tell `target` to forget `leaving` as its predecessor.
    async fn clear_predecessor(&self, target: &Vnode, leaving: &Vnode) -> Result<()>;

    /// Tell `target` to skip `leaving` in its successor list.
    async fn skip_successor(&self, target: &Vnode, leaving: &Vnode) -> Result<()>;

    /// Serve calls addressed to `vnode` with `handler`.
    fn register(&self, vnode: &Vnode, handler: Arc<dyn VnodeRpc>);

    /// Stop serving calls addressed to `vnode`.
    fn deregister(&self, vnode: &Vnode);
}
