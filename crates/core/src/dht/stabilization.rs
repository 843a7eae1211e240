//! Stabilization run daemons to maintain the ring.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use super::local::LocalVnode;
use crate::config::RingConfig;
use crate::error::Result;

/// The stabilization runner of one vnode.
#[derive(Clone)]
pub struct Stabilizer {
    vnode: Arc<LocalVnode>,
    config: Arc<RingConfig>,
}

impl Stabilizer {
    /// Create a new stabilization runner.
    pub fn new(vnode: Arc<LocalVnode>, config: Arc<RingConfig>) -> Self {
        Self { vnode, config }
    }

    /// The vnode maintained by this runner.
    pub fn vnode(&self) -> &Arc<LocalVnode> {
        &self.vnode
    }

    /// Run stabilization once.
    /// Each step is attempted even if an earlier one failed, except when the vnode is
    /// isolated: that error is returned at once.
    pub async fn stabilize(&self) -> Result<()> {
        tracing::debug!("STABILIZATION check_new_successor start");
        if let Err(e) = self.vnode.check_new_successor().await {
            if e.is_fatal() {
                tracing::error!("[stabilize] {:?} is isolated: {}", self.vnode.vnode(), e);
                return Err(e);
            }
            tracing::error!("[stabilize] Failed on check new successor {:?}", e);
        }
        tracing::debug!("STABILIZATION check_new_successor end");
        tracing::debug!("STABILIZATION notify_successor start");
        if let Err(e) = self.vnode.notify_successor().await {
            tracing::error!("[stabilize] Failed on notify successor {:?}", e);
        }
        tracing::debug!("STABILIZATION notify_successor end");
        tracing::debug!("STABILIZATION fix_finger_table start");
        if let Err(e) = self.vnode.fix_finger_table().await {
            tracing::error!("[stabilize] Failed on fix finger table {:?}", e);
        }
        tracing::debug!("STABILIZATION fix_finger_table end");
        tracing::debug!("STABILIZATION check_predecessor start");
        if let Err(e) = self.vnode.check_predecessor().await {
            tracing::error!("[stabilize] Failed on check predecessor {:?}", e);
        }
        tracing::debug!("STABILIZATION check_predecessor end");
        self.vnode.lock_state()?.stabilized_at = Some(Utc::now());
        Ok(())
    }

    /// Run stabilization on a jittered timer until `token` is cancelled.
    /// Passes are skipped until the vnode had a first successor.
    /// Returns the error that stopped the vnode: isolation, or a poisoned state lock.
    pub async fn wait(self: Arc<Self>, token: CancellationToken) -> Result<()> {
        loop {
            let delay = self.config.stabilize_delay();
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!("stabilizer of {:?} stopped", self.vnode.vnode());
                    return Ok(());
                }
                _ = tokio::time::sleep(delay) => {}
            }
            if !self.vnode.is_joined()? {
                tracing::trace!("{:?} not joined yet", self.vnode.vnode());
                continue;
            }
            if let Err(e) = self.stabilize().await {
                if e.is_fatal() {
                    return Err(e);
                }
                tracing::error!("failed to stabilize {:?}", e);
            }
        }
    }

    /// Ping every neighbor at `interval` until `token` is cancelled.
    pub async fn keepalive(self: Arc<Self>, interval: Duration, token: CancellationToken) {
        loop {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(interval) => {}
            }
            let neighbors = match self.vnode.neighbors() {
                Ok(neighbors) => neighbors,
                Err(e) => {
                    tracing::error!("keepalive cannot read neighbors {:?}", e);
                    continue;
                }
            };
            for n in neighbors {
                if !self.vnode.transport.ping(&n).await {
                    tracing::debug!("keepalive: {:?} did not answer", n);
                }
            }
        }
    }
}
