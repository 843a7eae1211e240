use std::sync::Arc;
use std::sync::Mutex;

use crate::config::RingConfig;
use crate::delegate::Delegate;
use crate::delegate::DelegateQueue;
use crate::dht::LocalVnode;
use crate::dht::RingId;
use crate::dht::Vnode;
use crate::transport::MemoryTransport;
use crate::transport::Transport;
use crate::transport::VnodeRpc;

mod test_lookup;
mod test_membership;
mod test_ring;

/// Records delegate events as short strings.
#[derive(Default)]
pub struct RecordingDelegate {
    pub events: Mutex<Vec<String>>,
}

impl RecordingDelegate {
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }

    fn record(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl Delegate for RecordingDelegate {
    fn new_predecessor(&self, local: &Vnode, new: &Vnode, old: Option<&Vnode>) {
        let old = old.map(|o| o.to_string()).unwrap_or_default();
        self.record(format!("{} new_predecessor {} old {}", local, new, old));
    }

    fn leaving(&self, local: &Vnode, _pred: Option<&Vnode>, _succ: Option<&Vnode>) {
        self.record(format!("{} leaving", local));
    }

    fn predecessor_leaving(&self, local: &Vnode, old: &Vnode) {
        self.record(format!("{} predecessor_leaving {}", local, old));
    }

    fn successor_leaving(&self, local: &Vnode, old: &Vnode) {
        self.record(format!("{} successor_leaving {}", local, old));
    }
}

/// Vnodes of an 8 bits ring wired over one [MemoryTransport].
pub struct TestRing {
    pub transport: Arc<MemoryTransport>,
    pub delegate: Arc<RecordingDelegate>,
    pub config: RingConfig,
    queue: DelegateQueue,
}

impl TestRing {
    pub fn new(num_successors: usize) -> Self {
        let delegate = Arc::new(RecordingDelegate::default());
        let (queue, worker) = DelegateQueue::new(delegate.clone());
        tokio::spawn(worker.run());
        Self {
            transport: Arc::new(MemoryTransport::new()),
            delegate,
            config: RingConfig {
                hash_bits: 8,
                num_successors,
                ..RingConfig::new("10.0.0.1:30001")
            },
            queue,
        }
    }

    /// Create and register the vnode at position `v`.
    pub fn add(&self, v: u8) -> Arc<LocalVnode> {
        let local = Arc::new(
            LocalVnode::new(
                vn(v),
                &self.config,
                self.transport.clone(),
                self.queue.clone(),
            )
            .unwrap(),
        );
        self.transport
            .register(local.vnode(), local.clone() as Arc<dyn VnodeRpc>);
        local
    }

    pub fn kill(&self, v: u8) {
        self.transport.set_unreachable(&id(v), true);
    }

    /// Let the delegate worker drain the queue.
    pub async fn flush(&self) {
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
}

pub fn id(v: u8) -> RingId {
    RingId::new(vec![v])
}

/// Vnode at position `v`, each on its own host.
pub fn vn(v: u8) -> Vnode {
    Vnode::new(id(v), &format!("10.0.{}.1:30001", v), 30001, 30002)
}

pub fn ids(vnodes: &[Vnode]) -> Vec<u8> {
    vnodes.iter().map(|v| v.id.as_bytes()[0]).collect()
}

pub fn set_predecessor(local: &LocalVnode, pred: Option<u8>) {
    local.lock_state().unwrap().predecessor = pred.map(vn);
}
