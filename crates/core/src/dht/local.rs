//! Local vnode and its guarded routing state.
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use chrono::DateTime;
use chrono::Utc;

use super::finger::FingerTable;
use super::id::RingId;
use super::snapshot::decode_fingers;
use super::snapshot::encode_fingers;
use super::snapshot::VnodeSnapshot;
use super::successor::SuccessorList;
use super::vnode::Vnode;
use crate::config::RingConfig;
use crate::delegate::DelegateQueue;
use crate::error::Error;
use crate::error::Result;
use crate::transport::Transport;

/// Invoked with the new first successor whenever it changes.
pub type NewSuccessorCallback = Arc<dyn Fn(&Vnode) + Send + Sync>;

/// Mutable routing state of a vnode, always accessed through [LocalVnode::lock_state].
#[derive(Debug, Clone)]
pub struct VnodeState {
    /// closest successors in ring order
    pub successors: SuccessorList,
    /// finger table with its refresh cursor
    pub finger: FingerTable,
    /// predecessor, if known
    pub predecessor: Option<Vnode>,
    /// end of the last stabilization pass
    pub stabilized_at: Option<DateTime<Utc>>,
    /// set once the vnode had a successor
    pub joined: bool,
}

/// A vnode hosted by this process.
///
/// Maintenance lives in [Stabilizer](super::Stabilizer), remote handlers are exposed
/// through [VnodeRpc](crate::transport::VnodeRpc).
pub struct LocalVnode {
    pub(super) vnode: Vnode,
    pub(super) hash_bits: usize,
    pub(super) transport: Arc<dyn Transport>,
    pub(super) delegate: DelegateQueue,
    state: Mutex<VnodeState>,
    on_new_successor: Mutex<Option<NewSuccessorCallback>>,
}

impl LocalVnode {
    /// Create a vnode with empty tables.
    /// Fails when the id length does not match `config.hash_bits`.
    pub fn new(
        vnode: Vnode,
        config: &RingConfig,
        transport: Arc<dyn Transport>,
        delegate: DelegateQueue,
    ) -> Result<Self> {
        if vnode.id.len() != config.id_len() {
            return Err(Error::Configuration(format!(
                "vnode id {} has {} bytes, ring expects {}",
                vnode.id,
                vnode.id.len(),
                config.id_len()
            )));
        }
        Ok(Self {
            vnode,
            hash_bits: config.hash_bits,
            transport,
            delegate,
            state: Mutex::new(VnodeState {
                successors: SuccessorList::new(config.num_successors),
                finger: FingerTable::new(config.hash_bits),
                predecessor: None,
                stabilized_at: None,
                joined: false,
            }),
            on_new_successor: Mutex::new(None),
        })
    }

    /// Identity of this vnode.
    pub fn vnode(&self) -> &Vnode {
        &self.vnode
    }

    /// Ring id of this vnode.
    pub fn id(&self) -> &RingId {
        &self.vnode.id
    }

    /// Lock and return the routing state.
    /// Never hold the guard across a remote call.
    pub fn lock_state(&self) -> Result<MutexGuard<VnodeState>> {
        self.state.lock().map_err(|_| Error::VnodeSyncLockError)
    }

    /// Install the callback fired when the first successor changes.
    pub fn set_on_new_successor(&self, callback: NewSuccessorCallback) -> Result<()> {
        let mut slot = self
            .on_new_successor
            .lock()
            .map_err(|_| Error::VnodeSyncLockError)?;
        *slot = Some(callback);
        Ok(())
    }

    /// Apply `f` to the state, then fire the new successor callback if the first
    /// successor changed. The callback runs after the lock is released.
    pub(super) fn mutate_successors<T>(&self, f: impl FnOnce(&mut VnodeState) -> T) -> Result<T> {
        let (ret, changed) = {
            let mut state = self.lock_state()?;
            let before = state.successors.first().map(|s| s.id.clone());
            let ret = f(&mut *state);
            if !state.successors.is_empty() {
                state.joined = true;
            }
            let changed = match state.successors.first() {
                Some(head) if before.as_ref() != Some(&head.id) => Some(head.clone()),
                _ => None,
            };
            (ret, changed)
        };
        if let Some(head) = changed {
            tracing::info!("{:?} new successor {:?}", self.vnode, head);
            let callback = self
                .on_new_successor
                .lock()
                .map_err(|_| Error::VnodeSyncLockError)?
                .clone();
            if let Some(callback) = callback {
                callback(&head);
            }
        }
        Ok(ret)
    }

    /// Replace the successor list, skipping this vnode and duplicates.
    pub fn set_successors(&self, succs: &[Vnode]) -> Result<()> {
        self.mutate_successors(|state| state.successors.reset(&self.vnode.id, succs))
    }

    /// Known successors in ring order.
    pub fn successors(&self) -> Result<Vec<Vnode>> {
        Ok(self.lock_state()?.successors.list())
    }

    /// First successor.
    pub fn first_successor(&self) -> Result<Vnode> {
        self.lock_state()?
            .successors
            .first()
            .cloned()
            .ok_or_else(|| Error::NoSuccessor(self.vnode.to_string()))
    }

    /// Number of known successors.
    pub fn known_successors(&self) -> Result<usize> {
        Ok(self.lock_state()?.successors.known())
    }

    /// Current predecessor.
    pub fn predecessor(&self) -> Result<Option<Vnode>> {
        Ok(self.lock_state()?.predecessor.clone())
    }

    /// Copy of the finger table.
    pub fn finger(&self) -> Result<FingerTable> {
        Ok(self.lock_state()?.finger.clone())
    }

    /// End of the last stabilization pass.
    pub fn stabilized_at(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.lock_state()?.stabilized_at)
    }

    /// True once the vnode had a successor.
    pub fn is_joined(&self) -> Result<bool> {
        Ok(self.lock_state()?.joined)
    }

    /// Every distinct vnode of the finger table, successor list and predecessor
    /// hosted on another host.
    pub fn neighbors(&self) -> Result<Vec<Vnode>> {
        let state = self.lock_state()?;
        let mut seen = HashSet::new();
        let neighbors = state
            .finger
            .list()
            .iter()
            .chain(state.successors.slots())
            .chain(std::iter::once(&state.predecessor))
            .flatten()
            .filter(|n| n.host != self.vnode.host)
            .filter(|n| seen.insert(n.id.clone()))
            .cloned()
            .collect();
        Ok(neighbors)
    }

    /// True when a successor, the predecessor or a finger lives on `host`.
    pub fn should_connect_to_host(&self, host: &str) -> Result<bool> {
        let state = self.lock_state()?;
        Ok(state
            .successors
            .slots()
            .iter()
            .chain(std::iter::once(&state.predecessor))
            .chain(state.finger.list())
            .flatten()
            .any(|n| n.host == host))
    }

    /// True when `id` is one of the [LocalVnode::neighbors].
    pub fn has_neighbor_id(&self, id: &RingId) -> Result<bool> {
        Ok(self.neighbors()?.iter().any(|n| &n.id == id))
    }

    /// Export the routing state.
    pub fn export(&self) -> Result<VnodeSnapshot> {
        let state = self.lock_state()?;
        Ok(VnodeSnapshot {
            vnode: self.vnode.clone(),
            successors: state.successors.slots().to_vec(),
            finger: encode_fingers(state.finger.list()),
            predecessor: state.predecessor.clone(),
            last_finger: state.finger.last_finger(),
        })
    }

    /// Restore the routing state exported from a vnode with the same id.
    pub fn import(&self, snapshot: &VnodeSnapshot) -> Result<()> {
        if !snapshot.vnode.same(&self.vnode) {
            return Err(Error::Configuration(format!(
                "snapshot of {} cannot be imported into {}",
                snapshot.vnode, self.vnode
            )));
        }
        let succs: Vec<Vnode> = snapshot.successors.iter().flatten().cloned().collect();
        let finger = decode_fingers(&snapshot.finger);
        self.mutate_successors(|state| {
            state.successors.reset(&self.vnode.id, &succs);
            state.finger.restore(finger, snapshot.last_finger);
            state.predecessor = snapshot.predecessor.clone();
        })
    }
}
