//! Transfer form of a vnode's routing state.
//!
//! The finger table is stored run-length compressed: only the last slot of every run
//! carries a value, an empty slot means "same as the next non-empty slot". Tables are
//! filled from index 0 upward, so a known run is never preceded by unknown slots.
//! A table with a gap of unknown slots between two known runs is not representable.
use serde::Deserialize;
use serde::Serialize;

use super::vnode::Vnode;
use crate::error::Error;
use crate::error::Result;

/// Exported state of a [LocalVnode](super::LocalVnode).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VnodeSnapshot {
    /// identity of the exported vnode
    pub vnode: Vnode,
    /// successor slots, unknown slots as null
    pub successors: Vec<Option<Vnode>>,
    /// compressed finger table, see [encode_fingers]
    pub finger: Vec<Option<Vnode>>,
    /// predecessor, if known
    pub predecessor: Option<Vnode>,
    /// next finger index to refresh
    pub last_finger: usize,
}

impl VnodeSnapshot {
    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(Error::Serialize)
    }

    /// Deserialize from JSON.
    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(Error::Deserialize)
    }
}

/// Keep the last entry of every run and the final slot, clear everything else.
pub fn encode_fingers(finger: &[Option<Vnode>]) -> Vec<Option<Vnode>> {
    let mut out = vec![None; finger.len()];
    let Some(mut last) = finger.first() else {
        return out;
    };
    for (i, entry) in finger.iter().enumerate().skip(1) {
        if entry != last {
            out[i - 1] = last.clone();
        }
        last = entry;
    }
    if let Some(tail) = out.last_mut() {
        *tail = last.clone();
    }
    out
}

/// Fill every empty slot with the nearest non-empty slot on its right.
pub fn decode_fingers(encoded: &[Option<Vnode>]) -> Vec<Option<Vnode>> {
    let mut out = encoded.to_vec();
    let mut next: Option<Vnode> = None;
    for slot in out.iter_mut().rev() {
        if slot.is_none() {
            *slot = next.clone();
        } else {
            next = slot.clone();
        }
    }
    out
}
