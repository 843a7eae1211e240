#![warn(missing_docs)]
use std::ops::Index;

use super::id::between_right_incl;
use super::id::power_offset;
use super::id::RingId;
use super::vnode::Vnode;

/// Finger table of Chord DHT.
/// Entry `i` is the vnode believed responsible for `id + 2^i`. Consecutive entries
/// pointing to the same vnode form a run, a table is refreshed one run at a time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FingerTable {
    finger: Vec<Option<Vnode>>,
    pub(super) last_finger: usize,
}

impl FingerTable {
    /// builder, `size` is the bit width of the ring
    pub fn new(size: usize) -> Self {
        Self {
            finger: vec![None; size],
            last_finger: 0,
        }
    }

    /// number of slots
    pub fn size(&self) -> usize {
        self.finger.len()
    }

    /// is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// get length of finger
    pub fn len(&self) -> usize {
        self.finger.iter().flatten().count()
    }

    /// getter
    pub fn get(&self, index: usize) -> Option<&Vnode> {
        self.finger.get(index).and_then(|f| f.as_ref())
    }

    /// get finger list
    pub fn list(&self) -> &Vec<Option<Vnode>> {
        &self.finger
    }

    /// Index to refresh on next stabilization.
    pub fn last_finger(&self) -> usize {
        self.last_finger
    }

    /// Check finger is contains some node
    pub fn contains(&self, id: &RingId) -> bool {
        self.finger.iter().flatten().any(|f| &f.id == id)
    }

    /// The first entry of every run, in index order, skipping empty slots.
    pub fn runs(&self) -> impl Iterator<Item = (usize, &Vnode)> + '_ {
        self.finger.iter().enumerate().filter_map(|(i, f)| {
            let node = f.as_ref()?;
            match i.checked_sub(1).and_then(|p| self.finger[p].as_ref()) {
                Some(prev) if prev == node => None,
                _ => Some((i, node)),
            }
        })
    }

    /// Put `node` at `index`, then extend it through the following slots while the
    /// node stays responsible for their offset from `local`.
    /// Returns the last index written.
    pub fn fix(&mut self, local: &RingId, index: usize, node: Vnode) -> usize {
        let bits = self.size();
        if index >= bits {
            tracing::error!("fix finger index out of range, index: {}", index);
            return index;
        }
        let mut idx = index;
        while idx + 1 < bits {
            let offset = power_offset(local, idx + 1, bits);
            if !between_right_incl(local, &node.id, &offset) {
                break;
            }
            self.finger[idx + 1] = Some(node.clone());
            idx += 1;
        }
        self.finger[index] = Some(node);
        idx
    }

    /// Replace every slot, the table keeps its size.
    pub(super) fn restore(&mut self, finger: Vec<Option<Vnode>>, last_finger: usize) {
        let size = self.size();
        self.finger = finger;
        self.finger.resize(size, None);
        self.last_finger = if last_finger < size { last_finger } else { 0 };
    }
}

impl Index<usize> for FingerTable {
    type Output = Option<Vnode>;
    fn index(&self, index: usize) -> &Self::Output {
        &self.finger[index]
    }
}
