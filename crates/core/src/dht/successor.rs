//! Successor list for a vnode
use super::id::RingId;
use super::vnode::Vnode;

/// A sequence of successors for a vnode on the ring.
/// It's necessary to have multiple successors to prevent a single point of failure.
/// Note the successors are in order of a clockwise distance from the vnode, known
/// entries come first and unknown slots trail as `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuccessorList {
    slots: Vec<Option<Vnode>>,
}

impl SuccessorList {
    /// Create an empty list with `capacity` slots.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of known successors, the leading non-null entries.
    pub fn known(&self) -> usize {
        self.slots.iter().take_while(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.known() == 0
    }

    pub fn first(&self) -> Option<&Vnode> {
        self.slots.first().and_then(|s| s.as_ref())
    }

    pub fn get(&self, index: usize) -> Option<&Vnode> {
        self.slots.get(index).and_then(|s| s.as_ref())
    }

    /// Known successors in order.
    pub fn list(&self) -> Vec<Vnode> {
        self.slots.iter().map_while(|s| s.clone()).collect()
    }

    /// All slots including unknown ones.
    pub fn slots(&self) -> &[Option<Vnode>] {
        &self.slots
    }

    pub fn contains(&self, id: &RingId) -> bool {
        self.slots.iter().flatten().any(|s| &s.id == id)
    }

    /// Overwrite slot `index`, out of range writes are ignored.
    pub fn set(&mut self, index: usize, vnode: Option<Vnode>) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = vnode;
        }
    }

    /// Insert `vnode` as the first successor, shifting the list right and
    /// dropping the last entry.
    pub fn push_front(&mut self, vnode: Vnode) {
        if self.slots.is_empty() {
            return;
        }
        self.slots.pop();
        self.slots.insert(0, Some(vnode));
    }

    /// Drop the first successor, shifting the list left and nulling the freed tail slot.
    pub fn pop_front(&mut self) -> Option<Vnode> {
        if self.slots.is_empty() {
            return None;
        }
        let head = self.slots.remove(0);
        self.slots.push(None);
        head
    }

    /// Replace the tail (every slot after the first) with `succ_list`, the list
    /// returned by our first successor. Copy stops at the first entry equal to
    /// `local` or to the first successor, the rest of the tail is cleared.
    pub fn merge_tail(&mut self, local: &RingId, succ_list: &[Vnode]) {
        let Some(head) = self.first().map(|s| s.id.clone()) else {
            return;
        };
        let max = self.capacity().saturating_sub(1);
        let mut copied = 0;
        for s in succ_list.iter().take(max) {
            if &s.id == local || s.id == head {
                break;
            }
            self.slots[copied + 1] = Some(s.clone());
            copied += 1;
        }
        for slot in self.slots.iter_mut().skip(copied + 1) {
            *slot = None;
        }
    }

    /// Replace the whole list with `succs`, skipping `local` and duplicates.
    pub fn reset(&mut self, local: &RingId, succs: &[Vnode]) {
        let capacity = self.capacity();
        let mut slots: Vec<Option<Vnode>> = Vec::with_capacity(capacity);
        for s in succs {
            if slots.len() >= capacity {
                break;
            }
            if &s.id == local || slots.iter().flatten().any(|x| x.id == s.id) {
                continue;
            }
            slots.push(Some(s.clone()));
        }
        slots.resize(capacity, None);
        self.slots = slots;
    }
}
