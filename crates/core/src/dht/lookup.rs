//! Key lookup over the finger table and successor list.
use std::collections::HashSet;

use num_bigint::BigUint;

use super::id::between;
use super::id::between_right_incl;
use super::id::distance;
use super::id::RingId;
use super::local::LocalVnode;
use super::local::VnodeState;
use super::vnode::Vnode;
use crate::error::Error;
use crate::error::Result;

/// Known vnodes strictly between a local vnode and a key, closest to the key first.
///
/// Fingers are read from the highest index down, then successors. The local vnode and
/// duplicates are never yielded.
pub struct ClosestPreceding {
    candidates: std::vec::IntoIter<(BigUint, Vnode)>,
}

impl ClosestPreceding {
    /// Collect candidates from a finger table and a successor list.
    pub fn new<'a>(
        local: &Vnode,
        key: &RingId,
        finger: impl DoubleEndedIterator<Item = &'a Option<Vnode>>,
        successors: impl Iterator<Item = &'a Option<Vnode>>,
        bits: usize,
    ) -> Self {
        let mut seen = HashSet::new();
        let mut candidates: Vec<(BigUint, Vnode)> = finger
            .rev()
            .chain(successors)
            .flatten()
            .filter(|n| !n.same(local) && between(&local.id, key, &n.id))
            .filter(|n| seen.insert(n.id.clone()))
            .map(|n| (distance(&n.id, key, bits), n.clone()))
            .collect();
        candidates.sort_by(|a, b| a.0.cmp(&b.0));
        Self {
            candidates: candidates.into_iter(),
        }
    }
}

impl Iterator for ClosestPreceding {
    type Item = Vnode;

    fn next(&mut self) -> Option<Self::Item> {
        self.candidates.next().map(|(_, n)| n)
    }
}

impl LocalVnode {
    fn closest_preceding(&self, state: &VnodeState, key: &RingId) -> ClosestPreceding {
        ClosestPreceding::new(
            &self.vnode,
            key,
            state.finger.list().iter(),
            state.successors.slots().iter(),
            self.hash_bits,
        )
    }

    /// Up to `n` vnodes responsible for `key`, in ring order.
    ///
    /// Answered locally when `key` falls before the first successor, otherwise
    /// forwarded to the closest preceding vnodes in turn. When every hop fails, a
    /// later successor bracketing `key` answers with the rest of the list.
    ///
    /// A vnode which never had a successor owns the whole ring and answers with itself.
    pub async fn find_successors(&self, n: usize, key: &RingId) -> Result<Vec<Vnode>> {
        let (known, closest) = {
            let state = self.lock_state()?;
            if !state.joined && state.successors.is_empty() {
                return Ok(vec![self.vnode.clone()]);
            }
            let known = state.successors.list();
            if let Some(first) = known.first() {
                if between_right_incl(&self.vnode.id, &first.id, key) {
                    return Ok(known.into_iter().take(n).collect());
                }
            }
            (known, self.closest_preceding(&state, key))
        };

        for candidate in closest {
            match self.transport.find_successors(&candidate, n, key).await {
                Ok(res) => return Ok(res.into_iter().take(n).collect()),
                Err(e) => tracing::warn!("failed to contact {:?}: {}", candidate, e),
            }
        }

        if let Some(i) = known
            .iter()
            .skip(1)
            .position(|s| between_right_incl(&self.vnode.id, &s.id, key))
        {
            return Ok(known.into_iter().skip(i + 1).take(n).collect());
        }

        Err(Error::NoRouteFound(key.to_string()))
    }

    /// Predecessor of the vnode responsible for `key`.
    pub async fn find_predecessor(&self, key: &RingId) -> Result<Vnode> {
        let Some(owner) = self.find_successors(1, key).await?.into_iter().next() else {
            return Err(Error::NoRouteFound(key.to_string()));
        };
        self.transport
            .get_predecessor(&owner)
            .await?
            .ok_or_else(|| Error::NoPredecessor(key.to_string()))
    }
}
