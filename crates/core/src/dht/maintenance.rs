//! Self-healing steps of a stabilization pass.
use super::id::between;
use super::id::between_right_incl;
use super::id::power_offset;
use super::id::RingId;
use super::local::LocalVnode;
use super::vnode::Vnode;
use crate::error::Error;
use crate::error::Result;

impl LocalVnode {
    /// Ask the first successor for its predecessor and adopt it when it sits between
    /// us and the successor.
    ///
    /// Successors failing to answer are dropped from the head of the list. Once the
    /// list is exhausted, the first finger run not covered by the dead successors is
    /// promoted. Returns [Error::RingIsolated] when no live successor can be found.
    pub async fn check_new_successor(&self) -> Result<()> {
        let mut dead: Option<Vnode> = None;
        let mut tried: Vec<RingId> = vec![];
        let (succ, maybe_succ) = loop {
            let head = self.lock_state()?.successors.first().cloned();
            let succ = match head {
                Some(succ) => succ,
                None => self.promote_finger(dead.as_ref(), &tried)?,
            };
            match self.transport.get_predecessor(&succ).await {
                Ok(pred) => break (succ, pred),
                Err(e) => {
                    tracing::warn!("get predecessor of {:?} failed: {}", succ, e);
                    self.drop_dead_successor(&succ)?;
                    tried.push(succ.id.clone());
                    dead = Some(succ);
                }
            }
        };

        let Some(maybe_succ) = maybe_succ else {
            return Ok(());
        };
        if !between(&self.vnode.id, &succ.id, &maybe_succ.id) {
            return Ok(());
        }
        if !self.transport.ping(&maybe_succ).await {
            tracing::warn!(
                "failed to contact potential new successor {:?}",
                maybe_succ
            );
            if let Err(e) = self.transport.notify(&succ, &self.vnode).await {
                tracing::warn!("renotify {:?} failed: {}", succ, e);
            }
            return Err(Error::PeerUnreachable(maybe_succ.to_string()));
        }

        let adopted = self.mutate_successors(|state| {
            let unchanged = state
                .successors
                .first()
                .map(|s| s.same(&succ))
                .unwrap_or(false);
            if unchanged {
                state.successors.push_front(maybe_succ.clone());
            }
            unchanged
        })?;
        if adopted {
            self.fix_finger_table_at_index(0).await?;
        }
        Ok(())
    }

    fn drop_dead_successor(&self, dead: &Vnode) -> Result<()> {
        self.mutate_successors(|state| {
            if state.successors.first().map(|s| s.same(dead)) == Some(true) {
                state.successors.pop_front();
            }
        })
    }

    /// Put the first finger run representative outside `(self, dead]` at the head of
    /// an empty successor list.
    fn promote_finger(&self, dead: Option<&Vnode>, tried: &[RingId]) -> Result<Vnode> {
        let local = &self.vnode;
        let promoted = self.mutate_successors(|state| {
            if let Some(head) = state.successors.first() {
                return Some(head.clone());
            }
            let candidate = state
                .finger
                .runs()
                .map(|(_, n)| n)
                .find(|n| {
                    !n.same(local)
                        && !tried.contains(&n.id)
                        && dead.map_or(true, |d| !between_right_incl(&local.id, &d.id, &n.id))
                })
                .cloned();
            if let Some(candidate) = &candidate {
                state.successors.set(0, Some(candidate.clone()));
            }
            candidate
        })?;
        match promoted {
            Some(vnode) => {
                tracing::warn!("all known successors dead, promoted finger {:?}", vnode);
                Ok(vnode)
            }
            None => {
                tracing::error!("{:?} all known successors and fingers dead", local);
                Err(Error::RingIsolated(local.to_string()))
            }
        }
    }

    /// Notify the first successor and merge the successor list it returns.
    pub async fn notify_successor(&self) -> Result<()> {
        let succ = self.first_successor()?;
        let succ_list = self.transport.notify(&succ, &self.vnode).await?;
        self.mutate_successors(|state| {
            if state.successors.first().map(|s| s.same(&succ)) == Some(true) {
                state.successors.merge_tail(&self.vnode.id, &succ_list);
            }
        })
    }

    /// Resolve the owner of `id + 2^idx` and write it at `idx`, extended over the
    /// following indexes it is also responsible for.
    /// Returns the next index to refresh.
    pub async fn fix_finger_table_at_index(&self, idx: usize) -> Result<usize> {
        let offset = power_offset(&self.vnode.id, idx, self.hash_bits);
        let Some(mut node) = self.find_successors(1, &offset).await?.into_iter().next() else {
            return Ok(idx);
        };

        let current = self.lock_state()?.finger.get(idx).cloned();
        if let Some(current) = current {
            if !current.same(&node) && !self.transport.ping(&node).await {
                tracing::warn!("keep finger {} at {:?}, {:?} is dead", idx, current, node);
                node = current;
            }
        }

        let last = self.lock_state()?.finger.fix(&self.vnode.id, idx, node);
        Ok(if last + 1 >= self.hash_bits { 0 } else { last + 1 })
    }

    /// Refresh the finger run under the cursor and advance it.
    pub async fn fix_finger_table(&self) -> Result<()> {
        let idx = self.lock_state()?.finger.last_finger();
        let next = self.fix_finger_table_at_index(idx).await?;
        self.lock_state()?.finger.last_finger = next;
        Ok(())
    }

    /// Forget the predecessor when it does not answer a probe.
    pub async fn check_predecessor(&self) -> Result<()> {
        let Some(pred) = self.predecessor()? else {
            return Ok(());
        };
        if self.transport.ping(&pred).await {
            return Ok(());
        }
        tracing::warn!("{:?} predecessor {:?} is dead", self.vnode, pred);
        let mut state = self.lock_state()?;
        if state.predecessor.as_ref().map(|p| p.same(&pred)) == Some(true) {
            state.predecessor = None;
        }
        Ok(())
    }
}
