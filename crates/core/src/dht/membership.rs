//! Membership protocol served to remote vnodes.
use async_trait::async_trait;

use super::id::between;
use super::id::RingId;
use super::local::LocalVnode;
use super::vnode::Vnode;
use crate::delegate::DelegateEvent;
use crate::error::Error;
use crate::error::Result;
use crate::transport::VnodeRpc;

fn same_vnode(a: Option<&Vnode>, b: Option<&Vnode>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.same(b),
        (None, None) => true,
        _ => false,
    }
}

impl LocalVnode {
    /// Adopt `candidate` as predecessor when we have none, when it sits between the
    /// current predecessor and us, or when the current predecessor is dead.
    /// Returns our known successors.
    pub async fn handle_notify(&self, candidate: Vnode) -> Result<Vec<Vnode>> {
        let current = self.predecessor()?;
        let adopt = match &current {
            None => true,
            Some(p) if between(&p.id, &self.vnode.id, &candidate.id) => true,
            Some(p) if !p.same(&candidate) => !self.transport.ping(p).await,
            Some(_) => false,
        };

        if adopt && !candidate.same(&self.vnode) {
            let mut state = self.lock_state()?;
            if same_vnode(state.predecessor.as_ref(), current.as_ref()) {
                self.delegate.push(DelegateEvent::NewPredecessor {
                    local: self.vnode.clone(),
                    new: candidate.clone(),
                    old: state.predecessor.clone(),
                });
                tracing::info!("{:?} new predecessor {:?}", self.vnode, candidate);
                state.predecessor = Some(candidate.clone());
            }
        }

        // a lone vnode learns its first successor from whoever notifies it
        self.mutate_successors(|state| {
            if state.successors.is_empty() && !candidate.same(&self.vnode) {
                state.successors.set(0, Some(candidate.clone()));
            }
            state.successors.list()
        })
    }

    /// Tell the predecessor to skip us and the successor to forget us.
    /// Both are attempted, their errors are merged.
    pub async fn leave(&self) -> Result<()> {
        let (pred, succ) = {
            let state = self.lock_state()?;
            (state.predecessor.clone(), state.successors.first().cloned())
        };
        tracing::info!("{:?} leaving", self.vnode);
        self.delegate.push(DelegateEvent::Leaving {
            local: self.vnode.clone(),
            pred: pred.clone(),
            succ: succ.clone(),
        });

        let mut err = None;
        if let Some(pred) = &pred {
            err = self
                .transport
                .skip_successor(pred, &self.vnode)
                .await
                .err();
        }
        if let Some(succ) = &succ {
            let ret = self.transport.clear_predecessor(succ, &self.vnode).await;
            err = Error::merge(err, ret.err());
        }
        match err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Forget the predecessor if it is `leaving`.
    pub fn handle_clear_predecessor(&self, leaving: &Vnode) -> Result<()> {
        let mut state = self.lock_state()?;
        if state.predecessor.as_ref().map(|p| p.same(leaving)) == Some(true) {
            self.delegate.push(DelegateEvent::PredecessorLeaving {
                local: self.vnode.clone(),
                old: leaving.clone(),
            });
            state.predecessor = None;
        }
        Ok(())
    }

    /// Drop the first successor if it is `leaving`.
    pub fn handle_skip_successor(&self, leaving: &Vnode) -> Result<()> {
        self.mutate_successors(|state| {
            if let Some(old) = state.successors.first().filter(|s| s.same(leaving)) {
                self.delegate.push(DelegateEvent::SuccessorLeaving {
                    local: self.vnode.clone(),
                    old: old.clone(),
                });
                state.successors.pop_front();
            }
        })
    }
}

#[async_trait]
impl VnodeRpc for LocalVnode {
    async fn get_predecessor(&self) -> Result<Option<Vnode>> {
        self.predecessor()
    }

    async fn notify(&self, candidate: Vnode) -> Result<Vec<Vnode>> {
        self.handle_notify(candidate).await
    }

    async fn find_successors(&self, n: usize, key: RingId) -> Result<Vec<Vnode>> {
        LocalVnode::find_successors(self, n, &key).await
    }

    async fn clear_predecessor(&self, leaving: Vnode) -> Result<()> {
        self.handle_clear_predecessor(&leaving)
    }

    async fn skip_successor(&self, leaving: Vnode) -> Result<()> {
        self.handle_skip_successor(&leaving)
    }
}
