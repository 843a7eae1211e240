#![warn(missing_docs)]
//! Owner of the local vnodes of a process.
use std::sync::Arc;
use std::sync::Mutex;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::RingConfig;
use crate::consts::RING_EVENT_CAPACITY;
use crate::delegate::Delegate;
use crate::delegate::DelegateEvent;
use crate::delegate::DelegateQueue;
use crate::delegate::DelegateWorker;
use crate::dht::distance;
use crate::dht::LocalVnode;
use crate::dht::RingId;
use crate::dht::Stabilizer;
use crate::dht::Vnode;
use crate::error::Error;
use crate::error::Result;
use crate::transport::Transport;
use crate::transport::VnodeRpc;

/// Events a ring reports to its supervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RingEvent {
    /// The vnode found no live successor and stopped stabilizing.
    Isolated(Vnode),
}

/// A set of local vnodes sharing one config, transport and delegate.
pub struct Ring {
    config: Arc<RingConfig>,
    vnodes: Vec<Arc<LocalVnode>>,
    transport: Arc<dyn Transport>,
    delegate: DelegateQueue,
    worker: Mutex<Option<DelegateWorker>>,
    events: broadcast::Sender<RingEvent>,
    token: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Ring {
    /// Build `config.num_vnodes` vnodes and register them with `transport`.
    /// Vnode `i` is placed with height `join_blk_height + i`.
    pub fn new(
        config: RingConfig,
        transport: Arc<dyn Transport>,
        delegate: Arc<dyn Delegate>,
    ) -> Result<Self> {
        config.validate()?;
        let (queue, worker) = DelegateQueue::new(delegate);
        let mut vnodes = Vec::with_capacity(config.num_vnodes);
        for i in 0..config.num_vnodes {
            let height = config.join_blk_height + i as u32;
            let id = RingId::generate(config.hash_func, &config.hostname, height, config.hash_bits);
            let vnode = Vnode::new(id, &config.hostname, config.node_port, config.http_ws_port);
            let local = Arc::new(LocalVnode::new(
                vnode,
                &config,
                transport.clone(),
                queue.clone(),
            )?);
            transport.register(local.vnode(), local.clone() as Arc<dyn VnodeRpc>);
            vnodes.push(local);
        }
        vnodes.sort_by(|a, b| a.id().cmp(b.id()));
        let (events, _) = broadcast::channel(RING_EVENT_CAPACITY);
        Ok(Self {
            config: Arc::new(config),
            vnodes,
            transport,
            delegate: queue,
            worker: Mutex::new(Some(worker)),
            events,
            token: CancellationToken::new(),
            tasks: Mutex::new(vec![]),
        })
    }

    /// Config of the ring.
    pub fn config(&self) -> &RingConfig {
        &self.config
    }

    /// Local vnodes ordered by id.
    pub fn vnodes(&self) -> &[Arc<LocalVnode>] {
        &self.vnodes
    }

    /// Start a new ring: every local vnode takes the following local vnodes as successors.
    pub fn create(&self) -> Result<()> {
        let len = self.vnodes.len();
        for (i, local) in self.vnodes.iter().enumerate() {
            let succs: Vec<Vnode> = (1..len)
                .map(|k| self.vnodes[(i + k) % len].vnode().clone())
                .collect();
            local.set_successors(&succs)?;
        }
        tracing::info!("created ring with {} vnodes", len);
        Ok(())
    }

    /// Join the ring `existing` belongs to.
    pub async fn join(&self, existing: &Vnode) -> Result<()> {
        for local in &self.vnodes {
            let succs = self
                .transport
                .find_successors(existing, self.config.num_successors, local.id())
                .await?;
            if succs.is_empty() {
                return Err(Error::NoSuccessor(local.vnode().to_string()));
            }
            local.set_successors(&succs)?;
        }
        tracing::info!("joined ring through {:?}", existing);
        Ok(())
    }

    /// Spawn the delegate worker and, for every vnode, a stabilizer and a keepalive task.
    pub fn start(&self) -> Result<()> {
        let worker = self
            .worker
            .lock()
            .map_err(|_| Error::VnodeSyncLockError)?
            .take()
            .ok_or_else(|| Error::Configuration("ring already started".to_string()))?;
        // ends by itself once every queue is dropped
        tokio::spawn(worker.run());

        let mut tasks = self.tasks.lock().map_err(|_| Error::VnodeSyncLockError)?;

        for local in &self.vnodes {
            let stabilizer = Arc::new(Stabilizer::new(local.clone(), self.config.clone()));
            let events = self.events.clone();
            let token = self.token.clone();
            let runner = stabilizer.clone();
            tasks.push(tokio::spawn(async move {
                let vnode = runner.vnode().vnode().clone();
                match runner.wait(token).await {
                    Ok(()) => {}
                    Err(e) if e.is_fatal() => {
                        tracing::error!("{:?} stopped: {}", vnode, e);
                        if events.send(RingEvent::Isolated(vnode)).is_err() {
                            tracing::warn!("no subscriber for ring events");
                        }
                    }
                    Err(e) => tracing::error!("stabilizer of {:?} failed: {}", vnode, e),
                }
            }));
            tasks.push(tokio::spawn(stabilizer.keepalive(
                self.config.keepalive_interval(),
                self.token.clone(),
            )));
        }
        Ok(())
    }

    /// Receive [RingEvent]s published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<RingEvent> {
        self.events.subscribe()
    }

    /// Up to `n` vnodes responsible for `key`. `key` is hashed with the ring's hash
    /// function and routed from the local vnode closest before it.
    pub async fn lookup(&self, n: usize, key: &[u8]) -> Result<Vec<Vnode>> {
        if n == 0 || n > self.config.num_successors {
            return Err(Error::Configuration(format!(
                "lookup asks for {} successors, allowed 1 to {}",
                n, self.config.num_successors
            )));
        }
        let key = RingId::new(self.config.hash_key(key));
        let bits = self.config.hash_bits;
        // the vnode farthest clockwise from the key is the closest one before it
        let closest = self
            .vnodes
            .iter()
            .max_by_key(|v| distance(&key, v.id(), bits))
            .ok_or_else(|| Error::Configuration("ring has no vnode".to_string()))?;
        closest.find_successors(n, &key).await
    }

    /// Stop maintenance and make every vnode leave, errors are merged.
    pub async fn leave(&self) -> Result<()> {
        self.stop_tasks().await?;
        let mut err = None;
        for local in &self.vnodes {
            err = Error::merge(err, local.leave().await.err());
        }
        self.finish();
        match err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Stop maintenance and notify the delegate, without telling the neighbours.
    pub async fn shutdown(&self) -> Result<()> {
        self.stop_tasks().await?;
        self.finish();
        Ok(())
    }

    async fn stop_tasks(&self) -> Result<()> {
        self.token.cancel();
        let tasks: Vec<_> = self
            .tasks
            .lock()
            .map_err(|_| Error::VnodeSyncLockError)?
            .drain(..)
            .collect();
        for task in tasks {
            if let Err(e) = task.await {
                tracing::error!("ring task failed {:?}", e);
            }
        }
        Ok(())
    }

    fn finish(&self) {
        for local in &self.vnodes {
            self.transport.deregister(local.vnode());
        }
        self.delegate.push(DelegateEvent::Shutdown);
        tracing::info!("ring shutdown");
    }
}
