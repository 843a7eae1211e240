use std::sync::Arc;
use std::time::Duration;

use crate::config::RingConfig;
use crate::delegate::LoggingDelegate;
use crate::delegate::NoopDelegate;
use crate::dht::between_right_incl;
use crate::dht::LocalVnode;
use crate::dht::RingId;
use crate::dht::Stabilizer;
use crate::dht::Vnode;
use crate::error::Error;
use crate::error::Result;
use crate::ring::Ring;
use crate::ring::RingEvent;
use crate::transport::MemoryTransport;

fn config(host: &str, num_vnodes: usize) -> RingConfig {
    RingConfig {
        num_vnodes,
        num_successors: 5,
        stabilize_interval_ms: 10,
        stabilize_jitter_ms: 10,
        keepalive_interval_ms: 10,
        ..RingConfig::new(host)
    }
}

async fn stabilize_all(rings: &[&Ring], rounds: usize) {
    for _ in 0..rounds {
        for ring in rings {
            let config = Arc::new(ring.config().clone());
            for vnode in ring.vnodes() {
                Stabilizer::new(vnode.clone(), config.clone())
                    .stabilize()
                    .await
                    .unwrap();
            }
        }
    }
}

fn sorted_vnodes(rings: &[&Ring]) -> Vec<Arc<LocalVnode>> {
    let mut all: Vec<_> = rings.iter().flat_map(|r| r.vnodes().to_vec()).collect();
    all.sort_by(|a, b| a.id().cmp(b.id()));
    all
}

fn assert_ring_order(all: &[Arc<LocalVnode>]) {
    let len = all.len();
    for (i, vnode) in all.iter().enumerate() {
        let next = all[(i + 1) % len].vnode();
        let prev = all[(i + len - 1) % len].vnode();
        assert_eq!(&vnode.first_successor().unwrap(), next, "successor of {}", i);
        assert_eq!(vnode.predecessor().unwrap().as_ref(), Some(prev), "predecessor of {}", i);
    }
}

fn owner_of(all: &[Arc<LocalVnode>], key: &RingId) -> Vnode {
    let len = all.len();
    (0..len)
        .map(|i| (all[(i + len - 1) % len].vnode(), all[i].vnode()))
        .find(|(prev, cur)| between_right_incl(&prev.id, &cur.id, key))
        .map(|(_, cur)| cur.clone())
        .unwrap()
}

#[tokio::test]
async fn test_new_ring_validates_config() {
    let transport = Arc::new(MemoryTransport::new());
    let bad = RingConfig {
        hash_bits: 7,
        ..config("10.0.0.1:30001", 1)
    };
    let ret = Ring::new(bad, transport.clone(), Arc::new(NoopDelegate));
    assert!(matches!(ret, Err(Error::Configuration(_))));
    assert!(transport.is_empty());
}

#[tokio::test]
async fn test_create_links_local_vnodes() -> Result<()> {
    let transport = Arc::new(MemoryTransport::new());
    let ring = Ring::new(
        config("10.0.0.1:30001", 3),
        transport.clone(),
        Arc::new(NoopDelegate),
    )?;
    assert_eq!(transport.len(), 3);
    ring.create()?;

    let vnodes = ring.vnodes();
    for (i, vnode) in vnodes.iter().enumerate() {
        let expected = vec![
            vnodes[(i + 1) % 3].vnode().clone(),
            vnodes[(i + 2) % 3].vnode().clone(),
        ];
        assert_eq!(vnode.successors()?, expected);
        assert!(vnode.is_joined()?);
    }

    stabilize_all(&[&ring], 3).await;
    assert_ring_order(vnodes);
    Ok(())
}

#[tokio::test]
async fn test_single_vnode_ring_waits_for_peers() -> Result<()> {
    let transport = Arc::new(MemoryTransport::new());
    let ring = Ring::new(
        config("10.0.0.1:30001", 1),
        transport,
        Arc::new(NoopDelegate),
    )?;
    ring.create()?;
    let mut events = ring.subscribe();
    ring.start()?;
    assert!(matches!(ring.start(), Err(Error::Configuration(_))));

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(events.try_recv().is_err());
    assert!(!ring.vnodes()[0].is_joined()?);
    ring.shutdown().await
}

#[tokio::test]
async fn test_join_and_lookup() -> Result<()> {
    let transport = Arc::new(MemoryTransport::new());
    let ring1 = Ring::new(
        config("10.0.0.1:30001", 3),
        transport.clone(),
        Arc::new(LoggingDelegate),
    )?;
    let ring2 = Ring::new(
        config("10.0.0.2:30001", 3),
        transport.clone(),
        Arc::new(LoggingDelegate),
    )?;
    ring1.create()?;
    ring2.join(ring1.vnodes()[0].vnode()).await?;

    stabilize_all(&[&ring1, &ring2], 12).await;
    let all = sorted_vnodes(&[&ring1, &ring2]);
    assert_ring_order(&all);

    let keys: [&[u8]; 4] = [b"rings", b"chord", b"vnode", b"successor"];
    for key in keys {
        let expected = owner_of(&all, &RingId::new(ring1.config().hash_key(key)));
        assert_eq!(ring1.lookup(1, key).await?, vec![expected.clone()]);
        assert_eq!(ring2.lookup(1, key).await?, vec![expected]);
    }
    assert!(matches!(
        ring1.lookup(6, b"rings").await,
        Err(Error::Configuration(_))
    ));
    Ok(())
}

#[tokio::test]
async fn test_leave_and_heal() -> Result<()> {
    let transport = Arc::new(MemoryTransport::new());
    let ring1 = Ring::new(
        config("10.0.0.1:30001", 3),
        transport.clone(),
        Arc::new(NoopDelegate),
    )?;
    let ring2 = Ring::new(
        config("10.0.0.2:30001", 3),
        transport.clone(),
        Arc::new(NoopDelegate),
    )?;
    ring1.create()?;
    ring2.join(ring1.vnodes()[0].vnode()).await?;
    stabilize_all(&[&ring1, &ring2], 12).await;

    ring2.leave().await?;
    assert_eq!(transport.len(), 3);

    stabilize_all(&[&ring1], 6).await;
    assert_ring_order(ring1.vnodes());
    Ok(())
}

#[tokio::test]
async fn test_ring_reports_isolation() -> Result<()> {
    let transport = Arc::new(MemoryTransport::new());
    let ring = Ring::new(
        config("10.0.0.1:30001", 2),
        transport.clone(),
        Arc::new(NoopDelegate),
    )?;
    ring.create()?;
    let mut events = ring.subscribe();
    ring.start()?;

    let lonely = ring.vnodes()[0].vnode().clone();
    transport.set_unreachable(ring.vnodes()[1].id(), true);

    let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("no ring event")
        .unwrap();
    assert_eq!(event, RingEvent::Isolated(lonely));
    ring.shutdown().await
}

#[tokio::test]
async fn test_join_lone_seed() -> Result<()> {
    let transport = Arc::new(MemoryTransport::new());
    let seed = Ring::new(
        config("10.0.0.1:30001", 1),
        transport.clone(),
        Arc::new(NoopDelegate),
    )?;
    let joiner = Ring::new(
        config("10.0.0.2:30001", 2),
        transport.clone(),
        Arc::new(NoopDelegate),
    )?;
    seed.create()?;
    let lone = seed.vnodes()[0].vnode().clone();
    assert!(!seed.vnodes()[0].is_joined()?);
    // a lone vnode owns every key
    assert_eq!(seed.lookup(1, b"rings").await?, vec![lone.clone()]);

    joiner.join(&lone).await?;
    for local in joiner.vnodes() {
        assert_eq!(local.successors()?, vec![lone.clone()]);
    }

    // the seed learns its successor from the first notify of the joiner
    stabilize_all(&[&joiner, &seed], 12).await;
    assert!(seed.vnodes()[0].is_joined()?);
    let all = sorted_vnodes(&[&seed, &joiner]);
    assert_ring_order(&all);
    Ok(())
}

#[tokio::test]
async fn test_poisoned_vnode_is_not_reported_isolated() -> Result<()> {
    let transport = Arc::new(MemoryTransport::new());
    let ring = Ring::new(
        config("10.0.0.1:30001", 1),
        transport,
        Arc::new(NoopDelegate),
    )?;
    ring.create()?;
    let local = ring.vnodes()[0].clone();
    let poisoned = std::thread::spawn(move || {
        let _state = local.lock_state().unwrap();
        panic!("poison vnode state");
    })
    .join();
    assert!(poisoned.is_err());
    assert!(matches!(
        ring.vnodes()[0].is_joined(),
        Err(Error::VnodeSyncLockError)
    ));

    let mut events = ring.subscribe();
    ring.start()?;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(events.try_recv().is_err());
    ring.shutdown().await
}
