use std::sync::Arc;

use crate::dht::distance;
use crate::dht::LocalVnode;
use crate::error::Error;
use crate::error::Result;
use crate::tests::default::id;
use crate::tests::default::ids;
use crate::tests::default::set_predecessor;
use crate::tests::default::vn;
use crate::tests::default::TestRing;

const POSITIONS: [u8; 6] = [10, 50, 90, 130, 170, 210];

/// Six vnodes with correct successor lists and predecessors, empty fingers.
fn six_vnodes(ring: &TestRing) -> Vec<Arc<LocalVnode>> {
    let nodes: Vec<_> = POSITIONS.iter().map(|v| ring.add(*v)).collect();
    for (i, node) in nodes.iter().enumerate() {
        node.set_successors(&[vn(POSITIONS[(i + 1) % 6]), vn(POSITIONS[(i + 2) % 6])])
            .unwrap();
        set_predecessor(node, Some(POSITIONS[(i + 5) % 6]));
    }
    nodes
}

#[tokio::test]
async fn test_find_successors_local_answer() -> Result<()> {
    let ring = TestRing::new(2);
    let nodes = six_vnodes(&ring);

    assert_eq!(ids(&nodes[0].find_successors(2, &id(30)).await?), vec![50, 90]);
    assert_eq!(ids(&nodes[0].find_successors(1, &id(50)).await?), vec![50]);
    Ok(())
}

#[tokio::test]
async fn test_find_successors_routes_remotely() -> Result<()> {
    let ring = TestRing::new(2);
    let nodes = six_vnodes(&ring);

    assert_eq!(ids(&nodes[0].find_successors(2, &id(100)).await?), vec![130, 170]);
    // wraps through zero
    assert_eq!(ids(&nodes[2].find_successors(1, &id(5)).await?), vec![10]);
    assert_eq!(ids(&nodes[4].find_successors(2, &id(211)).await?), vec![10, 50]);
    Ok(())
}

#[tokio::test]
async fn test_find_successors_never_exceeds_n() -> Result<()> {
    let ring = TestRing::new(2);
    let nodes = six_vnodes(&ring);
    for key in [0u8, 11, 49, 51, 129, 200, 255] {
        for n in 1..=2 {
            let found = nodes[1].find_successors(n, &id(key)).await?;
            assert!(found.len() <= n);
            assert!(!found.is_empty());
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_find_successors_skips_dead_hop() -> Result<()> {
    let ring = TestRing::new(2);
    let nodes = six_vnodes(&ring);
    ring.kill(90);

    // 90 is the closest hop, 50 answers from the tail of its successor list
    let found = nodes[0].find_successors(2, &id(100)).await?;
    assert_eq!(ids(&found), vec![130]);
    Ok(())
}

#[tokio::test]
async fn test_find_successors_no_route() {
    let ring = TestRing::new(2);
    let a = ring.add(10);
    let _b = ring.add(50);
    a.set_successors(&[vn(50)]).unwrap();
    ring.kill(50);

    let ret = a.find_successors(1, &id(100)).await;
    assert!(matches!(ret, Err(Error::NoRouteFound(_))));
}

#[tokio::test]
async fn test_find_predecessor() -> Result<()> {
    let ring = TestRing::new(2);
    let nodes = six_vnodes(&ring);

    assert_eq!(nodes[0].find_predecessor(&id(100)).await?, vn(90));

    set_predecessor(&nodes[3], None);
    let ret = nodes[0].find_predecessor(&id(100)).await;
    assert!(matches!(ret, Err(Error::NoPredecessor(_))));
    Ok(())
}

#[tokio::test]
async fn test_lookup_uses_fingers() -> Result<()> {
    let ring = TestRing::new(2);
    let nodes = six_vnodes(&ring);
    let a = &nodes[0];
    // fill the whole finger table of A
    for _ in 0..3 {
        a.fix_finger_table().await?;
    }
    // only the finger of 170 leads past 200 in one hop
    ring.kill(50);
    assert_eq!(ids(&a.find_successors(1, &id(200)).await?), vec![210]);
    Ok(())
}

#[tokio::test]
async fn test_lone_vnode_owns_every_key() -> Result<()> {
    let ring = TestRing::new(2);
    let a = ring.add(10);
    assert_eq!(ids(&a.find_successors(2, &id(100)).await?), vec![10]);
    assert_eq!(ids(&a.find_successors(1, &id(10)).await?), vec![10]);
    Ok(())
}

#[tokio::test]
async fn test_first_result_is_closest_to_key() -> Result<()> {
    let ring = TestRing::new(2);
    let nodes = six_vnodes(&ring);
    for node in &nodes {
        let succs = node.successors()?;
        for key in (0..=255u8).step_by(7) {
            let key = id(key);
            let found = node.find_successors(1, &key).await?;
            let first = distance(&key, &found[0].id, 8);
            for s in &succs {
                assert!(
                    first <= distance(&key, &s.id, 8),
                    "{} answered {} for {}, {} is closer",
                    node.vnode(),
                    found[0],
                    key,
                    s
                );
            }
        }
    }
    Ok(())
}
