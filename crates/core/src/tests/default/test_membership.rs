use crate::error::Error;
use crate::error::Result;
use crate::tests::default::ids;
use crate::tests::default::set_predecessor;
use crate::tests::default::vn;
use crate::tests::default::TestRing;

#[tokio::test]
async fn test_notify_without_predecessor_adopts_candidate() -> Result<()> {
    let ring = TestRing::new(2);
    let a = ring.add(10);
    a.set_successors(&[vn(20), vn(30)])?;

    let succs = a.handle_notify(vn(5)).await?;
    assert_eq!(ids(&succs), vec![20, 30]);
    assert_eq!(ids(&a.successors()?), vec![20, 30]);
    assert_eq!(a.predecessor()?, Some(vn(5)));

    ring.flush().await;
    assert_eq!(ring.delegate.take(), vec!["0a new_predecessor 05 old "]);
    Ok(())
}

#[tokio::test]
async fn test_notify_keeps_live_closer_predecessor() -> Result<()> {
    let ring = TestRing::new(2);
    let a = ring.add(10);
    let _p = ring.add(5);
    set_predecessor(&a, Some(5));

    // 3 is not between 5 and 10
    a.handle_notify(vn(3)).await?;
    assert_eq!(a.predecessor()?, Some(vn(5)));

    // 7 is
    a.handle_notify(vn(7)).await?;
    assert_eq!(a.predecessor()?, Some(vn(7)));

    ring.flush().await;
    assert_eq!(ring.delegate.take(), vec!["0a new_predecessor 07 old 05"]);
    Ok(())
}

#[tokio::test]
async fn test_notify_replaces_dead_predecessor() -> Result<()> {
    let ring = TestRing::new(2);
    let a = ring.add(10);
    let _p = ring.add(5);
    set_predecessor(&a, Some(5));
    ring.kill(5);

    a.handle_notify(vn(3)).await?;
    assert_eq!(a.predecessor()?, Some(vn(3)));
    Ok(())
}

#[tokio::test]
async fn test_notify_seeds_empty_successor_list() -> Result<()> {
    let ring = TestRing::new(2);
    let a = ring.add(10);
    assert!(!a.is_joined()?);

    let succs = a.handle_notify(vn(30)).await?;
    assert_eq!(ids(&succs), vec![30]);
    assert_eq!(a.predecessor()?, Some(vn(30)));
    assert!(a.is_joined()?);
    Ok(())
}

#[tokio::test]
async fn test_leave_informs_neighbours() -> Result<()> {
    let ring = TestRing::new(2);
    let a = ring.add(10);
    let b = ring.add(20);
    let c = ring.add(30);
    a.set_successors(&[vn(20), vn(30)])?;
    b.set_successors(&[vn(30), vn(10)])?;
    c.set_successors(&[vn(10), vn(20)])?;
    set_predecessor(&a, Some(30));
    set_predecessor(&b, Some(10));
    set_predecessor(&c, Some(20));

    b.leave().await?;
    assert_eq!(ids(&a.successors()?), vec![30]);
    assert_eq!(c.predecessor()?, None);

    ring.flush().await;
    assert_eq!(
        ring.delegate.take(),
        vec![
            "14 leaving",
            "0a successor_leaving 14",
            "1e predecessor_leaving 14"
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_leave_merges_errors() {
    let ring = TestRing::new(2);
    let b = ring.add(20);
    b.set_successors(&[vn(30)]).unwrap();
    set_predecessor(&b, Some(10));

    match b.leave().await {
        Err(Error::Merged(errors)) => {
            assert_eq!(errors.len(), 2);
            assert!(errors
                .iter()
                .all(|e| matches!(e, Error::PeerUnreachable(_))));
        }
        ret => panic!("unexpected result {:?}", ret),
    }
}

#[tokio::test]
async fn test_clear_and_skip_match_identity() -> Result<()> {
    let ring = TestRing::new(3);
    let a = ring.add(10);
    a.set_successors(&[vn(20), vn(30)])?;
    set_predecessor(&a, Some(5));

    a.handle_clear_predecessor(&vn(6))?;
    assert_eq!(a.predecessor()?, Some(vn(5)));
    a.handle_clear_predecessor(&vn(5))?;
    assert_eq!(a.predecessor()?, None);

    a.handle_skip_successor(&vn(30))?;
    assert_eq!(ids(&a.successors()?), vec![20, 30]);
    a.handle_skip_successor(&vn(20))?;
    assert_eq!(ids(&a.successors()?), vec![30]);
    assert_eq!(a.lock_state()?.successors.slots()[1], None);
    Ok(())
}
