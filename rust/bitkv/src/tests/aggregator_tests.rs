use bitkv_common::error::ErrorKind;
use bitkv_store::Reply;

use super::memory_bitmap;
use crate::{AggregateOutput, BitOp, DEFAULT_SCRATCH_KEY, SessionState, Terminal};

#[tokio::test]
async fn test_chained_session_with_cleanup() {
    let (bitmap, store) = memory_bitmap();
    bitmap.set_bit("c", 0, true).await.unwrap();
    bitmap.set_bit("c", 9, true).await.unwrap();

    let mut agg = bitmap.aggregate_into("result");
    agg.set_bit("a", 0, true)
        .unwrap()
        .set_bit("a", 3, true)
        .unwrap()
        .set_bit("b", 3, true)
        .unwrap()
        .set_bit("b", 5, true)
        .unwrap()
        .bitop(BitOp::Or, &["a", "b"])
        .unwrap()
        .bitop(BitOp::Xor, &["c"])
        .unwrap()
        .cleanup()
        .unwrap();
    assert_eq!(agg.len(), 6);
    assert_eq!(agg.state(), SessionState::Open);

    let bits = agg.exec().await.unwrap().into_bits().unwrap();
    // (a | b) = {0, 3, 5}; xor c {0, 9} = {3, 5, 9}
    assert_eq!(bits.positions().collect::<Vec<_>>(), vec![3, 5, 9]);
    assert_eq!(bits.len(), 16);

    assert!(agg.is_finalized());
    assert!(!store.contains_key("result").await);
    assert!(store.contains_key("a").await);
    assert!(store.contains_key("b").await);
}

#[tokio::test]
async fn test_without_cleanup_destination_survives() {
    let (bitmap, store) = memory_bitmap();
    bitmap.set_bit("a", 1, true).await.unwrap();
    bitmap.set_bit("b", 2, true).await.unwrap();

    let mut agg = bitmap.aggregate();
    assert_eq!(agg.destination(), DEFAULT_SCRATCH_KEY);
    agg.bitop(BitOp::Or, &["a", "b"]).unwrap();
    let bits = agg.exec().await.unwrap().into_bits().unwrap();
    assert_eq!(bits.positions().collect::<Vec<_>>(), vec![1, 2]);

    assert!(store.contains_key(DEFAULT_SCRATCH_KEY).await);
    assert_eq!(bitmap.count(&[DEFAULT_SCRATCH_KEY]).await.unwrap(), 2);
}

#[tokio::test]
async fn test_count_session() {
    let (bitmap, store) = memory_bitmap();
    for offset in [0, 2, 4] {
        bitmap.set_bit("foo", offset, true).await.unwrap();
    }
    for offset in [1, 2, 7] {
        bitmap.set_bit("bar", offset, true).await.unwrap();
    }

    let mut agg = bitmap.aggregate();
    agg.bitop(BitOp::Xor, &["foo", "bar"])
        .unwrap()
        .count()
        .unwrap()
        .cleanup()
        .unwrap();
    assert_eq!(agg.terminal(), Some(Terminal::Count));
    assert_eq!(agg.exec().await.unwrap(), AggregateOutput::Count(4));
    assert!(!store.contains_key(DEFAULT_SCRATCH_KEY).await);
}

#[tokio::test]
async fn test_last_terminal_choice_wins() {
    let (bitmap, _) = memory_bitmap();
    bitmap.set_bit("a", 0, true).await.unwrap();
    bitmap.set_bit("b", 6, true).await.unwrap();

    // A count followed by a reduction reads back the vector.
    let mut agg = bitmap.aggregate();
    agg.bitop(BitOp::Or, &["a"])
        .unwrap()
        .count()
        .unwrap()
        .bitop(BitOp::Or, &["b"])
        .unwrap()
        .cleanup()
        .unwrap();
    assert_eq!(agg.terminal(), Some(Terminal::Get));
    let bits = agg.exec().await.unwrap().into_bits().unwrap();
    assert_eq!(bits.positions().collect::<Vec<_>>(), vec![0, 6]);

    // A reduction followed by a count reads back the count.
    let mut agg = bitmap.aggregate();
    agg.bitop(BitOp::Or, &["a", "b"])
        .unwrap()
        .count()
        .unwrap()
        .cleanup()
        .unwrap();
    assert_eq!(agg.exec().await.unwrap().into_count().unwrap(), 2);

    // Of two reductions, the later one determines the vector.
    let mut agg = bitmap.aggregate();
    agg.bitop(BitOp::Or, &["a", "b"])
        .unwrap()
        .bitop(BitOp::And, &["a"])
        .unwrap()
        .cleanup()
        .unwrap();
    let bits = agg.exec().await.unwrap().into_bits().unwrap();
    assert_eq!(bits.positions().collect::<Vec<_>>(), vec![0]);
}

#[tokio::test]
async fn test_not_on_current_operand() {
    let (bitmap, _) = memory_bitmap();
    bitmap.set_bit("a", 0, true).await.unwrap();
    bitmap.set_bit("b", 1, true).await.unwrap();

    let mut agg = bitmap.aggregate();
    agg.bitop(BitOp::Or, &["a", "b"])
        .unwrap()
        .bitop(BitOp::Not, &[])
        .unwrap()
        .cleanup()
        .unwrap();
    let bits = agg.exec().await.unwrap().into_bits().unwrap();
    assert_eq!(bits.positions().collect::<Vec<_>>(), vec![2, 3, 4, 5, 6, 7]);

    let mut agg = bitmap.aggregate();
    agg.bitop(BitOp::Or, &["a"]).unwrap();
    let err = agg.bitop(BitOp::Not, &["b"]).err().unwrap();
    assert!(err.is_caller_error());
    let err = agg.bitop(BitOp::Xor, &[]).err();
    assert!(err.is_none(), "xor against the current operand alone is allowed");

    let mut fresh = bitmap.aggregate();
    assert!(fresh.bitop(BitOp::Not, &[]).is_err());
    assert!(fresh.bitop(BitOp::And, &[]).is_err());
    assert!(fresh.is_empty());
}

#[tokio::test]
async fn test_no_terminal_returns_raw_replies() {
    let (bitmap, store) = memory_bitmap();
    let mut agg = bitmap.aggregate();
    agg.set_bit("k", 2, true)
        .unwrap()
        .set_bit("k", 2, true)
        .unwrap()
        .delete(&["k"])
        .unwrap();
    let output = agg.exec().await.unwrap();
    assert_eq!(
        output,
        AggregateOutput::Replies(vec![
            Reply::Integer(0),
            Reply::Integer(1),
            Reply::Integer(1)
        ])
    );
    assert!(output.into_bits().is_err());
    assert!(!store.contains_key("k").await);
}

#[tokio::test]
async fn test_use_after_exec_is_rejected() {
    let (bitmap, store) = memory_bitmap();
    let mut agg = bitmap.aggregate();
    agg.set_bit("k", 1, true).unwrap();
    agg.exec().await.unwrap();
    assert_eq!(agg.state(), SessionState::Finalized);

    let err = agg.set_bit("k", 2, true).err().unwrap();
    assert!(matches!(err.kind(), ErrorKind::InvalidOperation { .. }));
    let err = agg.bitop(BitOp::Or, &["k"]).err().unwrap();
    assert!(matches!(err.kind(), ErrorKind::InvalidOperation { .. }));
    assert!(agg.count().is_err());
    assert!(agg.cleanup().is_err());
    let err = agg.exec().await.unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidOperation { .. }));
    assert!(err.is_caller_error());

    // Nothing past the first exec reached the store.
    assert_eq!(bitmap.get("k").await.unwrap().positions().collect::<Vec<_>>(), vec![1]);
    assert_eq!(store.keys().await, vec!["k".to_string()]);
}

#[tokio::test]
async fn test_failed_transaction_leaves_no_state() {
    let (bitmap, store) = memory_bitmap();
    let mut agg = bitmap.aggregate_into("dest");
    agg.set_bit("a", 1, true)
        .unwrap()
        .bitop(BitOp::Or, &["a"])
        .unwrap()
        .set_bit("a", u64::MAX, true)
        .unwrap()
        .cleanup()
        .unwrap();
    let err = agg.exec().await.unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::CommandRejected { .. }));
    assert!(agg.is_finalized());
    assert!(store.keys().await.is_empty());
}
