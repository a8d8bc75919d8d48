//! Unit tests for chunk splitting and reassembly.

use std::time::{Duration, Instant};

use bytes::Bytes;
use proptest::{prop_assert, prop_assert_eq, test_runner::TestCaseError};
use rstest::rstest;

use super::*;
use crate::test_helpers::{deterministic_runner, payload_strategy, shuffled_indices};

fn payload(len: usize) -> Bytes { (0..=u8::MAX).cycle().take(len).collect() }

fn reassemble(chunks: impl IntoIterator<Item = GroupMessage>) -> Bytes {
    let mut reassembler = GroupReassembler::new();
    for chunk in chunks {
        reassembler.add(chunk).expect("chunk should be accepted");
    }
    reassembler.payload().expect("group should be complete")
}

#[test]
fn empty_payload_yields_one_empty_chunk() {
    let chunks = split(&Bytes::new(), 16, GroupId::new(3)).expect("split");
    assert_eq!(chunks, vec![GroupMessage::new(GroupId::new(3), 1, 1, Bytes::new())]);
    assert!(reassemble(chunks).is_empty());
}

#[test]
fn small_payload_fits_one_chunk() {
    let data = payload(10);
    let chunks = split(&data, 64, GroupId::new(1)).expect("split");
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].index(), 1);
    assert_eq!(chunks[0].count(), 1);
    assert_eq!(chunks[0].data(), &data);
}

#[rstest]
#[case::tiny_budget(8, 1_000)]
#[case::odd_budget(37, 4_321)]
#[case::large_group(9, 5_000)]
#[case::varint_boundary(130, 70_000)]
fn chunks_respect_frame_budget(#[case] max_frame_size: usize, #[case] len: usize) {
    let data = payload(len);
    let chunks = split(&data, max_frame_size, GroupId::new(300)).expect("split");
    for chunk in &chunks {
        assert!(
            chunk.encoded_len() <= max_frame_size,
            "chunk {} is {} bytes",
            chunk.index(),
            chunk.encoded_len()
        );
    }
    assert_eq!(reassemble(chunks), data);
}

/// Feed chunks 2..=n in reverse, then chunk 1, checking completion happens
/// only on the last add.
fn assert_completes_on_first_chunk(chunks: Vec<GroupMessage>, data: &Bytes) {
    let mut chunks = chunks.into_iter();
    let first = chunks.next().expect("group has a first chunk");
    let mut reassembler = GroupReassembler::new();
    for chunk in chunks.rev() {
        let index = chunk.index();
        assert!(
            !reassembler.add(chunk).expect("chunk should be accepted"),
            "group completed early at index {index}"
        );
    }
    assert!(!reassembler.is_complete());
    assert!(reassembler.add(first).expect("first chunk should be accepted"));
    assert!(reassembler.is_complete());
    assert_eq!(&reassembler.payload().expect("complete group"), data);
}

#[test]
fn groups_below_threshold_carry_count_on_every_chunk() {
    let data = payload(127 * 4);
    let chunks = split(&data, 8, GroupId::new(1)).expect("split");
    assert_eq!(chunks.len(), 127);
    assert!(chunks.iter().all(|chunk| chunk.count() == 127));
    assert_completes_on_first_chunk(chunks, &data);
}

#[test]
fn groups_at_threshold_carry_count_on_first_chunk_only() {
    // The two-byte count on chunk 1 and index 128 each cost one data byte.
    let data = payload(128 * 4 - 2);
    let chunks = split(&data, 8, GroupId::new(1)).expect("split");
    assert_eq!(chunks.len(), 128);
    assert_eq!(chunks[0].count(), 128);
    assert!(chunks[1..].iter().all(|chunk| chunk.count() == 0));
    assert_eq!(reassemble(chunks.clone()), data);
    assert_completes_on_first_chunk(chunks, &data);
}

#[test]
fn declared_count_matches_chunks_produced() {
    for len in [500, 508, 512, 516, 520, 1_000] {
        let chunks = split(&payload(len), 8, GroupId::new(1)).expect("split");
        let count = u32::try_from(chunks.len()).expect("count fits u32");
        assert_eq!(chunks[0].count(), count, "payload of {len} bytes");
    }
}

#[rstest]
#[case::zero(0)]
#[case::below_header(4)]
fn budget_too_small_for_header_is_rejected(#[case] max_frame_size: usize) {
    let err = split(&payload(10), max_frame_size, GroupId::new(1)).expect_err("must fail");
    assert!(matches!(err, GroupError::FrameTooSmall { .. }));
}

#[test]
fn reverse_and_shuffled_orders_reassemble() {
    let data = payload(3_000);
    let chunks = split(&data, 50, GroupId::new(77)).expect("split");
    assert_eq!(reassemble(chunks.iter().rev().cloned()), data);

    for seed in [1, 7, 99] {
        let order = shuffled_indices(chunks.len(), seed);
        assert_eq!(reassemble(order.into_iter().map(|i| chunks[i].clone())), data);
    }
}

#[test]
fn duplicate_chunks_are_ignored() {
    let data = payload(200);
    let chunks = split(&data, 40, GroupId::new(2)).expect("split");
    let mut reassembler = GroupReassembler::new();
    reassembler.add(chunks[1].clone()).expect("add");
    reassembler.add(chunks[1].clone()).expect("duplicate accepted");
    assert_eq!(reassembler.received(), 1);
    for chunk in chunks {
        reassembler.add(chunk).expect("add");
    }
    assert_eq!(reassembler.payload().expect("complete"), data);
}

#[test]
fn chunk_from_other_group_is_rejected() {
    let mut reassembler = GroupReassembler::new();
    reassembler
        .add(GroupMessage::new(GroupId::new(1), 1, 2, Bytes::new()))
        .expect("first chunk");
    let err = reassembler
        .add(GroupMessage::new(GroupId::new(2), 2, 2, Bytes::new()))
        .expect_err("mismatched group");
    assert!(matches!(
        err,
        GroupError::GroupIdentityMismatch { expected, found }
            if expected == GroupId::new(1) && found == GroupId::new(2)
    ));
    assert_eq!(reassembler.received(), 1);
}

#[rstest]
#[case::zero_index(GroupMessage::new(GroupId::new(1), 0, 2, Bytes::new()))]
#[case::beyond_count(GroupMessage::new(GroupId::new(1), 3, 2, Bytes::new()))]
fn invalid_indices_are_rejected(#[case] chunk: GroupMessage) {
    let mut reassembler = GroupReassembler::new();
    reassembler
        .add(GroupMessage::new(GroupId::new(1), 1, 2, Bytes::new()))
        .expect("first chunk");
    assert!(matches!(
        reassembler.add(chunk),
        Err(GroupError::IndexOutOfRange { .. })
    ));
}

#[test]
fn payload_before_completion_is_incomplete() {
    let mut reassembler = GroupReassembler::new();
    reassembler
        .add(GroupMessage::new(GroupId::new(4), 2, 0, Bytes::from_static(b"x")))
        .expect("add");
    assert!(!reassembler.is_complete());
    assert_eq!(reassembler.count(), None);
    assert!(matches!(
        reassembler.payload(),
        Err(GroupError::IncompleteGroup {
            received: 1,
            expected: None,
            ..
        })
    ));
}

#[test]
fn chunk_body_decodes_zero_copy() {
    let chunk = GroupMessage::new(GroupId::new(300), 2, 5, payload(20));
    let mut wire = bytes::BytesMut::new();
    chunk.encode(&mut wire);
    let wire = wire.freeze();

    assert_eq!(message::peek_frame_length(&wire), wire.len());
    assert_eq!(message::peek_frame_length(&wire[..3]), 0);
    let decoded = GroupMessage::decode_frame(&wire).expect("decode");
    assert_eq!(decoded, chunk);
    assert_eq!(decoded.data().as_ptr(), wire[wire.len() - 20..].as_ptr());
}

#[test]
fn table_interleaves_groups() {
    let table = GroupTable::new();
    let a = split(&payload(100), 20, GroupId::new(1)).expect("split");
    let b = split(&payload(60), 20, GroupId::new(2)).expect("split");

    let mut completed = Vec::new();
    let mut b_iter = b.into_iter();
    for chunk in a {
        completed.extend(table.add(chunk).expect("add"));
        if let Some(chunk) = b_iter.next() {
            completed.extend(table.add(chunk).expect("add"));
        }
    }
    for chunk in b_iter {
        completed.extend(table.add(chunk).expect("add"));
    }

    let ids: Vec<_> = completed.iter().map(ReassembledGroup::group_id).collect();
    assert_eq!(ids, vec![GroupId::new(2), GroupId::new(1)]);
    assert_eq!(completed[1].payload(), &payload(100));
    assert_eq!(table.pending(), 0);
}

#[test]
fn table_purges_stale_groups() {
    let table = GroupTable::new();
    let start = Instant::now();
    let chunks = split(&payload(100), 20, GroupId::new(9)).expect("split");
    table.add_at(chunks[0].clone(), start).expect("add");

    assert!(table.purge_expired_at(start, Duration::from_secs(1)).is_empty());
    let purged = table.purge_expired_at(start + Duration::from_secs(2), Duration::from_secs(1));
    assert_eq!(purged, vec![GroupId::new(9)]);
    assert_eq!(table.pending(), 0);
}

#[test]
fn table_ignores_chunks_of_completed_groups() {
    let table = GroupTable::new();
    let start = Instant::now();
    let single = GroupMessage::new(GroupId::new(7), 1, 1, Bytes::from_static(b"once"));
    assert!(table.add_at(single.clone(), start).expect("add").is_some());
    assert_eq!(table.add_at(single, start).expect("add"), None);

    let chunks = split(&payload(60), 20, GroupId::new(8)).expect("split");
    let mut completed = Vec::new();
    for chunk in &chunks {
        completed.extend(table.add_at(chunk.clone(), start).expect("add"));
    }
    assert_eq!(completed.len(), 1);
    assert_eq!(table.add_at(chunks[1].clone(), start).expect("add"), None);
    assert_eq!(table.pending(), 0);
}

#[test]
fn completed_group_ids_age_out() {
    let table = GroupTable::new();
    let start = Instant::now();
    let chunk = GroupMessage::new(GroupId::new(7), 1, 1, Bytes::from_static(b"again"));
    assert!(table.add_at(chunk.clone(), start).expect("add").is_some());

    let later = start + Duration::from_secs(2);
    assert!(table.purge_expired_at(later, Duration::from_secs(1)).is_empty());
    assert!(table.add_at(chunk, later).expect("add").is_some());
}

#[test]
fn table_drops_group_on_invalid_chunk() {
    let table = GroupTable::new();
    table
        .add(GroupMessage::new(GroupId::new(5), 1, 2, Bytes::new()))
        .expect("add");
    assert!(table.add(GroupMessage::new(GroupId::new(5), 0, 2, Bytes::new())).is_err());
    assert_eq!(table.pending(), 0);
}

#[test]
fn splitter_assigns_fresh_ids() {
    let splitter = GroupSplitter::with_starting_id(
        std::num::NonZeroUsize::new(32).expect("non-zero"),
        GroupId::new(10),
    );
    let first = splitter.split_next(&payload(5)).expect("split");
    let second = splitter.split_next(&payload(5)).expect("split");
    assert_eq!(first[0].group_id(), GroupId::new(10));
    assert_eq!(second[0].group_id(), GroupId::new(11));
}

#[test]
fn generated_payloads_split_and_reassemble() {
    let mut runner = deterministic_runner(64);
    let strategy = (payload_strategy(2_048), 10usize..200, 0u64..10_000);
    runner
        .run(&strategy, |(data, max_frame_size, seed)| {
            let data = Bytes::from(data);
            let chunks = split(&data, max_frame_size, GroupId::new(seed))
                .map_err(|err| TestCaseError::fail(format!("split failed: {err}")))?;
            for chunk in &chunks {
                prop_assert!(chunk.encoded_len() <= max_frame_size);
            }
            let order = shuffled_indices(chunks.len(), seed);
            let mut reassembler = GroupReassembler::new();
            for i in order {
                reassembler
                    .add(chunks[i].clone())
                    .map_err(|err| TestCaseError::fail(format!("add failed: {err}")))?;
            }
            let rebuilt = reassembler
                .payload()
                .map_err(|err| TestCaseError::fail(format!("incomplete: {err}")))?;
            prop_assert_eq!(rebuilt, data);
            Ok(())
        })
        .expect("generated payloads should survive splitting");
}
