#![cfg(feature = "metrics")]
//! Counters recorded by the assembler and group table.
//!
//! Uses `metrics_util::debugging::DebuggingRecorder` installed per thread.

use std::time::{Duration, Instant};

use bytes::Bytes;
use srmp::{
    AssemblerConfig,
    DefaultMessage,
    GroupId,
    GroupMessage,
    GroupTable,
    StreamFrameAssembler,
    metrics::{BYTES_EVICTED, FRAMES_ASSEMBLED, GROUPS_COMPLETED, GROUPS_EXPIRED},
};
use srmp_testing::{counter_total, encode_stream, with_recorder};

#[test]
fn assembled_frames_are_counted() {
    let wire = encode_stream(&[DefaultMessage::new("a"), DefaultMessage::new("b")]);
    let totals = with_recorder(|| {
        let assembler = StreamFrameAssembler::srmp(AssemblerConfig::default());
        assembler.feed(wire.slice(..7));
        assembler.feed(wire.slice(7..));
    });
    assert_eq!(counter_total(&totals, FRAMES_ASSEMBLED), 2);
}

#[test]
fn evicted_bytes_are_counted() {
    let totals = with_recorder(|| {
        let assembler = StreamFrameAssembler::srmp(AssemblerConfig::default());
        let start = Instant::now();
        assembler.feed_at(Bytes::from_static(&[0x01, 0x02, 0x03]), start);
        assembler.feed_at(Bytes::from_static(&[0x04]), start + Duration::from_secs(10));
    });
    assert_eq!(counter_total(&totals, BYTES_EVICTED), 3);
}

#[test]
fn group_outcomes_are_counted() {
    let totals = with_recorder(|| {
        let table = GroupTable::new();
        let start = Instant::now();
        table
            .add_at(GroupMessage::new(GroupId::new(1), 1, 1, Bytes::new()), start)
            .expect("complete group");
        table
            .add_at(GroupMessage::new(GroupId::new(2), 1, 2, Bytes::new()), start)
            .expect("partial group");
        table.purge_expired_at(start + Duration::from_secs(5), Duration::from_secs(1));
    });
    assert_eq!(counter_total(&totals, GROUPS_COMPLETED), 1);
    assert_eq!(counter_total(&totals, GROUPS_EXPIRED), 1);
}
