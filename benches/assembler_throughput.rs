//! Criterion benchmarks for stream assembly and group splitting.
//!
//! Covers:
//! - whole-chunk delivery, where frames are sliced without copying,
//! - small-piece delivery, where every frame passes through the cache, and
//! - splitting and reassembling a large payload into chunk groups.

use std::{hint::black_box, num::NonZeroUsize};

use bytes::{Bytes, BytesMut};
use criterion::{BenchmarkId, Criterion, Throughput};
use srmp::{AssemblerConfig, DefaultMessage, GroupReassembler, GroupSplitter, StreamFrameAssembler};

const FRAMES_PER_STREAM: usize = 256;

fn stream(payload_len: usize) -> Bytes {
    let mut wire = BytesMut::new();
    for sequence in 0..FRAMES_PER_STREAM {
        let sequence = u8::try_from(sequence % 256).unwrap_or_default();
        if let Err(err) = DefaultMessage::new(vec![sequence; payload_len])
            .with_sequence(sequence)
            .encode(&mut wire)
        {
            panic!("benchmark stream setup failed: {err}");
        }
    }
    wire.freeze()
}

fn benchmark_feed(c: &mut Criterion) {
    let mut group = c.benchmark_group("assembler/feed");

    for payload_len in [16, 1_024, 70_000] {
        let wire = stream(payload_len);
        group.throughput(Throughput::Bytes(wire.len() as u64));
        for piece in [wire.len(), 1_500, 7] {
            let label = format!("{payload_len}b/{piece}");
            group.bench_function(BenchmarkId::from_parameter(label), |b| {
                b.iter(|| {
                    let assembler = StreamFrameAssembler::srmp(AssemblerConfig::default());
                    let mut frames = 0;
                    let mut start = 0;
                    while start < wire.len() {
                        let end = (start + piece).min(wire.len());
                        frames += assembler.feed(wire.slice(start..end)).len();
                        start = end;
                    }
                    black_box(frames)
                });
            });
        }
    }

    group.finish();
}

fn benchmark_groups(c: &mut Criterion) {
    let mut group = c.benchmark_group("group/round_trip");
    let payload: Bytes = (0..=u8::MAX).cycle().take(1 << 20).collect();
    group.throughput(Throughput::Bytes(payload.len() as u64));

    for max_frame_size in [512_usize, 16_384] {
        let Some(budget) = NonZeroUsize::new(max_frame_size) else {
            continue;
        };
        let splitter = GroupSplitter::new(budget);
        group.bench_function(BenchmarkId::from_parameter(max_frame_size), |b| {
            b.iter(|| {
                let chunks = match splitter.split_next(&payload) {
                    Ok(chunks) => chunks,
                    Err(err) => panic!("split failed: {err}"),
                };
                let mut reassembler = GroupReassembler::new();
                for chunk in chunks.into_iter().rev() {
                    if let Err(err) = reassembler.add(chunk) {
                        panic!("reassembly failed: {err}");
                    }
                }
                black_box(reassembler.payload().map(|payload| payload.len()))
            });
        });
    }

    group.finish();
}

/// Entrypoint for assembler and group benchmarks.
fn main() {
    let mut criterion = Criterion::default().configure_from_args();
    benchmark_feed(&mut criterion);
    benchmark_groups(&mut criterion);
    criterion.final_summary();
}
