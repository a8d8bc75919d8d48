#![cfg(test)]
//! Test-only helpers shared by the unit test modules.

use bytes::Bytes;
use proptest::{
    collection::vec,
    prelude::{Just, Strategy, any, prop_oneof},
    test_runner::{Config as ProptestConfig, RngAlgorithm, TestRng, TestRunner},
};

/// Proptest runner seeded with a fixed RNG so failures reproduce.
pub fn deterministic_runner(cases: u32) -> TestRunner {
    let config = ProptestConfig {
        cases,
        ..ProptestConfig::default()
    };
    let rng = TestRng::deterministic_rng(RngAlgorithm::ChaCha);
    TestRunner::new_with_rng(config, rng)
}

/// Payload lengths biased towards the empty and maximum cases.
pub fn boundary_length_strategy(max_len: usize) -> impl Strategy<Value = usize> {
    prop_oneof![
        Just(0usize),
        Just(1usize),
        Just(max_len.saturating_sub(1)),
        Just(max_len),
        0usize..=max_len,
    ]
}

/// Arbitrary payloads up to `max_len` bytes.
pub fn payload_strategy(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    boundary_length_strategy(max_len).prop_flat_map(|len| vec(any::<u8>(), len))
}

/// Split `wire` at every position in `cuts` (sorted, deduplicated, clamped).
pub fn split_at_cuts(wire: &Bytes, cuts: &[usize]) -> Vec<Bytes> {
    let mut points: Vec<usize> = cuts.iter().map(|&cut| cut.min(wire.len())).collect();
    points.sort_unstable();
    points.dedup();

    let mut chunks = Vec::with_capacity(points.len() + 1);
    let mut start = 0;
    for point in points {
        if point > start {
            chunks.push(wire.slice(start..point));
            start = point;
        }
    }
    if start < wire.len() {
        chunks.push(wire.slice(start..));
    }
    chunks
}

/// Deterministic permutation of `0..len` derived from `seed`.
pub fn shuffled_indices(len: usize, seed: u64) -> Vec<usize> {
    let mut order: Vec<usize> = (0..len).collect();
    let mut state = seed | 1;
    for i in (1..len).rev() {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        let bound = u64::try_from(i + 1).unwrap_or(u64::MAX);
        let j = usize::try_from(state % bound).unwrap_or(0);
        order.swap(i, j);
    }
    order
}
