use std::collections::HashMap;

use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshot};

/// Counter totals keyed by metric name, summed across label sets.
pub type CounterTotals = HashMap<String, u64>;

/// Run `f` with a fresh debugging recorder installed for this thread.
///
/// The recorder is snapshotted exactly once after `f` returns; taking a
/// snapshot resets its counters, so every counter is read from that single
/// snapshot.
pub fn with_recorder(f: impl FnOnce()) -> CounterTotals {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    metrics::with_local_recorder(&recorder, f);
    counter_totals(snapshotter.snapshot())
}

/// Sum every counter in `snapshot` by name.
#[must_use]
pub fn counter_totals(snapshot: Snapshot) -> CounterTotals {
    let mut totals = CounterTotals::new();
    for (key, _, _, value) in snapshot.into_vec() {
        if let DebugValue::Counter(count) = value {
            *totals.entry(key.key().name().to_owned()).or_default() += count;
        }
    }
    totals
}

/// Total recorded for counter `name`, or zero if it never fired.
#[must_use]
pub fn counter_total(totals: &CounterTotals, name: &str) -> u64 {
    totals.get(name).copied().unwrap_or_default()
}
