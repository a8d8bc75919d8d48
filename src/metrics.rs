//! Metric helpers for `srmp`.
//!
//! Names and thin wrappers around the [`metrics`](https://docs.rs/metrics)
//! macros. With the `metrics` feature disabled every helper is a no-op.

#[cfg(feature = "metrics")]
use metrics::counter;

/// Counter of frames emitted by stream assemblers.
pub const FRAMES_ASSEMBLED: &str = "srmp_frames_assembled_total";
/// Counter of buffered bytes discarded by assembler eviction.
pub const BYTES_EVICTED: &str = "srmp_bytes_evicted_total";
/// Counter of chunk groups fully reassembled.
pub const GROUPS_COMPLETED: &str = "srmp_groups_completed_total";
/// Counter of partial chunk groups purged after their time-to-live.
pub const GROUPS_EXPIRED: &str = "srmp_groups_expired_total";
/// Counter of frames that failed to decode, labelled by error type.
pub const DECODE_ERRORS: &str = "srmp_decode_errors_total";

/// Which branch of the assembler produced a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssemblyPath {
    /// Sliced straight out of an incoming chunk.
    Direct,
    /// Completed from bytes carried over in the cache.
    Buffered,
}

impl AssemblyPath {
    /// Label value recorded for this path.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            AssemblyPath::Direct => "direct",
            AssemblyPath::Buffered => "buffered",
        }
    }
}

/// Record `frames` frames emitted on `path`.
pub fn inc_frames_assembled(path: AssemblyPath, frames: u64) {
    #[cfg(feature = "metrics")]
    counter!(FRAMES_ASSEMBLED, "path" => path.as_str()).increment(frames);
    #[cfg(not(feature = "metrics"))]
    let _ = (path, frames);
}

/// Record `bytes` discarded by eviction.
pub fn add_bytes_evicted(bytes: u64) {
    #[cfg(feature = "metrics")]
    counter!(BYTES_EVICTED).increment(bytes);
    #[cfg(not(feature = "metrics"))]
    let _ = bytes;
}

/// Record a completed chunk group.
pub fn inc_groups_completed() {
    #[cfg(feature = "metrics")]
    counter!(GROUPS_COMPLETED).increment(1);
}

/// Record `groups` partial groups purged.
pub fn add_groups_expired(groups: u64) {
    #[cfg(feature = "metrics")]
    counter!(GROUPS_EXPIRED).increment(groups);
    #[cfg(not(feature = "metrics"))]
    let _ = groups;
}

/// Record a decode failure of the given type.
pub fn inc_decode_errors(error_type: &'static str) {
    #[cfg(feature = "metrics")]
    counter!(DECODE_ERRORS, "error_type" => error_type).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = error_type;
}
