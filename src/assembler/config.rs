//! Tuning knobs for [`StreamFrameAssembler`](super::StreamFrameAssembler).

use std::{num::NonZeroUsize, time::Duration};

/// Default time buffered bytes may wait for a frame to complete.
pub const DEFAULT_EXPIRE: Duration = Duration::from_millis(5000);

/// Configuration for a [`StreamFrameAssembler`](super::StreamFrameAssembler).
///
/// # Examples
///
/// ```
/// use std::{num::NonZeroUsize, time::Duration};
///
/// use srmp::assembler::AssemblerConfig;
///
/// let config = AssemblerConfig::default()
///     .expire(Duration::from_secs(1))
///     .max_cache_bytes(NonZeroUsize::new(4096));
///
/// assert_eq!(config.offset, 0);
/// assert_eq!(config.expire, Duration::from_secs(1));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AssemblerConfig {
    /// Bytes added to every computed frame length.
    ///
    /// For framings whose length field excludes some leading bytes that still
    /// belong to the frame.
    ///
    /// Default: 0.
    pub offset: usize,

    /// How long buffered bytes may go without a completed frame before they
    /// become eligible for eviction.
    ///
    /// Default: 5 seconds.
    pub expire: Duration,

    /// Buffered size that must also be reached before stale bytes are
    /// evicted. `None` evicts on age alone.
    ///
    /// Default: `None`.
    pub max_cache_bytes: Option<NonZeroUsize>,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            offset: 0,
            expire: DEFAULT_EXPIRE,
            max_cache_bytes: None,
        }
    }
}

impl AssemblerConfig {
    /// Set the constant added to every frame length.
    #[must_use]
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Set the staleness window.
    #[must_use]
    pub fn expire(mut self, expire: Duration) -> Self {
        self.expire = expire;
        self
    }

    /// Set the buffered size gating eviction.
    #[must_use]
    pub fn max_cache_bytes(mut self, max_cache_bytes: Option<NonZeroUsize>) -> Self {
        self.max_cache_bytes = max_cache_bytes;
        self
    }
}
