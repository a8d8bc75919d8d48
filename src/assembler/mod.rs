//! Reassembly of whole frames from arbitrarily split transport chunks.
//!
//! [`StreamFrameAssembler`] accepts byte chunks as the transport delivers them
//! and returns every frame those chunks complete. Frame boundaries come from a
//! caller-supplied [`FrameLength`] function, so the assembler serves SRMP
//! frames, typed envelopes or any other length-prefixed framing.
//!
//! When nothing is buffered, frames are sliced straight out of the incoming
//! chunk. Leftover bytes are copied into a cache and completed by later
//! chunks. Bytes that wait too long without completing a frame are treated as
//! garbage and dropped the next time data arrives.

use std::{
    fmt,
    sync::{Mutex, MutexGuard, PoisonError},
    time::Instant,
};

use bytes::{Bytes, BytesMut};

use crate::{
    codec,
    metrics::{self, AssemblyPath},
    registry::MessageKindRegistry,
};

mod config;

pub use config::{AssemblerConfig, DEFAULT_EXPIRE};

/// Computes the length of the frame at the start of a buffer.
///
/// Implementations return `0` while the buffer is too short to tell. A length
/// beyond the buffer also means "wait for more data". Lengths are trusted; no
/// content validation happens here.
pub trait FrameLength: Send + Sync {
    /// Length of the frame starting at `src[0]`, or `0` if unknown yet.
    fn frame_length(&self, src: &[u8]) -> usize;
}

impl<F> FrameLength for F
where
    F: Fn(&[u8]) -> usize + Send + Sync,
{
    fn frame_length(&self, src: &[u8]) -> usize { self(src) }
}

impl FrameLength for MessageKindRegistry {
    fn frame_length(&self, src: &[u8]) -> usize { MessageKindRegistry::frame_length(self, src) }
}

/// Frame length function for bare SRMP frames.
pub type SrmpFrameLength = fn(&[u8]) -> usize;

#[derive(Debug)]
struct Cache {
    buf: BytesMut,
    last_frame_at: Instant,
}

/// Splits a byte stream into complete frames.
///
/// All state lives behind one mutex that is held for the whole of each
/// [`feed`](Self::feed) call, so concurrent callers observe a single
/// sequential stream.
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use srmp::assembler::{AssemblerConfig, StreamFrameAssembler};
///
/// let assembler = StreamFrameAssembler::srmp(AssemblerConfig::default());
/// let wire = Bytes::from_static(&[0x01, 0x07, 0x04, 0x00, b'O', b'p', b'e', b'n']);
///
/// assert!(assembler.feed(wire.slice(..3)).is_empty());
/// let frames = assembler.feed(wire.slice(3..));
/// assert_eq!(frames, vec![wire]);
/// ```
pub struct StreamFrameAssembler<L = SrmpFrameLength> {
    frame_length: L,
    config: AssemblerConfig,
    cache: Mutex<Cache>,
}

impl StreamFrameAssembler<SrmpFrameLength> {
    /// Create an assembler for bare SRMP frames.
    #[must_use]
    pub fn srmp(config: AssemblerConfig) -> Self {
        Self::new(codec::peek_frame_length as SrmpFrameLength, config)
    }
}

impl<L: FrameLength> StreamFrameAssembler<L> {
    /// Create an assembler using `frame_length` to find frame boundaries.
    #[must_use]
    pub fn new(frame_length: L, config: AssemblerConfig) -> Self {
        Self {
            frame_length,
            config,
            cache: Mutex::new(Cache {
                buf: BytesMut::new(),
                last_frame_at: Instant::now(),
            }),
        }
    }

    /// Configuration in effect.
    #[must_use]
    pub const fn config(&self) -> &AssemblerConfig { &self.config }

    /// Feed newly received bytes using the current time.
    pub fn feed(&self, chunk: Bytes) -> Vec<Bytes> { self.feed_at(chunk, Instant::now()) }

    /// Feed newly received bytes, returning every frame they complete.
    ///
    /// `now` drives staleness eviction; passing it explicitly keeps tests
    /// deterministic. Frames are returned in stream order and share storage
    /// with `chunk` whenever nothing was buffered.
    pub fn feed_at(&self, chunk: Bytes, now: Instant) -> Vec<Bytes> {
        let mut frames = Vec::new();
        let mut cache = self.lock();

        let rest = if cache.buf.is_empty() {
            let rest = self.slice_direct(chunk, &mut frames);
            if !frames.is_empty() {
                cache.last_frame_at = now;
                metrics::inc_frames_assembled(AssemblyPath::Direct, frames.len() as u64);
            }
            rest
        } else {
            chunk
        };
        if rest.is_empty() {
            return frames;
        }

        self.evict_stale(&mut cache, now);
        if cache.buf.is_empty() {
            // Age of carried-over bytes is measured from when they arrive.
            cache.last_frame_at = now;
        }
        cache.buf.extend_from_slice(&rest);

        let direct = frames.len();
        self.drain_cache(&mut cache, &mut frames);
        let buffered = frames.len() - direct;
        if buffered > 0 {
            cache.last_frame_at = now;
            metrics::inc_frames_assembled(AssemblyPath::Buffered, buffered as u64);
        }
        frames
    }

    /// Bytes currently waiting for a frame to complete.
    #[must_use]
    pub fn buffered_len(&self) -> usize { self.lock().buf.len() }

    /// When the last frame was produced, or buffering last started.
    #[must_use]
    pub fn last_frame_at(&self) -> Instant { self.lock().last_frame_at }

    /// Drop all buffered bytes.
    pub fn clear(&self) { self.lock().buf = BytesMut::new(); }

    fn lock(&self) -> MutexGuard<'_, Cache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Full length of the frame at the start of `src`, if it is complete.
    fn complete_frame_len(&self, src: &[u8]) -> Option<usize> {
        match self.frame_length.frame_length(src) {
            0 => None,
            len => self
                .config
                .offset
                .checked_add(len)
                .filter(|&total| total <= src.len()),
        }
    }

    /// Slice complete frames off the front of `chunk`, returning the rest.
    fn slice_direct(&self, mut chunk: Bytes, frames: &mut Vec<Bytes>) -> Bytes {
        while let Some(len) = self.complete_frame_len(&chunk) {
            frames.push(chunk.split_to(len));
        }
        chunk
    }

    fn drain_cache(&self, cache: &mut Cache, frames: &mut Vec<Bytes>) {
        let mut ends = Vec::new();
        let mut cursor = 0;
        while let Some(len) = self.complete_frame_len(&cache.buf[cursor..]) {
            cursor += len;
            ends.push(cursor);
        }
        if cursor == 0 {
            return;
        }

        let consumed = if cursor == cache.buf.len() {
            std::mem::take(&mut cache.buf).freeze()
        } else {
            cache.buf.split_to(cursor).freeze()
        };
        let mut start = 0;
        for end in ends {
            frames.push(consumed.slice(start..end));
            start = end;
        }
    }

    fn evict_stale(&self, cache: &mut Cache, now: Instant) {
        if cache.buf.is_empty() {
            return;
        }
        let waited = now.saturating_duration_since(cache.last_frame_at);
        if waited <= self.config.expire {
            return;
        }
        if self
            .config
            .max_cache_bytes
            .is_some_and(|max| cache.buf.len() < max.get())
        {
            return;
        }

        let dropped = cache.buf.len();
        cache.buf = BytesMut::new();
        log::warn!("discarding {dropped} buffered bytes: no complete frame for {waited:?}");
        metrics::add_bytes_evicted(dropped as u64);
    }
}

impl<L> fmt::Debug for StreamFrameAssembler<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamFrameAssembler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
