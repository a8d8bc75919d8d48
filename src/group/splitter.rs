//! Outbound helper that cuts payloads into chunk groups.
//!
//! Every encoded chunk body, header included, fits the caller's frame
//! budget. Chunk headers are varints, so their size depends on the chunk
//! count; the planner starts from an estimate and re-plans until the count
//! it writes matches the number of chunks it produced.

use std::num::NonZeroUsize;

use bytes::Bytes;

use super::{COUNT_SENTINEL_THRESHOLD, GroupError, GroupId, GroupIdGenerator, GroupMessage, message};

/// Splits payloads into [`GroupMessage`] chunks under a fixed frame budget.
///
/// # Examples
///
/// ```
/// use std::num::NonZeroUsize;
///
/// use bytes::Bytes;
/// use srmp::group::GroupSplitter;
///
/// let splitter = GroupSplitter::new(NonZeroUsize::new(16).expect("non-zero"));
/// let chunks = splitter
///     .split_next(&Bytes::from(vec![0_u8; 100]))
///     .expect("budget fits a header");
/// assert!(chunks.iter().all(|chunk| chunk.encoded_len() <= 16));
/// ```
#[derive(Debug)]
pub struct GroupSplitter {
    max_frame_size: NonZeroUsize,
    ids: GroupIdGenerator,
}

impl GroupSplitter {
    /// Create a splitter whose chunks never exceed `max_frame_size` bytes.
    #[must_use]
    pub const fn new(max_frame_size: NonZeroUsize) -> Self {
        Self::with_starting_id(max_frame_size, GroupId::new(0))
    }

    /// Create a splitter whose first group uses `start_at`.
    #[must_use]
    pub const fn with_starting_id(max_frame_size: NonZeroUsize, start_at: GroupId) -> Self {
        Self {
            max_frame_size,
            ids: GroupIdGenerator::starting_at(start_at),
        }
    }

    /// Frame budget applied to every chunk.
    #[must_use]
    pub const fn max_frame_size(&self) -> NonZeroUsize { self.max_frame_size }

    /// Reserve the next group identifier.
    pub fn next_group_id(&self) -> GroupId { self.ids.next_id() }

    /// Split `payload` under a caller-chosen group identifier.
    ///
    /// # Errors
    ///
    /// See [`split`].
    pub fn split(&self, payload: &Bytes, group_id: GroupId) -> Result<Vec<GroupMessage>, GroupError> {
        split(payload, self.max_frame_size.get(), group_id)
    }

    /// Split `payload` under a freshly generated group identifier.
    ///
    /// # Errors
    ///
    /// See [`split`].
    pub fn split_next(&self, payload: &Bytes) -> Result<Vec<GroupMessage>, GroupError> {
        split(payload, self.max_frame_size.get(), self.next_group_id())
    }
}

/// Split `payload` into chunks whose encoded bodies fit `max_frame_size`.
///
/// Chunk data slices share `payload`'s storage. An empty payload yields a
/// single empty chunk with count `1`.
///
/// # Errors
///
/// Returns [`GroupError::FrameTooSmall`] when the budget cannot hold a chunk
/// header plus one data byte, and [`GroupError::TooManyChunks`] when the
/// payload would need more than `u32::MAX` chunks.
pub fn split(
    payload: &Bytes,
    max_frame_size: usize,
    group_id: GroupId,
) -> Result<Vec<GroupMessage>, GroupError> {
    let sizes = plan(payload.len(), max_frame_size, group_id)?;
    let count = u32::try_from(sizes.len()).map_err(|_| GroupError::TooManyChunks { group_id })?;

    let mut chunks = Vec::with_capacity(sizes.len());
    let mut offset = 0;
    for (index, size) in (1..=count).zip(sizes) {
        let data = payload.slice(offset..offset + size);
        offset += size;
        chunks.push(GroupMessage::new(
            group_id,
            index,
            count_field(index, count),
            data,
        ));
    }
    Ok(chunks)
}

/// Count value written into chunk `index` of a `count`-chunk group.
const fn count_field(index: u32, count: u32) -> u32 {
    if count < COUNT_SENTINEL_THRESHOLD || index == 1 {
        count
    } else {
        0
    }
}

/// Data sizes for each chunk, iterated until the declared count is stable.
///
/// Header overhead never shrinks as the declared count grows, so the chunk
/// total is monotone in the estimate and the loop settles after a few
/// rounds.
fn plan(total: usize, max_frame_size: usize, group_id: GroupId) -> Result<Vec<usize>, GroupError> {
    let first = capacity(max_frame_size, group_id, 1, 1)?;
    let estimate = total.div_ceil(first).max(1);
    let mut count = u32::try_from(estimate).map_err(|_| GroupError::TooManyChunks { group_id })?;
    loop {
        let sizes = plan_with_count(total, max_frame_size, group_id, count)?;
        let planned =
            u32::try_from(sizes.len()).map_err(|_| GroupError::TooManyChunks { group_id })?;
        if planned == count {
            return Ok(sizes);
        }
        count = planned;
    }
}

fn plan_with_count(
    total: usize,
    max_frame_size: usize,
    group_id: GroupId,
    count: u32,
) -> Result<Vec<usize>, GroupError> {
    let mut sizes = Vec::with_capacity(count as usize);
    let mut remaining = total;
    let mut index = 1u32;
    loop {
        let room = capacity(max_frame_size, group_id, index, count_field(index, count))?;
        let take = remaining.min(room);
        sizes.push(take);
        remaining -= take;
        if remaining == 0 {
            return Ok(sizes);
        }
        index = index
            .checked_add(1)
            .ok_or(GroupError::TooManyChunks { group_id })?;
    }
}

/// Data bytes available to one chunk. The data length varint is sized for
/// the whole budget, which bounds every real length below it.
fn capacity(
    max_frame_size: usize,
    group_id: GroupId,
    index: u32,
    count: u32,
) -> Result<usize, GroupError> {
    let header_len = message::header_len(group_id, index, count, max_frame_size);
    max_frame_size
        .checked_sub(header_len)
        .filter(|&room| room > 0)
        .ok_or(GroupError::FrameTooSmall {
            max_frame_size,
            header_len,
        })
}
