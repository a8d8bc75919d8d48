//! Errors raised while splitting or reassembling chunk groups.

use thiserror::Error;

use super::GroupId;
use crate::codec::CodecError;

/// Errors produced by the group splitter and reassemblers.
#[derive(Debug, Error)]
pub enum GroupError {
    /// A chunk belongs to a different group than the reassembler tracks.
    #[error("group identity mismatch: expected {expected}, found {found}")]
    GroupIdentityMismatch {
        /// Group established by the first chunk.
        expected: GroupId,
        /// Group carried by the rejected chunk.
        found: GroupId,
    },

    /// The payload was requested before every chunk arrived.
    #[error("group {group_id} incomplete: {received} chunks received")]
    IncompleteGroup {
        /// Group being reassembled.
        group_id: GroupId,
        /// Distinct chunks held so far.
        received: usize,
        /// Chunk count, once the first chunk has announced it.
        expected: Option<u32>,
    },

    /// A chunk index is zero or beyond the group's count.
    #[error("chunk index {index} out of range for group {group_id}")]
    IndexOutOfRange {
        /// Group the chunk claims to belong to.
        group_id: GroupId,
        /// Offending index.
        index: u32,
        /// Known chunk count, if any.
        count: Option<u32>,
    },

    /// The frame budget cannot hold a chunk header plus one data byte.
    #[error("frame size {max_frame_size} cannot hold a {header_len} byte chunk header and data")]
    FrameTooSmall {
        /// Requested frame budget.
        max_frame_size: usize,
        /// Header bytes required for the chunk that did not fit.
        header_len: usize,
    },

    /// The payload needs more chunks than a `u32` index can address.
    #[error("payload for group {group_id} needs more than u32::MAX chunks")]
    TooManyChunks {
        /// Group being split.
        group_id: GroupId,
    },

    /// A chunk frame could not be decoded.
    #[error(transparent)]
    Codec(#[from] CodecError),
}
