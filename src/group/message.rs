//! One chunk of a split payload.
//!
//! A chunk body is four varints followed by the data:
//! `group_id | index | count | data_len | data`. Indices start at `1`.
//! `count` is the total number of chunks; groups of
//! [`COUNT_SENTINEL_THRESHOLD`](super::COUNT_SENTINEL_THRESHOLD) chunks or
//! more only carry it on chunk `1` and write `0` everywhere else.

use std::any::Any;

use bytes::{Bytes, BytesMut};

use super::GroupId;
use crate::{
    codec::{CodecError, FramingError},
    message::{Message, MessageKind},
    varint::{VarintPeek, peek_varint, put_varint, read_varint, varint_len},
};

/// A single chunk of a [`GroupId`]-tagged payload.
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use srmp::group::{GroupId, GroupMessage};
///
/// let chunk = GroupMessage::new(GroupId::new(5), 1, 2, Bytes::from_static(b"ab"));
/// let mut wire = bytes::BytesMut::new();
/// chunk.encode(&mut wire);
/// assert_eq!(wire.as_ref(), &[5, 1, 2, 2, b'a', b'b']);
/// assert_eq!(GroupMessage::decode_frame(&wire.freeze()).expect("decode"), chunk);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupMessage {
    group_id: GroupId,
    index: u32,
    count: u32,
    data: Bytes,
}

impl GroupMessage {
    /// Kind byte used inside the typed envelope.
    pub const KIND: MessageKind = MessageKind::new(0x02);

    /// Build a chunk. `count` may be `0` when the chunk does not carry it.
    #[must_use]
    pub fn new(group_id: GroupId, index: u32, count: u32, data: impl Into<Bytes>) -> Self {
        Self {
            group_id,
            index,
            count,
            data: data.into(),
        }
    }

    /// Group this chunk belongs to.
    #[must_use]
    pub const fn group_id(&self) -> GroupId { self.group_id }

    /// 1-based position within the group.
    #[must_use]
    pub const fn index(&self) -> u32 { self.index }

    /// Count field as carried on the wire; `0` means "not carried".
    #[must_use]
    pub const fn count(&self) -> u32 { self.count }

    /// The chunk's slice of the original payload.
    #[must_use]
    pub const fn data(&self) -> &Bytes { &self.data }

    /// Consume the chunk, returning its data.
    #[must_use]
    pub fn into_data(self) -> Bytes { self.data }

    /// Number of bytes [`encode`](Self::encode) writes.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        header_len(self.group_id, self.index, self.count, self.data.len()) + self.data.len()
    }

    /// Append the chunk body to `dst`.
    pub fn encode(&self, dst: &mut BytesMut) {
        dst.reserve(self.encoded_len());
        put_varint(dst, self.group_id.get());
        put_varint(dst, u64::from(self.index));
        put_varint(dst, u64::from(self.count));
        put_varint(dst, self.data.len() as u64);
        dst.extend_from_slice(&self.data);
    }

    /// Decode a chunk from the start of `frame` without copying its data.
    ///
    /// # Errors
    ///
    /// Returns [`FramingError::TruncatedHeader`] or
    /// [`FramingError::TruncatedPayload`] for short input, and
    /// [`FramingError::InvalidVarint`] when a field is malformed or `index`
    /// and `count` do not fit in 32 bits.
    pub fn decode_frame(frame: &Bytes) -> Result<Self, CodecError> {
        let mut offset = 0;
        let mut next_field = || -> Result<u64, FramingError> {
            let (value, used) = read_varint(&frame[offset..])?;
            offset += used;
            Ok(value)
        };
        let group_id = GroupId::new(next_field()?);
        let index = narrow(next_field()?)?;
        let count = narrow(next_field()?)?;
        let data_len = next_field()?;

        let available = frame.len() - offset;
        let data_len = usize::try_from(data_len)
            .ok()
            .filter(|&len| len <= available)
            .ok_or(FramingError::TruncatedPayload {
                declared: usize::try_from(data_len).unwrap_or(usize::MAX),
                available,
            })?;
        Ok(Self {
            group_id,
            index,
            count,
            data: frame.slice(offset..offset + data_len),
        })
    }

    /// Decode a chunk from the start of `src`, copying its data.
    ///
    /// # Errors
    ///
    /// See [`decode_frame`](Self::decode_frame).
    pub fn decode(src: &[u8]) -> Result<Self, CodecError> {
        Self::decode_frame(&Bytes::copy_from_slice(src))
    }
}

impl Message for GroupMessage {
    fn kind(&self) -> MessageKind { Self::KIND }

    fn is_reply(&self) -> bool { false }

    fn is_error(&self) -> bool { false }

    // A chunk never solicits a reply on its own; the reassembled payload may.
    fn is_one_way(&self) -> bool { true }

    fn payload(&self) -> &Bytes { &self.data }

    fn as_any(&self) -> &dyn Any { self }
}

/// Header bytes for a chunk with the given fields.
pub(crate) fn header_len(group_id: GroupId, index: u32, count: u32, data_len: usize) -> usize {
    varint_len(group_id.get())
        + varint_len(u64::from(index))
        + varint_len(u64::from(count))
        + varint_len(data_len as u64)
}

/// Total length of the chunk body starting at `src`, or `0` while the four
/// header varints are not all buffered.
///
/// A malformed varint also reports `0`; the stream assembler's eviction
/// eventually discards such input.
#[must_use]
pub fn peek_frame_length(src: &[u8]) -> usize {
    let mut offset = 0;
    let mut data_len = 0;
    for _ in 0..4 {
        match peek_varint(&src[offset..]) {
            Ok(VarintPeek::Complete(value, used)) => {
                offset += used;
                data_len = value;
            }
            Ok(VarintPeek::Incomplete) | Err(_) => return 0,
        }
    }
    usize::try_from(data_len).map_or(0, |len| offset.saturating_add(len))
}

fn narrow(value: u64) -> Result<u32, FramingError> {
    u32::try_from(value).map_err(|_| FramingError::InvalidVarint)
}
