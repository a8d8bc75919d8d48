//! Optional envelope header with independently togglable fields.
//!
//! The header starts with a flags byte; each set bit announces one field
//! that follows in a fixed order. `use_header` is never stored on its own: it
//! is derived from the other fields every time one of them changes, so the
//! flags byte is always a pure function of the field values.

use bytes::{Buf, BufMut};

use crate::{
    byte_order::{peek_wire_u32, write_wire_u32},
    codec::FramingError,
    varint::{put_varint, read_varint, varint_len},
};

const USE_HEADER: u8 = 0x01;
const HAS_CHANNEL: u8 = 0x02;
const HAS_SESSION: u8 = 0x04;
const HAS_LENGTH: u8 = 0x08;

/// Optional channel, session and length fields preceding a payload.
///
/// # Examples
///
/// ```
/// use srmp::message::MessageHeader;
///
/// let header = MessageHeader::default().with_channel(3);
/// assert!(header.use_header());
/// assert_eq!(header.flags(), 0x03);
///
/// let cleared = header.without_channel();
/// assert!(!cleared.use_header());
/// assert_eq!(cleared.flags(), 0x00);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MessageHeader {
    channel: Option<u8>,
    session_id: Option<u32>,
    length: Option<u64>,
}

impl MessageHeader {
    /// Return a copy with the channel set.
    #[must_use]
    pub const fn with_channel(mut self, channel: u8) -> Self {
        self.channel = Some(channel);
        self
    }

    /// Return a copy with the channel cleared.
    #[must_use]
    pub const fn without_channel(mut self) -> Self {
        self.channel = None;
        self
    }

    /// Return a copy with the session identifier set.
    #[must_use]
    pub const fn with_session_id(mut self, session_id: u32) -> Self {
        self.session_id = Some(session_id);
        self
    }

    /// Return a copy with the session identifier cleared.
    #[must_use]
    pub const fn without_session_id(mut self) -> Self {
        self.session_id = None;
        self
    }

    /// Return a copy with the length set.
    #[must_use]
    pub const fn with_length(mut self, length: u64) -> Self {
        self.length = Some(length);
        self
    }

    /// Return a copy with the length cleared.
    #[must_use]
    pub const fn without_length(mut self) -> Self {
        self.length = None;
        self
    }

    /// Channel byte, if present.
    #[must_use]
    pub const fn channel(&self) -> Option<u8> { self.channel }

    /// Session identifier, if present.
    #[must_use]
    pub const fn session_id(&self) -> Option<u32> { self.session_id }

    /// Length field, if present.
    #[must_use]
    pub const fn length(&self) -> Option<u64> { self.length }

    /// Whether any field is present.
    #[must_use]
    pub const fn use_header(&self) -> bool {
        self.channel.is_some() || self.session_id.is_some() || self.length.is_some()
    }

    /// Flags byte derived from the present fields.
    #[must_use]
    pub const fn flags(&self) -> u8 {
        let mut flags = 0;
        if self.channel.is_some() {
            flags |= HAS_CHANNEL;
        }
        if self.session_id.is_some() {
            flags |= HAS_SESSION;
        }
        if self.length.is_some() {
            flags |= HAS_LENGTH;
        }
        if flags != 0 {
            flags |= USE_HEADER;
        }
        flags
    }

    /// Number of bytes [`encode`](Self::encode) writes.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        let channel = usize::from(self.channel.is_some());
        let session = self.session_id.map_or(0, |_| 4);
        1 + channel + session + self.length.map_or(0, varint_len)
    }

    /// Append the flags byte followed by the present fields.
    pub fn encode(&self, dst: &mut impl BufMut) {
        dst.put_u8(self.flags());
        if let Some(channel) = self.channel {
            dst.put_u8(channel);
        }
        if let Some(session_id) = self.session_id {
            dst.put_slice(&write_wire_u32(session_id));
        }
        if let Some(length) = self.length {
            put_varint(dst, length);
        }
    }

    /// Parse a header from the start of `src`, returning it with the number
    /// of bytes consumed.
    ///
    /// Flag bits outside the four defined ones are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`FramingError::TruncatedHeader`] when a flagged field is
    /// missing, or [`FramingError::InvalidVarint`] for a malformed length.
    pub fn decode(src: &[u8]) -> Result<(Self, usize), FramingError> {
        let mut cursor = src;
        let truncated = |need: usize| FramingError::TruncatedHeader {
            have: src.len(),
            need,
        };

        if !cursor.has_remaining() {
            return Err(truncated(1));
        }
        let flags = cursor.get_u8();
        let mut header = Self::default();

        if flags & HAS_CHANNEL != 0 {
            if !cursor.has_remaining() {
                return Err(truncated(src.len() + 1));
            }
            header.channel = Some(cursor.get_u8());
        }
        if flags & HAS_SESSION != 0 {
            let session_id =
                peek_wire_u32(cursor, 0).ok_or_else(|| truncated(src.len() - cursor.len() + 4))?;
            cursor.advance(4);
            header.session_id = Some(session_id);
        }
        if flags & HAS_LENGTH != 0 {
            let (length, used) = read_varint(cursor)?;
            cursor.advance(used);
            header.length = Some(length);
        }

        Ok((header, src.len() - cursor.len()))
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::empty(MessageHeader::default(), 0x00)]
    #[case::channel(MessageHeader::default().with_channel(1), 0x03)]
    #[case::session(MessageHeader::default().with_session_id(7), 0x05)]
    #[case::length(MessageHeader::default().with_length(300), 0x09)]
    #[case::all(
        MessageHeader::default().with_channel(1).with_session_id(7).with_length(300),
        0x0F
    )]
    fn flags_follow_fields(#[case] header: MessageHeader, #[case] flags: u8) {
        assert_eq!(header.flags(), flags);
        assert_eq!(header.use_header(), flags != 0);
    }

    #[test]
    fn flags_do_not_depend_on_update_order() {
        let a = MessageHeader::default()
            .with_length(9)
            .with_channel(2)
            .without_length();
        let b = MessageHeader::default().with_channel(2);
        assert_eq!(a, b);
        assert_eq!(a.flags(), b.flags());
    }

    #[test]
    fn clearing_every_field_clears_use_header() {
        let header = MessageHeader::default()
            .with_channel(1)
            .with_session_id(2)
            .without_session_id()
            .without_channel();
        assert!(!header.use_header());
    }

    #[test]
    fn full_header_has_expected_layout() {
        let header = MessageHeader::default()
            .with_channel(0x11)
            .with_session_id(0x0403_0201)
            .with_length(300);
        let mut buf = BytesMut::new();
        header.encode(&mut buf);

        assert_eq!(
            buf.as_ref(),
            &[0x0F, 0x11, 0x01, 0x02, 0x03, 0x04, 0xAC, 0x02]
        );
        assert_eq!(buf.len(), header.encoded_len());
        assert_eq!(MessageHeader::decode(&buf), Ok((header, buf.len())));
    }

    #[test]
    fn decode_stops_after_present_fields() {
        let src = [0x05, 0x01, 0x00, 0x00, 0x00, 0xEE, 0xEE];
        let (header, used) = MessageHeader::decode(&src).expect("decode header");
        assert_eq!(used, 5);
        assert_eq!(header.session_id(), Some(1));
        assert_eq!(header.channel(), None);
    }

    #[rstest]
    #[case::empty(&[])]
    #[case::missing_channel(&[0x03])]
    #[case::short_session(&[0x05, 0x01, 0x02])]
    #[case::short_length(&[0x09, 0x80])]
    fn truncated_headers_are_rejected(#[case] src: &[u8]) {
        assert!(matches!(
            MessageHeader::decode(src),
            Err(FramingError::TruncatedHeader { .. })
        ));
    }
}
