//! Logical messages carried by SRMP frames.
//!
//! [`Message`] is the variant-independent view every decoded frame exposes to
//! the application layer. [`DefaultMessage`] is the primary variant and owns
//! the compact SRMP framing; other variants (such as
//! [`GroupMessage`](crate::group::GroupMessage)) travel inside the typed
//! envelope handled by [`MessageKindRegistry`](crate::registry::MessageKindRegistry).

use std::{any::Any, fmt};

use bytes::{Bytes, BytesMut};
use derive_more::{Display, From, Into};

use crate::codec::{self, CodecError, FramingError, ProtocolError};

mod header;
pub mod text;

pub use header::MessageHeader;

/// One-byte discriminant identifying a concrete message variant.
///
/// # Examples
///
/// ```
/// use srmp::message::MessageKind;
/// let kind = MessageKind::new(0x02);
/// assert_eq!(kind.get(), 0x02);
/// assert_eq!(kind.to_string(), "0x02");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Into)]
#[display("{_0:#04x}")]
pub struct MessageKind(u8);

impl MessageKind {
    /// Wrap a raw kind byte.
    #[must_use]
    pub const fn new(value: u8) -> Self { Self(value) }

    /// Return the raw kind byte.
    #[must_use]
    pub const fn get(self) -> u8 { self.0 }
}

/// Variant-independent view of a decoded message.
pub trait Message: Any + Send + Sync + fmt::Debug {
    /// Kind byte of the concrete variant. Never changes after construction.
    fn kind(&self) -> MessageKind;

    /// Whether the message answers an earlier request.
    fn is_reply(&self) -> bool;

    /// Whether the message is a reply that reports a failure.
    fn is_error(&self) -> bool;

    /// Whether the sender expects no reply.
    fn is_one_way(&self) -> bool;

    /// Payload bytes. May be empty.
    fn payload(&self) -> &Bytes;

    /// Upcast used for downcasting trait objects back to their variant.
    fn as_any(&self) -> &dyn Any;
}

impl dyn Message {
    /// Borrow the message as a concrete variant, if it is one.
    #[must_use]
    pub fn downcast_ref<T: Message>(&self) -> Option<&T> { self.as_any().downcast_ref::<T>() }
}

/// Delivery mode packed into bits 6-7 of the first wire byte.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Mode {
    /// A request expecting a reply.
    #[default]
    Request,
    /// A request that expects no reply.
    OneWay,
    /// A successful reply.
    Reply,
    /// A reply carrying an error.
    ReplyError,
}

impl Mode {
    /// Decode the mode from the two high bits of the first wire byte.
    #[must_use]
    pub const fn from_first_byte(byte: u8) -> Self {
        match byte >> 6 {
            0 => Self::Request,
            1 => Self::OneWay,
            2 => Self::Reply,
            _ => Self::ReplyError,
        }
    }

    /// Return the two mode bits shifted into their wire position.
    #[must_use]
    pub const fn bits(self) -> u8 {
        let raw = match self {
            Self::Request => 0,
            Self::OneWay => 1,
            Self::Reply => 2,
            Self::ReplyError => 3,
        };
        raw << 6
    }

    /// Whether the mode is one of the reply modes.
    #[must_use]
    pub const fn is_reply(self) -> bool { matches!(self, Self::Reply | Self::ReplyError) }
}

/// Message using the compact SRMP framing.
///
/// The wire layout is a flag/mode byte, a sequence byte, a little-endian
/// 16-bit payload length (escaped to 32 bits for payloads of `0xFFFF` bytes
/// or more) and the payload itself.
///
/// # Examples
///
/// ```
/// use srmp::message::DefaultMessage;
///
/// let message = DefaultMessage::new("Open").with_flag(1).with_sequence(7);
/// let wire = message.to_bytes().expect("encode");
/// assert_eq!(wire.as_ref(), &[0x01, 0x07, 0x04, 0x00, b'O', b'p', b'e', b'n']);
///
/// let decoded = DefaultMessage::decode(&wire).expect("decode");
/// assert_eq!(decoded, message);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DefaultMessage {
    flag: u8,
    mode: Mode,
    sequence: u8,
    payload: Bytes,
}

impl DefaultMessage {
    /// Kind byte used when the message travels inside a typed envelope.
    pub const KIND: MessageKind = MessageKind::new(0x01);

    /// Bits of the first wire byte available to the user flag.
    pub const FLAG_MASK: u8 = 0x3F;

    /// Create a request carrying `payload`, with flag and sequence zeroed.
    #[must_use]
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
            ..Self::default()
        }
    }

    /// Set the six-bit user flag. Bits above [`Self::FLAG_MASK`] are dropped.
    #[must_use]
    pub fn with_flag(mut self, flag: u8) -> Self {
        self.flag = flag & Self::FLAG_MASK;
        self
    }

    /// Set the sequence byte used to pair requests with replies.
    #[must_use]
    pub fn with_sequence(mut self, sequence: u8) -> Self {
        self.sequence = sequence;
        self
    }

    /// Set the delivery mode.
    #[must_use]
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Replace the payload.
    #[must_use]
    pub fn with_payload(mut self, payload: impl Into<Bytes>) -> Self {
        self.payload = payload.into();
        self
    }

    /// Rebuild a message from its first wire byte, sequence and payload.
    #[must_use]
    pub fn from_parts(first_byte: u8, sequence: u8, payload: Bytes) -> Self {
        Self {
            flag: first_byte & Self::FLAG_MASK,
            mode: Mode::from_first_byte(first_byte),
            sequence,
            payload,
        }
    }

    /// The six-bit user flag.
    #[must_use]
    pub const fn flag(&self) -> u8 { self.flag }

    /// The delivery mode.
    #[must_use]
    pub const fn mode(&self) -> Mode { self.mode }

    /// The sequence byte.
    #[must_use]
    pub const fn sequence(&self) -> u8 { self.sequence }

    /// First wire byte: flag in bits 0-5, mode in bits 6-7.
    #[must_use]
    pub const fn first_byte(&self) -> u8 { self.flag | self.mode.bits() }

    /// Consume the message, returning the payload.
    #[must_use]
    pub fn into_payload(self) -> Bytes { self.payload }

    /// Build an empty reply carrying this message's flag and sequence.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidReplyOfReply`] when `self` is already a
    /// reply.
    pub fn create_reply(&self) -> Result<Self, ProtocolError> { self.reply_with(Mode::Reply) }

    /// Build an empty error reply carrying this message's flag and sequence.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidReplyOfReply`] when `self` is already a
    /// reply.
    pub fn create_error_reply(&self) -> Result<Self, ProtocolError> {
        self.reply_with(Mode::ReplyError)
    }

    fn reply_with(&self, mode: Mode) -> Result<Self, ProtocolError> {
        if self.mode.is_reply() {
            return Err(ProtocolError::InvalidReplyOfReply);
        }
        Ok(Self {
            flag: self.flag,
            mode,
            sequence: self.sequence,
            payload: Bytes::new(),
        })
    }

    /// Number of bytes [`encode`](Self::encode) writes.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        codec::header_len_for(self.payload.len()) + self.payload.len()
    }

    /// Append the binary SRMP form to `dst`.
    ///
    /// The compact four-byte header is used whenever the payload is shorter
    /// than `0xFFFF` bytes; longer payloads use the eight-byte escaped form.
    ///
    /// # Errors
    ///
    /// Returns [`FramingError::OversizedFrame`] if the payload does not fit
    /// the 32-bit length field.
    pub fn encode(&self, dst: &mut BytesMut) -> Result<(), CodecError> {
        dst.reserve(self.encoded_len());
        codec::write_header(self.first_byte(), self.sequence, self.payload.len(), dst)?;
        dst.extend_from_slice(&self.payload);
        Ok(())
    }

    /// Encode into a fresh buffer.
    ///
    /// # Errors
    ///
    /// See [`encode`](Self::encode).
    pub fn to_bytes(&self) -> Result<Bytes, CodecError> {
        let mut dst = BytesMut::with_capacity(self.encoded_len());
        self.encode(&mut dst)?;
        Ok(dst.freeze())
    }

    /// Decode a message from the start of `src`, copying the payload.
    ///
    /// Bytes after the frame are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`FramingError::TruncatedHeader`],
    /// [`FramingError::TruncatedExtendedHeader`] or
    /// [`FramingError::TruncatedPayload`] when `src` is shorter than the frame
    /// it describes.
    pub fn decode(src: &[u8]) -> Result<Self, CodecError> {
        let header = codec::read_header(src)?;
        let payload = src
            .get(header.header_len..header.frame_len())
            .ok_or(FramingError::TruncatedPayload {
                declared: header.payload_len,
                available: src.len().saturating_sub(header.header_len),
            })?;
        Ok(Self::from_parts(
            header.first_byte,
            header.sequence,
            Bytes::copy_from_slice(payload),
        ))
    }

    /// Decode a message from a frame without copying the payload.
    ///
    /// The payload is a slice sharing `frame`'s backing storage.
    ///
    /// # Errors
    ///
    /// See [`decode`](Self::decode).
    pub fn decode_frame(frame: &Bytes) -> Result<Self, CodecError> {
        let header = codec::read_header(frame)?;
        let end = header.frame_len();
        if end > frame.len() {
            return Err(FramingError::TruncatedPayload {
                declared: header.payload_len,
                available: frame.len().saturating_sub(header.header_len),
            }
            .into());
        }
        Ok(Self::from_parts(
            header.first_byte,
            header.sequence,
            frame.slice(header.header_len..end),
        ))
    }
}

impl Message for DefaultMessage {
    fn kind(&self) -> MessageKind { Self::KIND }

    fn is_reply(&self) -> bool { self.mode.is_reply() }

    fn is_error(&self) -> bool { self.mode == Mode::ReplyError }

    fn is_one_way(&self) -> bool { self.mode == Mode::OneWay }

    fn payload(&self) -> &Bytes { &self.payload }

    fn as_any(&self) -> &dyn Any { self }
}
