//! SRMP binary framing.
//!
//! A frame is a flag/mode byte, a sequence byte, a little-endian 16-bit
//! payload length and the payload. A length of `0xFFFF` escapes to a 32-bit
//! length in the following four bytes, which lets a frame exceed 64 KiB while
//! keeping the common case at a four-byte header.
//!
//! ```text
//! byte 0     bits 0-5 flag, bits 6-7 mode
//! byte 1     sequence
//! bytes 2-3  payload length L (u16 LE)
//! bytes 4-7  payload length (u32 LE), only when L == 0xFFFF
//! ```
//!
//! The helpers here are shared by [`DefaultMessage`], the
//! [`StreamFrameAssembler`](crate::assembler::StreamFrameAssembler) default
//! frame-length function and [`SrmpCodec`], the `tokio_util` adapter.
//!
//! # Error Handling
//!
//! The codec layer reports failures through [`CodecError`]. See the
//! [`error`] module for the taxonomy.

use std::io;

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::{
    byte_order::{peek_wire_u16, peek_wire_u32, write_wire_u16, write_wire_u32},
    message::{DefaultMessage, Message},
};

pub mod error;

pub use error::{CodecError, EofError, FramingError, ProtocolError};

/// Size of the compact header.
pub const HEADER_LEN: usize = 4;

/// Size of the header when the 32-bit length escape is used.
pub const EXTENDED_HEADER_LEN: usize = 8;

/// Value of the 16-bit length field announcing a 32-bit length.
pub const LENGTH_ESCAPE: u16 = 0xFFFF;

/// Default payload limit for [`SrmpCodec`] (16 MiB).
pub const DEFAULT_MAX_PAYLOAD_LENGTH: usize = 16 * 1024 * 1024;

/// Largest payload the escaped length field can describe.
pub const MAX_PAYLOAD_LENGTH: usize = u32::MAX as usize;

/// Header fields of one SRMP frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameHeader {
    /// Flag and mode byte.
    pub first_byte: u8,
    /// Sequence byte.
    pub sequence: u8,
    /// Declared payload length after escape resolution.
    pub payload_len: usize,
    /// Header size, [`HEADER_LEN`] or [`EXTENDED_HEADER_LEN`].
    pub header_len: usize,
}

impl FrameHeader {
    /// Total frame size: header plus payload.
    #[must_use]
    pub const fn frame_len(&self) -> usize { self.header_len.saturating_add(self.payload_len) }
}

/// Header size [`write_header`] uses for a payload of `payload_len` bytes.
#[must_use]
pub const fn header_len_for(payload_len: usize) -> usize {
    if payload_len >= LENGTH_ESCAPE as usize {
        EXTENDED_HEADER_LEN
    } else {
        HEADER_LEN
    }
}

/// Parse the header at the start of `src`.
///
/// Only the header is inspected; the payload may still be incomplete.
///
/// # Errors
///
/// Returns [`FramingError::TruncatedHeader`] with fewer than four bytes and
/// [`FramingError::TruncatedExtendedHeader`] when the escape is present but
/// the 32-bit length is not.
pub fn read_header(src: &[u8]) -> Result<FrameHeader, FramingError> {
    let (Some(&first_byte), Some(&sequence), Some(short)) =
        (src.first(), src.get(1), peek_wire_u16(src, 2))
    else {
        return Err(FramingError::TruncatedHeader {
            have: src.len(),
            need: HEADER_LEN,
        });
    };

    if short != LENGTH_ESCAPE {
        return Ok(FrameHeader {
            first_byte,
            sequence,
            payload_len: usize::from(short),
            header_len: HEADER_LEN,
        });
    }

    let long = peek_wire_u32(src, HEADER_LEN)
        .ok_or(FramingError::TruncatedExtendedHeader { have: src.len() })?;
    Ok(FrameHeader {
        first_byte,
        sequence,
        payload_len: long as usize,
        header_len: EXTENDED_HEADER_LEN,
    })
}

enum LengthField {
    Compact(u16),
    Extended(u32),
}

/// Append a header describing a payload of `payload_len` bytes.
///
/// # Errors
///
/// Returns [`FramingError::OversizedFrame`] when `payload_len` exceeds
/// [`MAX_PAYLOAD_LENGTH`]. Nothing is written in that case.
pub fn write_header(
    first_byte: u8,
    sequence: u8,
    payload_len: usize,
    dst: &mut impl BufMut,
) -> Result<(), FramingError> {
    let field = match u16::try_from(payload_len) {
        Ok(len) if len != LENGTH_ESCAPE => LengthField::Compact(len),
        _ => LengthField::Extended(u32::try_from(payload_len).map_err(|_| {
            FramingError::OversizedFrame {
                size: payload_len,
                max: MAX_PAYLOAD_LENGTH,
            }
        })?),
    };

    dst.put_u8(first_byte);
    dst.put_u8(sequence);
    match field {
        LengthField::Compact(len) => dst.put_slice(&write_wire_u16(len)),
        LengthField::Extended(len) => {
            dst.put_slice(&write_wire_u16(LENGTH_ESCAPE));
            dst.put_slice(&write_wire_u32(len));
        }
    }
    Ok(())
}

/// Full length of the frame at the start of `src`, or `0` while the header is
/// still incomplete.
///
/// A result larger than `src.len()` means the payload has not fully arrived.
/// This is the default frame-length function of
/// [`StreamFrameAssembler`](crate::assembler::StreamFrameAssembler).
///
/// # Examples
///
/// ```
/// use srmp::codec::peek_frame_length;
///
/// assert_eq!(peek_frame_length(&[0x01, 0x07]), 0);
/// assert_eq!(peek_frame_length(&[0x01, 0x07, 0x04, 0x00]), 8);
/// ```
#[must_use]
pub fn peek_frame_length(src: &[u8]) -> usize {
    read_header(src).map_or(0, |header| header.frame_len())
}

/// `tokio_util` codec reading and writing [`DefaultMessage`] frames.
///
/// Payloads larger than the configured maximum are rejected in both
/// directions so a peer cannot force unbounded buffering.
#[derive(Clone, Debug)]
pub struct SrmpCodec {
    max_payload_length: usize,
}

impl SrmpCodec {
    /// Construct a codec accepting payloads up to `max_payload_length` bytes.
    ///
    /// Values above [`MAX_PAYLOAD_LENGTH`] are clamped.
    #[must_use]
    pub fn new(max_payload_length: usize) -> Self {
        Self {
            max_payload_length: max_payload_length.min(MAX_PAYLOAD_LENGTH),
        }
    }

    /// Return the maximum payload length accepted by this codec.
    #[must_use]
    pub fn max_payload_length(&self) -> usize { self.max_payload_length }

    fn check_len(&self, size: usize) -> Result<(), CodecError> {
        if size > self.max_payload_length {
            return Err(FramingError::OversizedFrame {
                size,
                max: self.max_payload_length,
            }
            .into());
        }
        Ok(())
    }
}

impl Default for SrmpCodec {
    fn default() -> Self { Self::new(DEFAULT_MAX_PAYLOAD_LENGTH) }
}

impl Decoder for SrmpCodec {
    type Item = DefaultMessage;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let header = match read_header(src) {
            Ok(header) => header,
            Err(
                FramingError::TruncatedHeader { .. } | FramingError::TruncatedExtendedHeader { .. },
            ) => return Ok(None),
            Err(err) => return Err(CodecError::from(err).into()),
        };
        self.check_len(header.payload_len)?;

        let frame_len = header.frame_len();
        if src.len() < frame_len {
            src.reserve(frame_len - src.len());
            return Ok(None);
        }

        let mut frame = src.split_to(frame_len);
        frame.advance(header.header_len);
        Ok(Some(DefaultMessage::from_parts(
            header.first_byte,
            header.sequence,
            frame.freeze(),
        )))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(message) => Ok(Some(message)),
            // Stream ended on a frame boundary.
            None if src.is_empty() => Ok(None),
            None => {
                let err = build_eof_error(src);
                tracing::debug!(
                    buffered = src.len(),
                    error = %err,
                    "stream ended inside an SRMP frame"
                );
                Err(CodecError::Eof(err).into())
            }
        }
    }
}

/// Classify an EOF that left a partial frame behind.
fn build_eof_error(src: &BytesMut) -> EofError {
    match read_header(src) {
        Ok(header) => EofError::MidFrame {
            bytes_received: src.len().saturating_sub(header.header_len),
            expected: header.payload_len,
        },
        Err(FramingError::TruncatedExtendedHeader { .. }) => EofError::MidHeader {
            bytes_received: src.len(),
            header_size: EXTENDED_HEADER_LEN,
        },
        Err(_) => EofError::MidHeader {
            bytes_received: src.len(),
            header_size: HEADER_LEN,
        },
    }
}

impl Encoder<DefaultMessage> for SrmpCodec {
    type Error = io::Error;

    fn encode(&mut self, item: DefaultMessage, dst: &mut BytesMut) -> Result<(), Self::Error> {
        self.check_len(item.payload().len())?;
        item.encode(dst).map_err(io::Error::from)
    }
}
