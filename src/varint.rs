//! Unsigned LEB128 variable-length integers.
//!
//! Group chunk headers and the optional [`MessageHeader`](crate::message::MessageHeader)
//! length field use seven data bits per byte with the high bit marking a
//! continuation byte. Encoded size therefore depends on magnitude, which the
//! group splitter accounts for when budgeting chunk headers.

use bytes::BufMut;

use crate::codec::FramingError;

/// Largest number of bytes a `u64` can occupy once encoded.
pub const MAX_VARINT_LEN: usize = 10;

/// Return the number of bytes `value` occupies once encoded.
///
/// # Examples
///
/// ```
/// use srmp::varint::varint_len;
///
/// assert_eq!(varint_len(0), 1);
/// assert_eq!(varint_len(127), 1);
/// assert_eq!(varint_len(128), 2);
/// assert_eq!(varint_len(u64::MAX), 10);
/// ```
#[must_use]
pub const fn varint_len(value: u64) -> usize {
    let bits = 64 - (value | 1).leading_zeros() as usize;
    bits.div_ceil(7)
}

/// Append `value` to `dst`.
pub fn put_varint(dst: &mut impl BufMut, mut value: u64) {
    while value >= 0x80 {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "only the low seven bits are kept"
        )]
        dst.put_u8((value as u8) | 0x80);
        value >>= 7;
    }
    #[expect(clippy::cast_possible_truncation, reason = "value < 0x80 here")]
    dst.put_u8(value as u8);
}

/// Outcome of peeking at a varint that may not be fully buffered yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VarintPeek {
    /// The value and the number of bytes it occupied.
    Complete(u64, usize),
    /// The input ended before the terminating byte.
    Incomplete,
}

/// Peek a varint at the start of `src`.
///
/// # Errors
///
/// Returns [`FramingError::InvalidVarint`] when the encoding runs past
/// [`MAX_VARINT_LEN`] bytes or overflows `u64`.
pub fn peek_varint(src: &[u8]) -> Result<VarintPeek, FramingError> {
    let mut value = 0u64;
    for (position, byte) in src.iter().copied().enumerate() {
        if position >= MAX_VARINT_LEN {
            return Err(FramingError::InvalidVarint);
        }
        let chunk = u64::from(byte & 0x7F);
        let shift = 7 * position;
        if position == MAX_VARINT_LEN - 1 && chunk > 1 {
            return Err(FramingError::InvalidVarint);
        }
        value |= chunk << shift;
        if byte & 0x80 == 0 {
            return Ok(VarintPeek::Complete(value, position + 1));
        }
    }
    if src.len() >= MAX_VARINT_LEN {
        return Err(FramingError::InvalidVarint);
    }
    Ok(VarintPeek::Incomplete)
}

/// Read a varint from the start of `src`, returning it with its encoded size.
///
/// # Errors
///
/// Returns [`FramingError::TruncatedHeader`] when `src` ends mid-varint, or
/// [`FramingError::InvalidVarint`] when the encoding is malformed.
pub fn read_varint(src: &[u8]) -> Result<(u64, usize), FramingError> {
    match peek_varint(src)? {
        VarintPeek::Complete(value, used) => Ok((value, used)),
        VarintPeek::Incomplete => Err(FramingError::TruncatedHeader {
            have: src.len(),
            need: src.len() + 1,
        }),
    }
}
