//! Helpers for the little-endian length fields used by SRMP frames.
//!
//! SRMP stores both the compact 16-bit payload length and the escaped 32-bit
//! length in little-endian order. Keeping the conversions here scopes the
//! Clippy expectations to the conversion points so the codec can stay
//! explicit about wire endianness.

/// Serialise a `u16` in SRMP wire order (little-endian).
///
/// # Examples
///
/// ```
/// use srmp::byte_order::write_wire_u16;
///
/// assert_eq!(write_wire_u16(0x1234), [0x34, 0x12]);
/// ```
#[must_use]
pub fn write_wire_u16(value: u16) -> [u8; 2] {
    #[expect(
        clippy::little_endian_bytes,
        reason = "SRMP length fields are little-endian on the wire."
    )]
    value.to_le_bytes()
}

/// Parse a wire-order `u16` from its on-wire representation.
///
/// # Examples
///
/// ```
/// use srmp::byte_order::read_wire_u16;
///
/// assert_eq!(read_wire_u16([0x04, 0x00]), 4);
/// ```
#[must_use]
pub fn read_wire_u16(bytes: [u8; 2]) -> u16 {
    #[expect(
        clippy::little_endian_bytes,
        reason = "SRMP length fields are little-endian on the wire."
    )]
    u16::from_le_bytes(bytes)
}

/// Serialise a `u32` in SRMP wire order (little-endian).
///
/// # Examples
///
/// ```
/// use srmp::byte_order::write_wire_u32;
///
/// assert_eq!(write_wire_u32(0x1234_5678), [0x78, 0x56, 0x34, 0x12]);
/// ```
#[must_use]
pub fn write_wire_u32(value: u32) -> [u8; 4] {
    #[expect(
        clippy::little_endian_bytes,
        reason = "SRMP length fields are little-endian on the wire."
    )]
    value.to_le_bytes()
}

/// Parse a wire-order `u32` from its on-wire representation.
///
/// # Examples
///
/// ```
/// use srmp::byte_order::read_wire_u32;
///
/// assert_eq!(read_wire_u32([0x78, 0x56, 0x34, 0x12]), 0x1234_5678);
/// ```
#[must_use]
pub fn read_wire_u32(bytes: [u8; 4]) -> u32 {
    #[expect(
        clippy::little_endian_bytes,
        reason = "SRMP length fields are little-endian on the wire."
    )]
    u32::from_le_bytes(bytes)
}

/// Read a wire-order `u16` starting at `offset`, if enough bytes exist.
#[must_use]
pub(crate) fn peek_wire_u16(src: &[u8], offset: usize) -> Option<u16> {
    src.get(offset..offset.checked_add(2)?)
        .and_then(|slice| <[u8; 2]>::try_from(slice).ok())
        .map(read_wire_u16)
}

/// Read a wire-order `u32` starting at `offset`, if enough bytes exist.
#[must_use]
pub(crate) fn peek_wire_u32(src: &[u8], offset: usize) -> Option<u32> {
    src.get(offset..offset.checked_add(4)?)
        .and_then(|slice| <[u8; 4]>::try_from(slice).ok())
        .map(read_wire_u32)
}

#[cfg(test)]
mod tests {
    //! Round-trip tests for wire byte-order conversion helpers.

    use rstest::rstest;

    use super::{
        peek_wire_u16,
        peek_wire_u32,
        read_wire_u16,
        read_wire_u32,
        write_wire_u16,
        write_wire_u32,
    };

    /// Verify that each wire-order write/read pair round-trips correctly.
    #[rstest]
    #[case::u16(
        0x1234u64,
        &write_wire_u16(0x1234)[..],
        &[0x34, 0x12],
        u64::from(read_wire_u16([0x34, 0x12]))
    )]
    #[case::u32(
        0x1234_5678u64,
        &write_wire_u32(0x1234_5678)[..],
        &[0x78, 0x56, 0x34, 0x12],
        u64::from(read_wire_u32([0x78, 0x56, 0x34, 0x12]))
    )]
    fn wire_byte_order_round_trip(
        #[case] value: u64,
        #[case] written: &[u8],
        #[case] expected_bytes: &[u8],
        #[case] read_back: u64,
    ) {
        assert_eq!(written, expected_bytes);
        assert_eq!(read_back, value);
    }

    #[test]
    fn peek_requires_enough_bytes() {
        let src = [0x01, 0x07, 0xFF, 0xFF, 0x00, 0x00, 0x01];
        assert_eq!(peek_wire_u16(&src, 2), Some(0xFFFF));
        assert_eq!(peek_wire_u16(&src, 6), None);
        assert_eq!(peek_wire_u32(&src, 4), None);
        assert_eq!(peek_wire_u32(&src, 2), Some(0x0000_FFFF));
    }
}
