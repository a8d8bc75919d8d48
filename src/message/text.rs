//! Human-readable companion encoding of [`DefaultMessage`].
//!
//! The text form is `"{length},{sequence}[,{flagByte}]:{payload}"` with
//! decimal header fields. `flagByte` is the complete first wire byte (flag and
//! mode bits) and is omitted when zero. The text and binary forms describe
//! the same logical message but are not bit-compatible and must not be mixed
//! within one stream.

use bytes::Bytes;

use super::DefaultMessage;
use crate::{
    codec::{CodecError, FramingError, ProtocolError},
    message::Message,
};

impl DefaultMessage {
    /// Render the message in its text form.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::MalformedText`] if the payload is not UTF-8.
    ///
    /// # Examples
    ///
    /// ```
    /// use srmp::message::DefaultMessage;
    ///
    /// let message = DefaultMessage::new("Open").with_sequence(7);
    /// assert_eq!(message.encode_text().expect("utf-8 payload"), "4,7:Open");
    /// ```
    pub fn encode_text(&self) -> Result<String, CodecError> {
        let text = std::str::from_utf8(self.payload())
            .map_err(|err| ProtocolError::malformed_text(format!("payload is not UTF-8: {err}")))?;
        let first_byte = self.first_byte();
        let len = self.payload().len();
        let sequence = self.sequence();
        Ok(if first_byte == 0 {
            format!("{len},{sequence}:{text}")
        } else {
            format!("{len},{sequence},{first_byte}:{text}")
        })
    }

    /// Parse a message from its text form.
    ///
    /// The header ends at the first `:`. Text beyond the declared length is
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::MalformedText`] for a missing separator, a
    /// non-numeric or out-of-range field, or too many fields, and
    /// [`FramingError::TruncatedPayload`] when fewer payload bytes follow than
    /// declared.
    pub fn decode_text(src: &str) -> Result<Self, CodecError> {
        let (header, body) = src
            .split_once(':')
            .ok_or_else(|| ProtocolError::malformed_text("missing ':' separator"))?;

        let mut fields = header.split(',');
        let length: usize = parse_field(fields.next(), "length")?;
        let sequence: u8 = parse_field(fields.next(), "sequence")?;
        let first_byte: u8 = match fields.next() {
            Some(raw) => parse_field(Some(raw), "flag")?,
            None => 0,
        };
        if fields.next().is_some() {
            return Err(ProtocolError::malformed_text("too many header fields").into());
        }

        let payload = body
            .as_bytes()
            .get(..length)
            .ok_or(FramingError::TruncatedPayload {
                declared: length,
                available: body.len(),
            })?;
        Ok(Self::from_parts(
            first_byte,
            sequence,
            Bytes::copy_from_slice(payload),
        ))
    }
}

fn parse_field<T: std::str::FromStr>(raw: Option<&str>, name: &str) -> Result<T, ProtocolError> {
    let raw = raw
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ProtocolError::malformed_text(format!("missing {name} field")))?;
    raw.trim()
        .parse()
        .map_err(|_| ProtocolError::malformed_text(format!("invalid {name} field: {raw:?}")))
}
