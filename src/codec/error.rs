//! Error types for the codec layer.
//!
//! This module provides a structured error taxonomy that distinguishes between
//! framing errors (structural problems with a single SRMP frame), protocol
//! errors (caller misuse or unknown variants), I/O errors, and EOF conditions.
//!
//! # Error Categories
//!
//! - [`FramingError`]: Wire-level issues in frame structure (truncated headers, truncated payloads,
//!   oversized frames, malformed varints).
//! - [`ProtocolError`]: Higher-level violations (unknown message kinds, replying to a reply,
//!   malformed text frames).
//! - [`EofError`]: End-of-stream conditions distinguishing clean closure from premature
//!   disconnection.
//! - [`CodecError`]: Top-level enum wrapping all categories plus I/O errors.
//!
//! Structural errors are local to one frame: they never corrupt the state of a
//! [`StreamFrameAssembler`](crate::assembler::StreamFrameAssembler) and never
//! abort reassembly of unrelated groups.

use std::io;

use thiserror::Error;

/// Framing-level errors raised while reading a single frame.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FramingError {
    /// Fewer bytes than the fixed header requires.
    #[error("truncated header: have {have}, need {need}")]
    TruncatedHeader {
        /// Bytes currently available.
        have: usize,
        /// Bytes required for the header.
        need: usize,
    },

    /// The `0xFFFF` escape is present but the 32-bit length is incomplete.
    #[error("truncated extended header: have {have} of 8 bytes")]
    TruncatedExtendedHeader {
        /// Bytes currently available.
        have: usize,
    },

    /// The declared payload length exceeds the bytes actually available.
    #[error("truncated payload: declared {declared}, available {available}")]
    TruncatedPayload {
        /// Payload length declared by the header.
        declared: usize,
        /// Payload bytes present after the header.
        available: usize,
    },

    /// Frame exceeds the configured or representable maximum.
    #[error("frame exceeds max length: {size} > {max}")]
    OversizedFrame {
        /// Actual payload size.
        size: usize,
        /// Maximum allowed payload size.
        max: usize,
    },

    /// A variable-length integer is longer than ten bytes or overflows `u64`.
    #[error("invalid variable-length integer")]
    InvalidVarint,
}

/// Protocol-level errors that are not about frame boundaries.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// No variant is registered for the kind byte.
    #[error("unknown message kind: {kind:#04x}")]
    UnknownMessageKind {
        /// Kind byte read from the envelope.
        kind: u8,
    },

    /// A reply was requested for a message that is already a reply.
    #[error("cannot create a reply to a reply")]
    InvalidReplyOfReply,

    /// A text-form frame could not be parsed or produced.
    #[error("malformed text frame: {reason}")]
    MalformedText {
        /// What was wrong with the frame.
        reason: String,
    },
}

impl ProtocolError {
    pub(crate) fn malformed_text(reason: impl Into<String>) -> Self {
        Self::MalformedText {
            reason: reason.into(),
        }
    }
}

/// Premature end-of-stream inside a frame.
///
/// A stream that ends on a frame boundary is not an error; the codec reports
/// it as `Ok(None)`.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum EofError {
    /// EOF received after the header but before the whole payload.
    #[error("premature EOF: {bytes_received} bytes of {expected} byte payload received")]
    MidFrame {
        /// Payload bytes received before EOF.
        bytes_received: usize,
        /// Declared payload size.
        expected: usize,
    },

    /// EOF received while the header was being read.
    #[error("premature EOF during header: {bytes_received} of {header_size} header bytes")]
    MidHeader {
        /// Header bytes received before EOF.
        bytes_received: usize,
        /// Header size required at that point.
        header_size: usize,
    },
}

/// Top-level codec error taxonomy.
///
/// # Examples
///
/// ```
/// use srmp::codec::{CodecError, FramingError};
///
/// let err = CodecError::Framing(FramingError::TruncatedHeader { have: 2, need: 4 });
///
/// assert!(err.is_structural());
/// assert_eq!(err.error_type(), "framing");
/// ```
#[derive(Debug, Error)]
pub enum CodecError {
    /// Framing layer error.
    #[error("framing error: {0}")]
    Framing(#[from] FramingError),

    /// Protocol layer error.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Transport layer I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// End-of-stream handling.
    #[error("EOF: {0}")]
    Eof(#[from] EofError),
}

impl CodecError {
    /// Returns true for decode failures caused by the bytes of one frame.
    ///
    /// Structural errors are reported per frame; callers keep processing the
    /// remaining frames of the same batch. Everything else is either caller
    /// misuse or a transport condition.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::Framing(_) | Self::Protocol(ProtocolError::UnknownMessageKind { .. })
        )
    }

    /// Returns the error category as a string for logging and metrics.
    ///
    /// # Returns
    ///
    /// One of: `"framing"`, `"protocol"`, `"io"`, or `"eof"`.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Framing(_) => "framing",
            Self::Protocol(_) => "protocol",
            Self::Io(_) => "io",
            Self::Eof(_) => "eof",
        }
    }
}

impl From<CodecError> for io::Error {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Io(e) => e,
            CodecError::Framing(e) => io::Error::new(io::ErrorKind::InvalidData, e),
            CodecError::Protocol(e) => io::Error::new(io::ErrorKind::InvalidData, e),
            CodecError::Eof(e) => io::Error::new(io::ErrorKind::UnexpectedEof, e),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
