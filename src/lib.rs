#![doc(html_root_url = "https://docs.rs/srmp/latest")]
//! Public API for the `srmp` library.
//!
//! SRMP is a compact length-prefixed binary message protocol. This crate
//! provides the frame codec, a stream assembler that recovers frames from
//! arbitrarily split transport reads, a registry for typed message envelopes
//! and a splitter/reassembler for payloads larger than one frame.

pub mod assembler;
pub mod byte_order;
pub mod codec;
pub mod group;
pub mod message;
pub mod metrics;
pub mod registry;
pub mod varint;

#[cfg(test)]
mod test_helpers;

pub use assembler::{AssemblerConfig, FrameLength, StreamFrameAssembler};
pub use codec::{CodecError, EofError, FramingError, ProtocolError, SrmpCodec};
pub use group::{
    GroupError,
    GroupId,
    GroupMessage,
    GroupReassembler,
    GroupSplitter,
    GroupTable,
    ReassembledGroup,
};
pub use message::{DefaultMessage, Message, MessageHeader, MessageKind, Mode};
pub use registry::{MessageKindRegistry, MessageVariant, RegistryError, WireMessage};
