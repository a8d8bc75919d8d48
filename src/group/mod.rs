//! Splitting oversized payloads into chunk groups and stitching them back.
//!
//! A payload that does not fit one frame is cut into [`GroupMessage`] chunks
//! that share a [`GroupId`] and carry a 1-based index. Each chunk is a
//! self-delimiting frame on its own, so chunks travel through the same
//! [`StreamFrameAssembler`](crate::assembler::StreamFrameAssembler) and
//! [`MessageKindRegistry`](crate::registry::MessageKindRegistry) path as any
//! other message.
//!
//! Receivers feed chunks to a [`GroupReassembler`] (one group) or a
//! [`GroupTable`] (many interleaved groups). Arrival order does not matter:
//! the payload is always rebuilt in index order.

pub mod error;
pub mod id;
pub mod message;
pub mod reassembler;
pub mod splitter;
pub mod table;

pub use error::GroupError;
pub use id::{GroupId, GroupIdGenerator};
pub use message::GroupMessage;
pub use reassembler::GroupReassembler;
pub use splitter::{GroupSplitter, split};
pub use table::{GroupTable, ReassembledGroup};

/// Groups with at least this many chunks carry the true count only on the
/// first chunk; every other chunk carries `0`.
pub const COUNT_SENTINEL_THRESHOLD: u32 = 128;

#[cfg(test)]
mod tests;
