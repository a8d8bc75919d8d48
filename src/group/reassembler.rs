//! Inbound helper that rebuilds one group's payload from its chunks.
//!
//! Chunks may arrive in any order and may repeat. The first chunk fixes the
//! group identity; chunk `1` fixes the count. The payload is available once
//! every index from `1` to `count` has been seen.

use std::collections::BTreeMap;

use bytes::{Bytes, BytesMut};

use super::{GroupError, GroupId, GroupMessage};

/// Collects the chunks of a single group.
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use srmp::group::{GroupId, GroupMessage, GroupReassembler};
///
/// let id = GroupId::new(1);
/// let mut reassembler = GroupReassembler::new();
/// assert!(!reassembler.add(GroupMessage::new(id, 2, 2, Bytes::from_static(b"lo"))).expect("add"));
/// assert!(reassembler.add(GroupMessage::new(id, 1, 2, Bytes::from_static(b"hel"))).expect("add"));
/// assert_eq!(reassembler.payload().expect("complete").as_ref(), b"hello");
/// ```
#[derive(Clone, Debug, Default)]
pub struct GroupReassembler {
    group_id: Option<GroupId>,
    count: Option<u32>,
    chunks: BTreeMap<u32, Bytes>,
    buffered_bytes: usize,
}

impl GroupReassembler {
    /// Create an empty reassembler with no group identity yet.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Add a chunk, returning whether the group is now complete.
    ///
    /// A chunk whose index was already seen is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError::GroupIdentityMismatch`] when the chunk belongs to
    /// another group, and [`GroupError::IndexOutOfRange`] when its index is
    /// zero or beyond the known count. A rejected chunk leaves the state
    /// unchanged.
    pub fn add(&mut self, chunk: GroupMessage) -> Result<bool, GroupError> {
        let group_id = chunk.group_id();
        if let Some(expected) = self.group_id.filter(|&expected| expected != group_id) {
            return Err(GroupError::GroupIdentityMismatch {
                expected,
                found: group_id,
            });
        }

        let index = chunk.index();
        let count = self.count_after(&chunk);
        let out_of_range = |index| GroupError::IndexOutOfRange {
            group_id,
            index,
            count,
        };
        if index == 0 || count.is_some_and(|count| index > count) {
            return Err(out_of_range(index));
        }
        // A late chunk 1 may shrink the count below indices already held.
        let highest = self.chunks.last_key_value().map(|(&index, _)| index);
        if let Some(highest) = highest.filter(|&highest| count.is_some_and(|count| highest > count)) {
            return Err(out_of_range(highest));
        }

        self.group_id = Some(group_id);
        self.count = count;
        if self.chunks.contains_key(&index) {
            log::debug!("ignoring duplicate chunk {index} of group {group_id}");
            return Ok(self.is_complete());
        }
        self.buffered_bytes += chunk.data().len();
        self.chunks.insert(index, chunk.into_data());
        Ok(self.is_complete())
    }

    fn count_after(&self, chunk: &GroupMessage) -> Option<u32> {
        match (chunk.index(), chunk.count()) {
            (1, count) if count > 0 => Some(count),
            (_, 0) => self.count,
            (_, count) => self.count.or(Some(count)),
        }
    }

    /// Whether every chunk from `1` to the announced count has arrived.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.count
            .is_some_and(|count| self.chunks.len() == count as usize)
    }

    /// Group identity, once the first chunk has arrived.
    #[must_use]
    pub const fn group_id(&self) -> Option<GroupId> { self.group_id }

    /// Announced chunk count, if known.
    #[must_use]
    pub const fn count(&self) -> Option<u32> { self.count }

    /// Number of distinct chunks held.
    #[must_use]
    pub fn received(&self) -> usize { self.chunks.len() }

    /// Data bytes held across all chunks.
    #[must_use]
    pub const fn buffered_bytes(&self) -> usize { self.buffered_bytes }

    /// Concatenate the chunk data in index order.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError::IncompleteGroup`] until the group is complete.
    pub fn payload(&self) -> Result<Bytes, GroupError> {
        if !self.is_complete() {
            return Err(self.incomplete());
        }
        if self.chunks.len() == 1 {
            return Ok(self.chunks.values().next().cloned().unwrap_or_default());
        }
        let mut payload = BytesMut::with_capacity(self.buffered_bytes);
        for data in self.chunks.values() {
            payload.extend_from_slice(data);
        }
        Ok(payload.freeze())
    }

    fn incomplete(&self) -> GroupError {
        GroupError::IncompleteGroup {
            group_id: self.group_id.unwrap_or_default(),
            received: self.chunks.len(),
            expected: self.count,
        }
    }
}
