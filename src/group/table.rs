//! Concurrent reassembly of many interleaved chunk groups.

use std::time::{Duration, Instant};

use bytes::Bytes;
use dashmap::DashMap;

use super::{GroupError, GroupId, GroupMessage, GroupReassembler};
use crate::{codec::CodecError, message::DefaultMessage};

#[derive(Debug)]
struct PartialGroup {
    reassembler: GroupReassembler,
    started_at: Instant,
}

/// Payload rebuilt from a complete group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReassembledGroup {
    group_id: GroupId,
    payload: Bytes,
}

impl ReassembledGroup {
    /// Construct a new [`ReassembledGroup`].
    #[must_use]
    pub fn new(group_id: GroupId, payload: Bytes) -> Self { Self { group_id, payload } }

    /// Identifier shared by the chunks that formed this payload.
    #[must_use]
    pub const fn group_id(&self) -> GroupId { self.group_id }

    /// Borrow the payload.
    #[must_use]
    pub const fn payload(&self) -> &Bytes { &self.payload }

    /// Consume the group, returning the payload.
    #[must_use]
    pub fn into_payload(self) -> Bytes { self.payload }

    /// Decode the payload as an SRMP frame.
    ///
    /// # Errors
    ///
    /// Returns any [`CodecError`] raised while decoding the frame.
    pub fn decode_message(&self) -> Result<DefaultMessage, CodecError> {
        DefaultMessage::decode_frame(&self.payload)
    }
}

/// Tracks partially received groups keyed by [`GroupId`].
///
/// All operations take `&self`, so one table can be shared between the
/// tasks that decode chunks. Stale groups are only dropped when the owner
/// calls [`purge_expired_at`](Self::purge_expired_at).
///
/// Completed group ids are remembered until the same purge ages them out,
/// so a late or retransmitted chunk cannot deliver a payload twice.
#[derive(Debug, Default)]
pub struct GroupTable {
    groups: DashMap<GroupId, PartialGroup>,
    completed: DashMap<GroupId, Instant>,
}

impl GroupTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Add a chunk using the current time.
    ///
    /// # Errors
    ///
    /// See [`add_at`](Self::add_at).
    pub fn add(&self, chunk: GroupMessage) -> Result<Option<ReassembledGroup>, GroupError> {
        self.add_at(chunk, Instant::now())
    }

    /// Add a chunk, returning the payload once its group completes.
    ///
    /// `now` stamps newly opened groups for later expiry. Chunks of a group
    /// that already completed are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError::IndexOutOfRange`] for an invalid index. The
    /// offending group is discarded.
    pub fn add_at(
        &self,
        chunk: GroupMessage,
        now: Instant,
    ) -> Result<Option<ReassembledGroup>, GroupError> {
        let group_id = chunk.group_id();
        if self.completed.contains_key(&group_id) {
            log::debug!(
                "ignoring chunk {} of completed group {group_id}",
                chunk.index()
            );
            return Ok(None);
        }
        let mut entry = self.groups.entry(group_id).or_insert_with(|| PartialGroup {
            reassembler: GroupReassembler::new(),
            started_at: now,
        });
        let outcome = entry.reassembler.add(chunk);
        drop(entry);

        match outcome {
            Ok(false) => Ok(None),
            Ok(true) => {
                // Another task may have completed the same group first.
                let Some((_, partial)) = self.groups.remove(&group_id) else {
                    return Ok(None);
                };
                self.completed.insert(group_id, now);
                let payload = partial.reassembler.payload()?;
                crate::metrics::inc_groups_completed();
                Ok(Some(ReassembledGroup::new(group_id, payload)))
            }
            Err(err) => {
                self.groups.remove(&group_id);
                Err(err)
            }
        }
    }

    /// Number of groups still waiting for chunks.
    #[must_use]
    pub fn pending(&self) -> usize { self.groups.len() }

    /// Drop groups opened more than `ttl` before now.
    pub fn purge_expired(&self, ttl: Duration) -> Vec<GroupId> {
        self.purge_expired_at(Instant::now(), ttl)
    }

    /// Drop groups opened more than `ttl` before `now`, returning their ids.
    ///
    /// Completed ids older than `ttl` are forgotten as well, which lets a
    /// wrapped-around id open a new group.
    pub fn purge_expired_at(&self, now: Instant, ttl: Duration) -> Vec<GroupId> {
        self.completed
            .retain(|_, completed_at| now.saturating_duration_since(*completed_at) < ttl);
        let mut evicted = Vec::new();
        self.groups.retain(|group_id, partial| {
            let expired = now.saturating_duration_since(partial.started_at) >= ttl;
            if expired {
                log::warn!(
                    "dropping incomplete group {group_id}: {} of {:?} chunks received",
                    partial.reassembler.received(),
                    partial.reassembler.count()
                );
                evicted.push(*group_id);
            }
            !expired
        });
        crate::metrics::add_groups_expired(evicted.len() as u64);
        evicted
    }
}
