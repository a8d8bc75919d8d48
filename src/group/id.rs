//! Group identifiers and their generator.

use std::sync::atomic::{AtomicU64, Ordering};

use derive_more::{Display, From, Into};

/// Identifier shared by every chunk split from one payload.
///
/// # Examples
///
/// ```
/// use srmp::group::GroupId;
/// let id = GroupId::new(42);
/// assert_eq!(id.get(), 42);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Into)]
#[display("{_0}")]
pub struct GroupId(u64);

impl GroupId {
    /// Create a new identifier.
    #[must_use]
    pub const fn new(value: u64) -> Self { Self(value) }

    /// Return the inner numeric identifier.
    #[must_use]
    pub const fn get(self) -> u64 { self.0 }
}

/// Hands out monotonically increasing [`GroupId`] values.
///
/// The generator is owned by whichever component splits payloads; there is
/// no process-wide counter.
#[derive(Debug, Default)]
pub struct GroupIdGenerator {
    next: AtomicU64,
}

impl GroupIdGenerator {
    /// Create a generator whose first identifier is `start_at`.
    #[must_use]
    pub const fn starting_at(start_at: GroupId) -> Self {
        Self {
            next: AtomicU64::new(start_at.get()),
        }
    }

    /// Return the next identifier. Wraps after `u64::MAX`.
    pub fn next_id(&self) -> GroupId { GroupId::new(self.next.fetch_add(1, Ordering::Relaxed)) }
}
