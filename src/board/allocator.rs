//! Post number allocation.
//!
//! Each board has one counter holding the highest post number issued so far
//! (0 when none). `next` only computes the candidate; the caller commits it
//! after the post itself is durably written. Numbers are never reused: the
//! only candidate that can be computed twice is one no stored post carries
//! (its write failed), and [`PostNumberAllocator::next_for`] also takes the
//! highest number already in the index into account, so no two stored posts
//! of a board share a number.

use tracing::debug;

use super::types::BoardIndex;
use crate::store::Storage;
use crate::{Result, TermchanError};

/// Per-board post number counters.
pub struct PostNumberAllocator<'a> {
    storage: &'a Storage,
}

impl<'a> PostNumberAllocator<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Highest number issued on the board so far.
    pub fn current(&self, board: &str) -> Result<u64> {
        self.storage
            .read_postnums()?
            .get(board)
            .copied()
            .ok_or_else(|| TermchanError::NotFound(format!("post counter for /{board}/")))
    }

    /// Next number to use on the board. Does not persist anything.
    pub fn next(&self, board: &str) -> Result<u64> {
        increment(self.current(board)?, board)
    }

    /// Next number for a post about to be appended to `index`.
    ///
    /// Never returns a number already present in the index, even if an
    /// earlier counter write was lost.
    pub(crate) fn next_for(&self, board: &str, index: &BoardIndex) -> Result<u64> {
        let current = self.current(board)?;
        increment(current.max(index.max_sequence_number()), board)
    }

    /// Persist `number` as the board's counter.
    ///
    /// The counter never goes backwards: committing a number lower than the
    /// stored value is a no-op.
    pub fn commit(&self, board: &str, number: u64) -> Result<()> {
        self.storage.locks().with_catalog(|| -> Result<()> {
            let mut postnums = self.storage.read_postnums()?;
            let counter = postnums
                .get_mut(board)
                .ok_or_else(|| TermchanError::NotFound(format!("post counter for /{board}/")))?;
            if number <= *counter {
                return Ok(());
            }
            *counter = number;
            self.storage.write_postnums(&postnums)?;
            debug!(board, number, "post counter advanced");
            Ok(())
        })
    }
}

fn increment(current: u64, board: &str) -> Result<u64> {
    current.checked_add(1).ok_or_else(|| {
        TermchanError::StorageCorrupt(format!("post counter for /{board}/ is exhausted"))
    })
}
