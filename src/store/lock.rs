//! Per-board write exclusion.
//!
//! Every mutation of a board runs while holding that board's lock, so a
//! post number allocation and the append that uses it cannot interleave
//! with another writer on the same board. The board list and post number
//! documents are shared by all boards; their read-modify-write cycles also
//! take the catalog lock. Lock order: board locks (sorted by name), then the
//! catalog lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Lock table keyed by board name.
///
/// Entries are created on first use and kept for the life of the process.
#[derive(Debug, Default)]
pub struct BoardLocks {
    boards: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    catalog: Mutex<()>,
}

// The guarded data is `()`, so a poisoned lock carries no broken state.
fn acquire<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl BoardLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, name: &str) -> Arc<Mutex<()>> {
        let mut boards = acquire(&self.boards);
        Arc::clone(boards.entry(name.to_string()).or_default())
    }

    /// Run `f` while holding the lock of one board.
    pub fn with_board<R>(&self, name: &str, f: impl FnOnce() -> R) -> R {
        let handle = self.handle(name);
        let _guard = acquire(&*handle);
        f()
    }

    /// Run `f` while holding the locks of several boards.
    ///
    /// Names are deduplicated and locked in sorted order.
    pub fn with_boards<R>(&self, names: &[&str], f: impl FnOnce() -> R) -> R {
        let mut names = names.to_vec();
        names.sort_unstable();
        names.dedup();

        let handles: Vec<_> = names.iter().map(|name| self.handle(name)).collect();
        let _guards: Vec<_> = handles.iter().map(|h| acquire(&**h)).collect();
        f()
    }

    /// Run `f` while holding the catalog lock.
    pub fn with_catalog<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = acquire(&self.catalog);
        f()
    }
}
