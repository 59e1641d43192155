//! Thread index operations for a board.

use tracing::debug;

use super::allocator::PostNumberAllocator;
use super::types::{normalize_board_name, BoardIndex, Post, Thread};
use crate::datetime::now_timestamp;
use crate::store::Storage;
use crate::{Result, TermchanError};

/// Validate a post body.
fn validate_body(body: &str) -> Result<()> {
    if body.trim().is_empty() {
        return Err(TermchanError::InvalidInput("post body is empty".to_string()));
    }
    Ok(())
}

/// Reads and appends threads and replies of boards.
///
/// Writes hold the board's lock from reading the index until the post
/// counter is committed, so concurrent posters never share a number or
/// overwrite each other's appends.
pub struct ThreadIndex<'a> {
    storage: &'a Storage,
}

impl<'a> ThreadIndex<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    fn ensure_registered(&self, board: &str) -> Result<()> {
        if !self.storage.read_boardlist()?.contains(board) {
            return Err(TermchanError::NotFound(format!("board /{board}/")));
        }
        Ok(())
    }

    /// Load a board's index.
    ///
    /// Runs under the board's lock: the board list entry and the index are
    /// read as one step, so a concurrent rename or delete shows up as
    /// [`TermchanError::NotFound`] rather than a missing index.
    pub fn load(&self, board: &str) -> Result<BoardIndex> {
        let board = normalize_board_name(board)?;
        self.storage.locks().with_board(&board, || -> Result<BoardIndex> {
            self.ensure_registered(&board)?;
            self.storage.read_index(&board)
        })
    }

    /// Start a new thread. Returns its id, which is also the number of its
    /// originating post.
    pub fn add_thread(&self, board: &str, subject: &str, body: &str) -> Result<u64> {
        validate_body(body)?;
        let board = normalize_board_name(board)?;

        self.storage.locks().with_board(&board, || -> Result<u64> {
            self.ensure_registered(&board)?;
            let mut index = self.storage.read_index(&board)?;
            let allocator = PostNumberAllocator::new(self.storage);
            let number = allocator.next_for(&board, &index)?;

            index.push(Thread::start(
                subject,
                Post::new(number, now_timestamp(), body),
            ));
            self.storage.write_index(&board, &index)?;
            allocator.commit(&board, number)?;

            debug!(board = %board, thread_id = number, "thread created");
            Ok(number)
        })
    }

    /// Append a reply to a thread. Returns the reply's post number.
    ///
    /// A missing thread is a plain [`TermchanError::NotFound`]; neither the
    /// index nor the post counter is touched in that case.
    pub fn add_reply(&self, board: &str, thread_id: u64, body: &str) -> Result<u64> {
        validate_body(body)?;
        let board = normalize_board_name(board)?;

        self.storage.locks().with_board(&board, || -> Result<u64> {
            self.ensure_registered(&board)?;
            let mut index = self.storage.read_index(&board)?;
            let allocator = PostNumberAllocator::new(self.storage);
            let number = allocator.next_for(&board, &index)?;

            let thread = index.find_mut(thread_id).ok_or_else(|| {
                TermchanError::NotFound(format!("thread {thread_id} on /{board}/"))
            })?;
            thread.push_reply(Post::new(number, now_timestamp(), body));
            self.storage.write_index(&board, &index)?;
            allocator.commit(&board, number)?;

            debug!(board = %board, thread_id, number, "reply added");
            Ok(number)
        })
    }

    /// Get a single thread, or `None` if the board has no such thread.
    pub fn get_thread(&self, board: &str, thread_id: u64) -> Result<Option<Thread>> {
        let index = self.load(board)?;
        Ok(index.find(thread_id).cloned())
    }
}
