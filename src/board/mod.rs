//! Board module for termchan.
//!
//! This module provides the board engine:
//! - Board registry (add, rename, delete, list)
//! - Per-board post number allocation
//! - Thread index (threads and replies of a board)
//! - Pagination of a board's threads

mod allocator;
pub mod pagination;
mod registry;
mod thread_index;
mod types;

pub use allocator::PostNumberAllocator;
pub use pagination::{all_posts_of, page_count, paginate, Page};
pub use registry::BoardRegistry;
pub use thread_index::ThreadIndex;
pub use types::{normalize_board_name, Board, BoardIndex, Post, Thread};
