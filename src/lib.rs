//! termchan - text-only bulletin board engine.
//!
//! Boards, threads and posts stored as JSON documents, with per-board post
//! numbering and page selection for terminal display.

pub mod board;
pub mod config;
pub mod datetime;
pub mod error;
pub mod logging;
pub mod store;

pub use board::{
    all_posts_of, page_count, paginate, Board, BoardIndex, BoardRegistry, Page, Post,
    PostNumberAllocator, Thread, ThreadIndex,
};
pub use config::Config;
pub use error::{Result, TermchanError};
pub use store::Storage;
