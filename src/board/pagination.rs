//! Selecting which threads to show on a board page.
//!
//! Pages are 1-based windows over the index in insertion order. Only the
//! set of threads is paged; a thread on the page always carries all of its
//! replies.

use super::types::{BoardIndex, Post, Thread};

/// Threads on `page` of the board.
///
/// The window is `[page_size * (page - 1), page_size * page)`. Pages below 1,
/// pages past the end and a zero page size give an empty slice, which a
/// display layer treats as "no more threads".
pub fn paginate(index: &BoardIndex, page: i64, page_size: usize) -> &[Thread] {
    let threads = index.threads();
    if page < 1 || page_size == 0 {
        return &[];
    }

    let start = usize::try_from(page - 1)
        .ok()
        .and_then(|p| p.checked_mul(page_size));
    match start {
        Some(start) if start < threads.len() => {
            let end = start.saturating_add(page_size).min(threads.len());
            &threads[start..end]
        }
        _ => &[],
    }
}

/// Number of non-empty pages (0 for an empty board).
pub fn page_count(index: &BoardIndex, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    index.len().div_ceil(page_size)
}

/// Every post of a thread for the single-thread view: the originating post
/// followed by the replies in arrival order.
pub fn all_posts_of(thread: &Thread) -> &[Post] {
    thread.posts()
}

/// One board page with enough context for a status line.
#[derive(Debug, Clone, Copy)]
pub struct Page<'a> {
    /// Threads shown on this page.
    pub threads: &'a [Thread],
    /// Requested page number.
    pub number: i64,
    /// Total number of non-empty pages.
    pub total_pages: usize,
}

impl<'a> Page<'a> {
    /// Build the page `number` of `index`.
    pub fn of(index: &'a BoardIndex, number: i64, page_size: usize) -> Self {
        Self {
            threads: paginate(index, number, page_size),
            number,
            total_pages: page_count(index, page_size),
        }
    }

    /// Check if the page has no threads.
    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }

    /// Check if a later page has threads. Always false for pages below 1.
    pub fn has_next(&self) -> bool {
        self.number >= 1 && (self.number as u64) < self.total_pages as u64
    }
}
