//! Board, thread and post models.
//!
//! The index document keeps the original on-disk layout: a board index is a
//! JSON array of threads, and each thread is a heterogeneous array
//!
//! ```text
//! [thread_id, "subject", [ts, no, "op body"], [ts, no, "reply"], ...]
//! ```
//!
//! so that existing data directories load unchanged.

use std::collections::HashSet;
use std::fmt;

use serde::de::{self, SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Result, TermchanError};

/// A registered board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    /// Board name (unique, lowercase).
    pub name: String,
    /// Board description.
    pub description: String,
}

impl Board {
    /// Create a board entry.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/ - {}", self.name, self.description)
    }
}

/// Normalize and validate a board name.
///
/// Names are lowercased. They double as directory names, so path separators,
/// whitespace, control characters and the `.`/`..` entries are rejected.
pub fn normalize_board_name(name: &str) -> Result<String> {
    let name = name.trim().to_lowercase();
    if name.is_empty() {
        return Err(TermchanError::InvalidInput(
            "board name is empty".to_string(),
        ));
    }
    if name == "." || name == ".." {
        return Err(TermchanError::InvalidInput(format!(
            "board name {name:?} is reserved"
        )));
    }
    if let Some(c) = name
        .chars()
        .find(|c| *c == '/' || *c == '\\' || c.is_whitespace() || c.is_control())
    {
        return Err(TermchanError::InvalidInput(format!(
            "board name {name:?} contains forbidden character {c:?}"
        )));
    }
    Ok(name)
}

/// A single post. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    /// Board-unique post number.
    pub sequence_number: u64,
    /// Creation time in unix seconds.
    pub timestamp: i64,
    /// Post text.
    pub body: String,
}

impl Post {
    /// Create a post.
    pub fn new(sequence_number: u64, timestamp: i64, body: impl Into<String>) -> Self {
        Self {
            sequence_number,
            timestamp,
            body: body.into(),
        }
    }
}

impl Serialize for Post {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        (self.timestamp, self.sequence_number, &self.body).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Post {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let (timestamp, sequence_number, body) = <(i64, u64, String)>::deserialize(deserializer)?;
        Ok(Self {
            sequence_number,
            timestamp,
            body,
        })
    }
}

/// A thread: the originating post followed by replies in arrival order.
///
/// The thread id is the originating post's number. `posts` is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thread {
    thread_id: u64,
    subject: String,
    posts: Vec<Post>,
}

impl Thread {
    /// Start a thread from its originating post.
    pub fn start(subject: impl Into<String>, original: Post) -> Self {
        Self {
            thread_id: original.sequence_number,
            subject: subject.into(),
            posts: vec![original],
        }
    }

    /// Thread id (the originating post's number).
    pub fn thread_id(&self) -> u64 {
        self.thread_id
    }

    /// Thread subject. May be empty.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// All posts, originating post first.
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    /// The originating post.
    pub fn original_post(&self) -> &Post {
        &self.posts[0]
    }

    /// Replies in arrival order.
    pub fn replies(&self) -> &[Post] {
        &self.posts[1..]
    }

    /// Number of replies, shown as "N posts hidden" on the board view.
    pub fn reply_count(&self) -> usize {
        self.posts.len() - 1
    }

    /// Highest post number in this thread.
    pub fn last_sequence_number(&self) -> u64 {
        self.posts
            .iter()
            .map(|p| p.sequence_number)
            .max()
            .unwrap_or(self.thread_id)
    }

    /// Append a reply.
    pub(crate) fn push_reply(&mut self, post: Post) {
        self.posts.push(post);
    }
}

impl Serialize for Thread {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.posts.len() + 2))?;
        seq.serialize_element(&self.thread_id)?;
        seq.serialize_element(&self.subject)?;
        for post in &self.posts {
            seq.serialize_element(post)?;
        }
        seq.end()
    }
}

struct ThreadVisitor;

impl<'de> Visitor<'de> for ThreadVisitor {
    type Value = Thread;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an array [thread_id, subject, post, replies...]")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Thread, A::Error> {
        let thread_id: u64 = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(0, &self))?;
        let subject: String = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(1, &self))?;
        let mut posts = Vec::new();
        while let Some(post) = seq.next_element::<Post>()? {
            posts.push(post);
        }

        let Some(first) = posts.first() else {
            return Err(de::Error::invalid_length(2, &self));
        };
        if thread_id == 0 {
            return Err(de::Error::custom("thread id must be positive"));
        }
        if first.sequence_number != thread_id {
            return Err(de::Error::custom(format!(
                "thread {thread_id} starts with post {}",
                first.sequence_number
            )));
        }

        Ok(Thread {
            thread_id,
            subject,
            posts,
        })
    }
}

impl<'de> Deserialize<'de> for Thread {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_seq(ThreadVisitor)
    }
}

/// Ordered threads of one board, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoardIndex {
    threads: Vec<Thread>,
}

impl BoardIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Threads in insertion order.
    pub fn threads(&self) -> &[Thread] {
        &self.threads
    }

    /// Number of threads.
    pub fn len(&self) -> usize {
        self.threads.len()
    }

    /// Check if the board has no threads.
    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }

    /// Find a thread by id (linear scan).
    pub fn find(&self, thread_id: u64) -> Option<&Thread> {
        self.threads.iter().find(|t| t.thread_id == thread_id)
    }

    pub(crate) fn find_mut(&mut self, thread_id: u64) -> Option<&mut Thread> {
        self.threads.iter_mut().find(|t| t.thread_id == thread_id)
    }

    /// Append a new thread at the end.
    pub(crate) fn push(&mut self, thread: Thread) {
        self.threads.push(thread);
    }

    /// Highest post number stored in this index (0 when empty).
    pub fn max_sequence_number(&self) -> u64 {
        self.threads
            .iter()
            .map(Thread::last_sequence_number)
            .max()
            .unwrap_or(0)
    }

    /// Check cross-thread invariants: thread ids and post numbers are unique.
    ///
    /// Per-thread shape is already enforced while deserializing.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let mut numbers = HashSet::new();
        for thread in &self.threads {
            for post in &thread.posts {
                if !numbers.insert(post.sequence_number) {
                    return Err(format!(
                        "post number {} appears more than once",
                        post.sequence_number
                    ));
                }
            }
        }
        Ok(())
    }
}
