//! Board list and post number documents.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::board::Board;

/// Per-board post number counters, `{"board": highest_number}`.
pub type PostNumbers = BTreeMap<String, u64>;

/// Registered boards in registry order.
///
/// Stored as a JSON object `{"name": "description", ...}`; key order in the
/// file is the registry order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Boardlist {
    boards: Vec<Board>,
}

impl Boardlist {
    /// Boards in registry order.
    pub fn boards(&self) -> &[Board] {
        &self.boards
    }

    pub fn get(&self, name: &str) -> Option<&Board> {
        self.boards.iter().find(|b| b.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Append a board. Returns false if the name is already present.
    pub fn insert(&mut self, board: Board) -> bool {
        if self.contains(&board.name) {
            return false;
        }
        self.boards.push(board);
        true
    }

    /// Remove a board, keeping the order of the rest.
    pub fn remove(&mut self, name: &str) -> Option<Board> {
        let pos = self.boards.iter().position(|b| b.name == name)?;
        Some(self.boards.remove(pos))
    }

    /// Replace the entry for `name` in place. Returns false if absent.
    pub fn replace(&mut self, name: &str, board: Board) -> bool {
        match self.boards.iter_mut().find(|b| b.name == name) {
            Some(entry) => {
                *entry = board;
                true
            }
            None => false,
        }
    }
}

impl Serialize for Boardlist {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.boards.len()))?;
        for board in &self.boards {
            map.serialize_entry(&board.name, &board.description)?;
        }
        map.end()
    }
}

struct BoardlistVisitor;

impl<'de> Visitor<'de> for BoardlistVisitor {
    type Value = Boardlist;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of board names to descriptions")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Boardlist, A::Error> {
        let mut list = Boardlist::default();
        while let Some((name, description)) = access.next_entry::<String, String>()? {
            if !list.insert(Board::new(name.clone(), description)) {
                return Err(de::Error::custom(format!("duplicate board {name:?}")));
            }
        }
        Ok(list)
    }
}

impl<'de> Deserialize<'de> for Boardlist {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(BoardlistVisitor)
    }
}
