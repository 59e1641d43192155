//! Board registry: adding, renaming, deleting and listing boards.
//!
//! A board consists of three pieces of state: its board list entry, its
//! post counter and its index document. The board list entry is always the
//! last thing written when a board appears and the first thing removed when
//! it goes away, so a board is visible only while all three exist.

use tracing::{info, warn};

use super::types::{normalize_board_name, Board, BoardIndex};
use crate::store::Storage;
use crate::{Result, TermchanError};

/// Registry of boards backed by the board list document.
pub struct BoardRegistry<'a> {
    storage: &'a Storage,
}

impl<'a> BoardRegistry<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// All boards in registry (insertion) order.
    pub fn list(&self) -> Result<Vec<Board>> {
        Ok(self.storage.read_boardlist()?.boards().to_vec())
    }

    /// Look up a board by name (case-insensitive).
    pub fn get(&self, name: &str) -> Result<Option<Board>> {
        let name = normalize_board_name(name)?;
        Ok(self.storage.read_boardlist()?.get(&name).cloned())
    }

    /// Check if a board exists.
    pub fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.get(name)?.is_some())
    }

    /// Create a board with an empty index and a zeroed post counter.
    pub fn add(&self, name: &str, description: &str) -> Result<Board> {
        let name = normalize_board_name(name)?;
        let board = Board::new(name.clone(), description);
        let locks = self.storage.locks();

        locks.with_board(&name, || -> Result<Board> {
            if self.storage.read_boardlist()?.contains(&name) {
                return Err(TermchanError::AlreadyExists(format!("board /{name}/")));
            }

            self.storage.write_index(&name, &BoardIndex::new())?;

            let counter = locks.with_catalog(|| -> Result<()> {
                let mut postnums = self.storage.read_postnums()?;
                postnums.insert(name.clone(), 0);
                self.storage.write_postnums(&postnums)
            });
            if let Err(e) = counter {
                self.discard_dir(&name);
                return Err(e);
            }

            let registered = locks.with_catalog(|| -> Result<()> {
                let mut list = self.storage.read_boardlist()?;
                list.insert(board.clone());
                self.storage.write_boardlist(&list)
            });
            if let Err(e) = registered {
                self.discard_counter(&name);
                self.discard_dir(&name);
                return Err(e);
            }

            info!("Board {} added", board);
            Ok(board.clone())
        })
    }

    /// Delete a board together with its index and post counter.
    ///
    /// The board list entry goes first; once it is gone the board no longer
    /// exists and failures removing the leftovers are only logged. A later
    /// `add` of the same name overwrites them.
    pub fn delete(&self, name: &str) -> Result<()> {
        let name = normalize_board_name(name)?;
        let locks = self.storage.locks();

        locks.with_board(&name, || -> Result<()> {
            locks.with_catalog(|| -> Result<()> {
                let mut list = self.storage.read_boardlist()?;
                if list.remove(&name).is_none() {
                    return Err(TermchanError::NotFound(format!("board /{name}/")));
                }
                self.storage.write_boardlist(&list)
            })?;

            self.discard_counter(&name);
            self.discard_dir(&name);

            info!("Board /{}/ deleted", name);
            Ok(())
        })
    }

    /// Rename a board and replace its description.
    ///
    /// An empty `new_description` keeps the current one. The board keeps its
    /// position in the registry order. Steps, in order:
    ///
    /// 1. copy the index to the new name
    /// 2. move the post counter to the new name
    /// 3. replace the board list entry (commit point)
    /// 4. remove the old board directory
    ///
    /// A failure before step 3 undoes the earlier steps and returns the
    /// original error. If undoing fails too, [`TermchanError::StorageCorrupt`]
    /// describes what has to be repaired by hand.
    pub fn rename(&self, old_name: &str, new_name: &str, new_description: &str) -> Result<Board> {
        let old = normalize_board_name(old_name)?;
        let new = normalize_board_name(new_name)?;
        let locks = self.storage.locks();

        locks.with_boards(&[old.as_str(), new.as_str()], || -> Result<Board> {
            let list = self.storage.read_boardlist()?;
            let current = list
                .get(&old)
                .ok_or_else(|| TermchanError::NotFound(format!("board /{old}/")))?;
            let description = if new_description.is_empty() {
                current.description.clone()
            } else {
                new_description.to_string()
            };
            let renamed = Board::new(new.clone(), description);

            if old == new {
                self.replace_entry(&old, &renamed)?;
                info!("Board /{}/ description updated", old);
                return Ok(renamed);
            }
            if list.contains(&new) {
                return Err(TermchanError::AlreadyExists(format!("board /{new}/")));
            }

            let index = self.storage.read_index(&old)?;
            if let Err(e) = self.storage.write_index(&new, &index) {
                self.discard_dir(&new);
                return Err(e);
            }

            if let Err(e) = self.move_counter(&old, &new) {
                self.discard_dir(&new);
                return Err(e);
            }

            if let Err(e) = self.replace_entry(&old, &renamed) {
                if let Err(undo) = self.move_counter(&new, &old) {
                    return Err(TermchanError::StorageCorrupt(format!(
                        "rename of /{old}/ to /{new}/ failed ({e}) and the post counter \
                         could not be moved back ({undo}); postnums needs key {new:?} \
                         renamed to {old:?}"
                    )));
                }
                self.discard_dir(&new);
                return Err(e);
            }

            if let Err(e) = self.storage.remove_board_dir(&old) {
                warn!("Board /{}/ renamed but old directory not removed: {}", old, e);
            }

            info!("Board /{}/ renamed to {}", old, renamed);
            Ok(renamed)
        })
    }

    fn replace_entry(&self, name: &str, board: &Board) -> Result<()> {
        self.storage.locks().with_catalog(|| -> Result<()> {
            let mut list = self.storage.read_boardlist()?;
            if !list.replace(name, board.clone()) {
                return Err(TermchanError::NotFound(format!("board /{name}/")));
            }
            self.storage.write_boardlist(&list)
        })
    }

    fn move_counter(&self, from: &str, to: &str) -> Result<()> {
        self.storage.locks().with_catalog(|| -> Result<()> {
            let mut postnums = self.storage.read_postnums()?;
            let value = postnums.remove(from).ok_or_else(|| {
                TermchanError::StorageCorrupt(format!("post counter for /{from}/ is missing"))
            })?;
            postnums.insert(to.to_string(), value);
            self.storage.write_postnums(&postnums)
        })
    }

    // Best-effort cleanup of state no board list entry refers to.
    fn discard_counter(&self, name: &str) {
        let result = self.storage.locks().with_catalog(|| -> Result<()> {
            let mut postnums = self.storage.read_postnums()?;
            if postnums.remove(name).is_some() {
                self.storage.write_postnums(&postnums)?;
            }
            Ok(())
        });
        if let Err(e) = result {
            warn!("Could not remove post counter of /{}/: {}", name, e);
        }
    }

    fn discard_dir(&self, name: &str) {
        if let Err(e) = self.storage.remove_board_dir(name) {
            warn!("Could not remove directory of /{}/: {}", name, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::ThreadIndex;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Storage) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::open(dir.path()).unwrap();
        (dir, storage)
    }

    fn names(registry: &BoardRegistry<'_>) -> Vec<String> {
        registry.list().unwrap().into_iter().map(|b| b.name).collect()
    }

    #[test]
    fn test_add_board() {
        let (_dir, storage) = setup();
        let registry = BoardRegistry::new(&storage);

        let board = registry.add("G", "Technology").unwrap();

        assert_eq!(board, Board::new("g", "Technology"));
        assert!(registry.exists("g").unwrap());
        assert!(registry.exists("G").unwrap());
        assert_eq!(storage.read_postnums().unwrap()["g"], 0);
        assert!(storage.read_index("g").unwrap().is_empty());
    }

    #[test]
    fn test_add_duplicate_case_insensitive() {
        let (_dir, storage) = setup();
        let registry = BoardRegistry::new(&storage);

        registry.add("tech", "Technology").unwrap();
        let result = registry.add("TECH", "again");

        assert!(matches!(result, Err(TermchanError::AlreadyExists(_))));
        assert_eq!(registry.get("tech").unwrap().unwrap().description, "Technology");
    }

    #[test]
    fn test_add_invalid_name() {
        let (_dir, storage) = setup();
        let registry = BoardRegistry::new(&storage);

        assert!(matches!(registry.add("", "x"), Err(TermchanError::InvalidInput(_))));
        assert!(matches!(registry.add("a/b", "x"), Err(TermchanError::InvalidInput(_))));
        assert!(registry.list().unwrap().is_empty());
    }

    #[test]
    fn test_list_insertion_order() {
        let (_dir, storage) = setup();
        let registry = BoardRegistry::new(&storage);

        registry.add("z", "zed").unwrap();
        registry.add("a", "ay").unwrap();
        registry.add("m", "em").unwrap();

        assert_eq!(names(&registry), ["z", "a", "m"]);
    }

    #[test]
    fn test_delete_board() {
        let (_dir, storage) = setup();
        let registry = BoardRegistry::new(&storage);
        registry.add("a", "first").unwrap();
        registry.add("b", "second").unwrap();

        registry.delete("A").unwrap();

        assert_eq!(names(&registry), ["b"]);
        assert!(!storage.read_postnums().unwrap().contains_key("a"));
        assert!(!storage.board_dir("a").exists());
        assert!(registry.delete("a").unwrap_err().is_not_found());
    }

    #[test]
    fn test_readd_after_delete_starts_fresh() {
        let (_dir, storage) = setup();
        let registry = BoardRegistry::new(&storage);
        let threads = ThreadIndex::new(&storage);

        registry.add("a", "first").unwrap();
        threads.add_thread("a", "s", "body").unwrap();
        registry.delete("a").unwrap();
        registry.add("a", "again").unwrap();

        assert!(threads.load("a").unwrap().is_empty());
        assert_eq!(storage.read_postnums().unwrap()["a"], 0);
    }

    #[test]
    fn test_rename_moves_everything() {
        let (_dir, storage) = setup();
        let registry = BoardRegistry::new(&storage);
        let threads = ThreadIndex::new(&storage);
        registry.add("first", "1").unwrap();
        registry.add("a", "old desc").unwrap();
        registry.add("last", "3").unwrap();
        let id = threads.add_thread("a", "subject", "body").unwrap();
        let before = threads.get_thread("a", id).unwrap().unwrap();

        let board = registry.rename("a", "B", "new desc").unwrap();

        assert_eq!(board, Board::new("b", "new desc"));
        assert_eq!(names(&registry), ["first", "b", "last"]);
        assert!(registry.get("a").unwrap().is_none());
        assert_eq!(threads.get_thread("b", id).unwrap().unwrap(), before);
        let postnums = storage.read_postnums().unwrap();
        assert_eq!(postnums["b"], 1);
        assert!(!postnums.contains_key("a"));
        assert!(!storage.board_dir("a").exists());
    }

    #[test]
    fn test_rename_keeps_description_when_empty() {
        let (_dir, storage) = setup();
        let registry = BoardRegistry::new(&storage);
        registry.add("a", "keep me").unwrap();

        let board = registry.rename("a", "b", "").unwrap();
        assert_eq!(board.description, "keep me");
    }

    #[test]
    fn test_rename_same_name_updates_description() {
        let (_dir, storage) = setup();
        let registry = BoardRegistry::new(&storage);
        let threads = ThreadIndex::new(&storage);
        registry.add("a", "old").unwrap();
        let id = threads.add_thread("a", "s", "b").unwrap();

        registry.rename("a", "A", "new").unwrap();

        assert_eq!(registry.get("a").unwrap().unwrap().description, "new");
        assert!(threads.get_thread("a", id).unwrap().is_some());
    }

    #[test]
    fn test_rename_errors() {
        let (_dir, storage) = setup();
        let registry = BoardRegistry::new(&storage);
        registry.add("a", "1").unwrap();
        registry.add("b", "2").unwrap();

        assert!(registry.rename("x", "y", "d").unwrap_err().is_not_found());
        assert!(matches!(
            registry.rename("a", "b", "d"),
            Err(TermchanError::AlreadyExists(_))
        ));
        assert!(matches!(
            registry.rename("a", "", "d"),
            Err(TermchanError::InvalidInput(_))
        ));
        assert_eq!(names(&registry), ["a", "b"]);
    }

    #[test]
    fn test_rename_corrupt_index_leaves_board_untouched() {
        let (_dir, storage) = setup();
        let registry = BoardRegistry::new(&storage);
        registry.add("a", "1").unwrap();
        std::fs::write(storage.index_path("a"), "not json").unwrap();

        assert!(matches!(
            registry.rename("a", "b", ""),
            Err(TermchanError::StorageCorrupt(_))
        ));
        assert_eq!(names(&registry), ["a"]);
        assert!(storage.read_postnums().unwrap().contains_key("a"));
        assert!(!storage.board_dir("b").exists());
    }

    fn rename_fixture() -> (TempDir, Storage, BoardIndex, u64) {
        let (dir, storage) = setup();
        BoardRegistry::new(&storage).add("a", "first").unwrap();
        let threads = ThreadIndex::new(&storage);
        let id = threads.add_thread("a", "s", "op").unwrap();
        threads.add_reply("a", id, "re").unwrap();
        let index = storage.read_index("a").unwrap();
        let counter = storage.read_postnums().unwrap()["a"];
        (dir, storage, index, counter)
    }

    fn assert_not_renamed(storage: &Storage, index: &BoardIndex, counter: u64) {
        let registry = BoardRegistry::new(storage);
        assert_eq!(names(&registry), ["a"]);
        assert_eq!(registry.get("a").unwrap().unwrap().description, "first");
        assert_eq!(storage.read_index("a").unwrap(), *index);
        let postnums = storage.read_postnums().unwrap();
        assert_eq!(postnums.get("a"), Some(&counter));
        assert!(!postnums.contains_key("b"));
        assert!(!storage.board_dir("b").exists());
    }

    #[test]
    fn test_rename_counter_write_failure_rolls_back() {
        let (dir, storage, index, counter) = rename_fixture();
        storage.fail_write(dir.path().join("postnums"), 0);

        let result = BoardRegistry::new(&storage).rename("a", "b", "second");

        assert!(matches!(result, Err(TermchanError::Io(_))));
        assert_not_renamed(&storage, &index, counter);
    }

    #[test]
    fn test_rename_board_list_write_failure_rolls_back() {
        let (dir, storage, index, counter) = rename_fixture();
        storage.fail_write(dir.path().join("boardlist"), 0);

        let result = BoardRegistry::new(&storage).rename("a", "b", "second");

        assert!(matches!(result, Err(TermchanError::Io(_))));
        assert_not_renamed(&storage, &index, counter);

        // The board is fully usable under its old name afterwards.
        let registry = BoardRegistry::new(&storage);
        registry.rename("a", "b", "second").unwrap();
        assert_eq!(names(&registry), ["b"]);
        assert_eq!(storage.read_postnums().unwrap()["b"], counter);
    }

    #[test]
    fn test_rename_failed_undo_is_reported_as_corrupt() {
        let (dir, storage, index, counter) = rename_fixture();
        storage.fail_write(dir.path().join("boardlist"), 0);
        // The forward counter move succeeds, moving it back fails.
        storage.fail_write(dir.path().join("postnums"), 1);

        let result = BoardRegistry::new(&storage).rename("a", "b", "second");

        match result {
            Err(TermchanError::StorageCorrupt(msg)) => {
                assert!(msg.contains("postnums"), "{msg}");
                assert!(msg.contains("/a/") && msg.contains("/b/"), "{msg}");
            }
            other => panic!("expected StorageCorrupt, got {other:?}"),
        }

        // The board list was never changed; the counter sits under the new
        // name as the error describes.
        let registry = BoardRegistry::new(&storage);
        assert_eq!(names(&registry), ["a"]);
        assert_eq!(storage.read_index("a").unwrap(), index);
        let postnums = storage.read_postnums().unwrap();
        assert_eq!(postnums.get("b"), Some(&counter));
        assert!(!postnums.contains_key("a"));
    }
}
