//! Persistence store for termchan.
//!
//! All state lives in JSON documents under a root directory:
//!
//! ```text
//! {root}/
//! ├── boardlist          {"name": "description", ...}
//! ├── postnums           {"name": highest_post_number, ...}
//! └── boards/
//!     └── {name}/
//!         └── index      [[thread_id, subject, [ts, no, body], ...], ...]
//! ```
//!
//! Documents are replaced atomically but the store has no transactions;
//! callers serialize read-modify-write cycles through [`BoardLocks`].

mod boardlist;
mod document;
mod lock;

pub use boardlist::{Boardlist, PostNumbers};
pub use document::{read_json, write_json};
pub use lock::BoardLocks;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
#[cfg(test)]
use std::sync::Mutex;

use tracing::{debug, info};

use crate::board::BoardIndex;
use crate::config::StorageConfig;
use crate::{Result, TermchanError};

/// Handle to a data directory.
///
/// Cheap to share behind an `Arc`; all methods take `&self`.
#[derive(Debug)]
pub struct Storage {
    boardlist_path: PathBuf,
    postnums_path: PathBuf,
    boards_dir: PathBuf,
    locks: BoardLocks,
    #[cfg(test)]
    faults: Mutex<Vec<WriteFault>>,
}

/// Planned failure of a document write, used to exercise rollback paths.
#[cfg(test)]
#[derive(Debug)]
struct WriteFault {
    path: PathBuf,
    skip: usize,
}

impl Storage {
    /// Open (or initialize) a data directory with default document paths.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        Self::from_config(&StorageConfig::new(root.as_ref().to_string_lossy()))
    }

    /// Open (or initialize) the data directory described by `config`.
    ///
    /// Missing directories are created and missing board list / post number
    /// documents are written empty. Existing documents are left untouched.
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        let storage = Self {
            boardlist_path: config.boardlist_path(),
            postnums_path: config.postnums_path(),
            boards_dir: config.boards_dir(),
            locks: BoardLocks::new(),
            #[cfg(test)]
            faults: Mutex::default(),
        };
        info!("Opening board storage at {:?}", config.root);

        fs::create_dir_all(&storage.boards_dir)?;
        for path in [&storage.boardlist_path, &storage.postnums_path] {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
        }

        if !storage.boardlist_path.exists() {
            debug!("Creating empty board list at {:?}", storage.boardlist_path);
            storage.write_boardlist(&Boardlist::default())?;
        }
        if !storage.postnums_path.exists() {
            debug!("Creating empty post numbers at {:?}", storage.postnums_path);
            storage.write_postnums(&PostNumbers::new())?;
        }

        Ok(storage)
    }

    /// Lock table shared by every component using this storage.
    pub fn locks(&self) -> &BoardLocks {
        &self.locks
    }

    pub fn read_boardlist(&self) -> Result<Boardlist> {
        read_json(&self.boardlist_path, "board list")?.ok_or_else(|| {
            TermchanError::StorageCorrupt(format!(
                "board list {:?} is missing",
                self.boardlist_path
            ))
        })
    }

    pub fn write_boardlist(&self, list: &Boardlist) -> Result<()> {
        self.check_fault(&self.boardlist_path)?;
        write_json(&self.boardlist_path, list)
    }

    pub fn read_postnums(&self) -> Result<PostNumbers> {
        read_json(&self.postnums_path, "post numbers")?.ok_or_else(|| {
            TermchanError::StorageCorrupt(format!(
                "post numbers {:?} are missing",
                self.postnums_path
            ))
        })
    }

    pub fn write_postnums(&self, postnums: &PostNumbers) -> Result<()> {
        self.check_fault(&self.postnums_path)?;
        write_json(&self.postnums_path, postnums)
    }

    /// Directory of one board.
    pub fn board_dir(&self, name: &str) -> PathBuf {
        self.boards_dir.join(name)
    }

    /// Path of a board's index document.
    pub fn index_path(&self, name: &str) -> PathBuf {
        self.board_dir(name).join("index")
    }

    /// Read and validate a board's index document.
    ///
    /// A registered board always has an index, so a missing document is
    /// reported as corruption.
    pub fn read_index(&self, name: &str) -> Result<BoardIndex> {
        let what = format!("index of /{name}/");
        let index: BoardIndex = read_json(&self.index_path(name), &what)?
            .ok_or_else(|| TermchanError::StorageCorrupt(format!("{what} is missing")))?;
        index
            .validate()
            .map_err(|e| TermchanError::StorageCorrupt(format!("{what}: {e}")))?;
        Ok(index)
    }

    /// Write a board's index document, creating the board directory if needed.
    pub fn write_index(&self, name: &str, index: &BoardIndex) -> Result<()> {
        fs::create_dir_all(self.board_dir(name))?;
        write_json(&self.index_path(name), index)
    }

    /// Make one later write of the document at `path` fail, after `skip`
    /// writes to it have gone through.
    #[cfg(test)]
    pub(crate) fn fail_write(&self, path: impl Into<PathBuf>, skip: usize) {
        let mut faults = self.faults.lock().unwrap();
        faults.push(WriteFault {
            path: path.into(),
            skip,
        });
    }

    #[cfg(test)]
    fn check_fault(&self, path: &Path) -> Result<()> {
        let mut faults = self.faults.lock().unwrap();
        let Some(pos) = faults.iter().position(|f| f.path == path) else {
            return Ok(());
        };
        if faults[pos].skip > 0 {
            faults[pos].skip -= 1;
            return Ok(());
        }
        faults.remove(pos);
        Err(io::Error::other(format!("injected write failure: {path:?}")).into())
    }

    #[cfg(not(test))]
    fn check_fault(&self, _path: &Path) -> Result<()> {
        Ok(())
    }

    /// Remove a board's directory with everything in it.
    ///
    /// Returns `false` if there was nothing to remove.
    pub fn remove_board_dir(&self, name: &str) -> Result<bool> {
        match fs::remove_dir_all(self.board_dir(name)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
