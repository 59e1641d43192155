//! JSON document reads and atomic writes.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::{Result, TermchanError};

/// Read and parse a JSON document.
///
/// Returns `Ok(None)` if the file does not exist. Parse failures are
/// reported as [`TermchanError::StorageCorrupt`] tagged with `what`.
pub fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<Option<T>> {
    let content = match fs::read(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    serde_json::from_slice(&content)
        .map(Some)
        .map_err(|e| TermchanError::StorageCorrupt(format!("{what} ({}): {e}", path.display())))
}

/// Replace a JSON document atomically.
///
/// The value is written to a temporary file in the target's directory,
/// synced, then renamed over the target. Readers see either the old or the
/// new document, never a partial one. The parent directory must exist.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut writer, formatter);
        value
            .serialize(&mut ser)
            .map_err(|e| TermchanError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))?;
        writer.write_all(b"\n")?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;

    Ok(())
}
