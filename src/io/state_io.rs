use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::io::store::StoreError;
use crate::model::value::PrefValue;

/// What was found at the state file path.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredState {
    /// No file yet (fresh install).
    Absent,
    Parsed(PrefValue),
    /// The file exists but is not JSON. Kept verbatim so it can be logged.
    Unparseable { raw: String, error: String },
}

/// Read the persisted user object. A missing file is `Absent`, not an error.
pub fn read_state(path: &Path) -> Result<StoredState, StoreError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(StoredState::Absent),
        Err(e) => {
            return Err(StoreError::ReadError {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };
    match serde_json::from_str::<PrefValue>(&raw) {
        Ok(tree) => Ok(StoredState::Parsed(tree)),
        Err(e) => Ok(StoredState::Unparseable {
            raw,
            error: e.to_string(),
        }),
    }
}

/// Replace the persisted user object with `tree`, in full.
pub fn write_state(path: &Path, tree: &PrefValue) -> Result<(), StoreError> {
    let mut content = serde_json::to_string_pretty(tree)?;
    content.push('\n');
    atomic_write(path, content.as_bytes()).map_err(|e| StoreError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Write `content` to `path` through a temp file in the same directory and
/// a rename, so readers see either the old file or the new one.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
