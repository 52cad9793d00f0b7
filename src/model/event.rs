use std::fmt;

use serde::Serialize;

use super::schema::FieldPath;
use super::value::{PrefValue, ValueKind};

/// One structural change made while reconciling a persisted tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ChangeEvent {
    /// A field missing from the persisted tree was filled with its default.
    FieldAdded { path: FieldPath, value: PrefValue },
    /// A persisted value had a stale shape and was discarded.
    FormatMigrated { path: FieldPath, found: ValueKind },
}

impl ChangeEvent {
    pub fn path(&self) -> &FieldPath {
        match self {
            ChangeEvent::FieldAdded { path, .. } | ChangeEvent::FormatMigrated { path, .. } => path,
        }
    }
}

impl fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeEvent::FieldAdded { path, value } => write!(f, "added {} = {}", path, value),
            ChangeEvent::FormatMigrated { path, found } => {
                write!(f, "migrated {} (was {})", path, found)
            }
        }
    }
}
