//! Append-only log of preference data the store could not keep.
//!
//! Every value the reconciler discards, and every state file that could not
//! be parsed, is written here before the store moves on. Entries are plain
//! markdown so the log can be read without the CLI:
//!
//! ~~~text
//! ## 2026-03-01T09:12:44Z [migration] discarded array at settings
//!
//! Path: settings
//! Found: array
//!
//! ```json
//! [ ... ]
//! ```
//!
//! ---
//! ~~~

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::warn;

use crate::io::lock::StoreLock;
use crate::io::state_io::atomic_write;
use crate::ops::reconcile::Discarded;

pub const RECOVERY_LOG: &str = ".recovery.log";

/// Entries older than this are removed by a default prune.
pub const PRUNE_AGE_DAYS: i64 = 30;

const FILE_HEADER: &str = "\
<!-- prefmend recovery log: preference values removed from the store.
     View with: prefmend recovery
     Prune old entries: prefmend recovery prune -->

";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryCategory {
    /// The state file was not valid JSON.
    Parser,
    /// A stale value was dropped during reconciliation.
    Migration,
}

impl fmt::Display for RecoveryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryCategory::Parser => f.write_str("parser"),
            RecoveryCategory::Migration => f.write_str("migration"),
        }
    }
}

impl RecoveryCategory {
    pub fn parse_category(s: &str) -> Option<Self> {
        match s {
            "parser" => Some(RecoveryCategory::Parser),
            "migration" => Some(RecoveryCategory::Migration),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecoveryEntry {
    pub timestamp: DateTime<Utc>,
    pub category: RecoveryCategory,
    pub description: String,
    pub fields: Vec<(String, String)>,
    /// Verbatim data (JSON for migrations, raw file text for parser entries).
    pub body: String,
}

pub fn recovery_log_path(store_dir: &Path) -> PathBuf {
    store_dir.join(RECOVERY_LOG)
}

impl RecoveryEntry {
    fn render(&self) -> String {
        let mut out = format!(
            "## {} [{}] {}\n\n",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.category,
            self.description
        );
        for (key, value) in &self.fields {
            out.push_str(&format!("{}: {}\n", key, value));
        }
        if !self.body.is_empty() {
            let lang = match self.category {
                RecoveryCategory::Migration => "json",
                RecoveryCategory::Parser => "text",
            };
            let fence = fence_for(&self.body);
            out.push_str(&format!("\n{}{}\n{}", fence, lang, self.body));
            if !self.body.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&fence);
            out.push('\n');
        }
        out.push_str("\n---\n");
        out
    }

    pub fn to_json(&self) -> serde_json::Value {
        let fields: serde_json::Map<String, serde_json::Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect();
        serde_json::json!({
            "timestamp": self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            "category": self.category.to_string(),
            "description": self.description,
            "fields": fields,
            "body": self.body,
        })
    }

    pub fn to_display_markdown(&self) -> String {
        self.render()
    }
}

/// A backtick fence longer than any backtick run inside `body`, at least three.
fn fence_for(body: &str) -> String {
    let longest = body
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    "`".repeat(longest.max(2) + 1)
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Append an entry. Failures are logged and otherwise ignored: losing an
/// audit entry must never abort a session.
pub fn log_recovery(store_dir: &Path, entry: RecoveryEntry) {
    if let Err(e) = append(store_dir, &entry) {
        warn!(error = %e, "could not write to recovery log");
    }
}

fn append(store_dir: &Path, entry: &RecoveryEntry) -> io::Result<()> {
    let path = recovery_log_path(store_dir);
    let is_new = fs::metadata(&path).map_or(true, |m| m.len() == 0);
    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    if is_new {
        file.write_all(FILE_HEADER.as_bytes())?;
    }
    file.write_all(entry.render().as_bytes())
}

/// Record a value the reconciler removed from the stored tree.
pub fn log_discarded(store_dir: &Path, state_file: &str, discarded: &Discarded) {
    let body = serde_json::to_string_pretty(&discarded.value).unwrap_or_else(|_| discarded.value.to_string());
    log_recovery(
        store_dir,
        RecoveryEntry {
            timestamp: Utc::now(),
            category: RecoveryCategory::Migration,
            description: format!("discarded {} at {}", discarded.value.kind(), discarded.path),
            fields: vec![
                ("Path".to_string(), discarded.path.to_string()),
                ("Found".to_string(), discarded.value.kind().to_string()),
                ("Source".to_string(), state_file.to_string()),
            ],
            body,
        },
    );
}

/// Record a state file that could not be parsed.
pub fn log_unparseable(store_dir: &Path, state_file: &str, raw: &str, error: &str) {
    log_recovery(
        store_dir,
        RecoveryEntry {
            timestamp: Utc::now(),
            category: RecoveryCategory::Parser,
            description: format!("unreadable {}", state_file),
            fields: vec![
                ("Source".to_string(), state_file.to_string()),
                ("Error".to_string(), error.to_string()),
            ],
            body: raw.to_string(),
        },
    );
}

/// Whether the newest parser entry already holds `raw`. A state file that
/// stays broken across sessions is recorded once.
pub fn unparseable_already_logged(store_dir: &Path, raw: &str) -> bool {
    read_recovery_entries(store_dir, None, None)
        .into_iter()
        .find(|e| e.category == RecoveryCategory::Parser)
        .is_some_and(|e| e.body.trim_end_matches('\n') == raw.trim_end_matches('\n'))
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Entries newest first, optionally limited to the `limit` most recent and to
/// those at or after `since`.
pub fn read_recovery_entries(
    store_dir: &Path,
    limit: Option<usize>,
    since: Option<DateTime<Utc>>,
) -> Vec<RecoveryEntry> {
    let content = match fs::read_to_string(recovery_log_path(store_dir)) {
        Ok(c) => c,
        Err(_) => return Vec::new(),
    };
    let mut entries: Vec<RecoveryEntry> = parse_entries(&content)
        .into_iter()
        .filter(|e| since.is_none_or(|ts| e.timestamp >= ts))
        .collect();
    entries.reverse();
    if let Some(n) = limit {
        entries.truncate(n);
    }
    entries
}

fn parse_entries(content: &str) -> Vec<RecoveryEntry> {
    let mut entries = Vec::new();
    let mut current: Option<RecoveryEntry> = None;
    let mut fence: Option<&str> = None;

    for line in content.lines() {
        if let Some(open) = fence {
            if line == open {
                fence = None;
            } else if let Some(entry) = current.as_mut() {
                if !entry.body.is_empty() {
                    entry.body.push('\n');
                }
                entry.body.push_str(line);
            }
            continue;
        }
        if let Some(header) = line.strip_prefix("## ") {
            entries.extend(current.take());
            current = parse_header(header);
        } else if line == "---" {
            entries.extend(current.take());
        } else if line.starts_with("```") {
            if current.is_some() {
                let ticks = line.len() - line.trim_start_matches('`').len();
                fence = Some(&line[..ticks]);
            }
        } else if let (Some(entry), Some((key, value))) = (current.as_mut(), line.split_once(": ")) {
            entry.fields.push((key.to_string(), value.to_string()));
        }
    }
    entries.extend(current);
    entries
}

/// Parse `<rfc3339> [<category>] <description>`.
fn parse_header(header: &str) -> Option<RecoveryEntry> {
    let (ts, rest) = header.split_once(' ')?;
    let timestamp = DateTime::parse_from_rfc3339(ts).ok()?.with_timezone(&Utc);
    let rest = rest.strip_prefix('[')?;
    let (category, description) = rest.split_once("] ")?;
    Some(RecoveryEntry {
        timestamp,
        category: RecoveryCategory::parse_category(category)?,
        description: description.to_string(),
        fields: Vec::new(),
        body: String::new(),
    })
}

// ---------------------------------------------------------------------------
// Pruning
// ---------------------------------------------------------------------------

/// Remove entries older than `before` (default: [`PRUNE_AGE_DAYS`] ago), or
/// every entry with `all`. Holds the store lock while rewriting.
/// Returns the number of entries removed.
pub fn prune_recovery(
    store_dir: &Path,
    before: Option<DateTime<Utc>>,
    all: bool,
) -> io::Result<usize> {
    let path = recovery_log_path(store_dir);
    if !path.exists() {
        return Ok(0);
    }
    let _lock = StoreLock::acquire_default(store_dir)
        .map_err(|e| io::Error::new(io::ErrorKind::WouldBlock, e.to_string()))?;

    let entries = parse_entries(&fs::read_to_string(&path)?);
    let cutoff = before.unwrap_or_else(|| Utc::now() - chrono::Duration::days(PRUNE_AGE_DAYS));
    let kept: Vec<&RecoveryEntry> = entries
        .iter()
        .filter(|e| !all && e.timestamp >= cutoff)
        .collect();

    let mut content = String::from(FILE_HEADER);
    for entry in &kept {
        content.push_str(&entry.render());
    }
    atomic_write(&path, content.as_bytes())?;
    Ok(entries.len() - kept.len())
}
