//! Append-only JSONL logs under `<logDir>/<session>/<category>.jsonl`.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::io::session_file_stem;

/// Location of the `category` log for `session_id` under `log_dir`.
pub fn log_path(log_dir: &Path, session_id: &str, category: &str) -> PathBuf {
    log_dir
        .join(session_file_stem(session_id))
        .join(format!("{category}.jsonl"))
}

/// Append one record as a single JSON line.
///
/// The line is written with one `write_all` on an append-mode handle so
/// concurrent writers never interleave within a record.
pub fn append_record<T: Serialize>(path: &Path, record: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create log dir {}", parent.display()))?;
    }
    let mut line = serde_json::to_string(record).context("serialize log record")?;
    line.push('\n');
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log {}", path.display()))?;
    file.write_all(line.as_bytes())
        .with_context(|| format!("append log {}", path.display()))
}
