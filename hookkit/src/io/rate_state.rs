//! Per-session rate-limit counters (`<stateDir>/rate-limits/<session>.json`).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::io::session_file_stem;

/// Persisted counters for one session.
///
/// Counts only grow; they reset when the file is removed externally.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RateCounters {
    /// Tool calls permitted so far.
    pub total_calls: u64,
    /// File-editing tool calls permitted so far.
    pub total_edits: u64,
}

/// Location of the counter file for `session_id` under `state_dir`.
pub fn counters_path(state_dir: &Path, session_id: &str) -> PathBuf {
    state_dir
        .join("rate-limits")
        .join(format!("{}.json", session_file_stem(session_id)))
}

/// Load counters from disk. A missing file means a fresh session.
pub fn load_counters(path: &Path) -> Result<RateCounters> {
    if !path.exists() {
        debug!(path = %path.display(), "no rate counters yet");
        return Ok(RateCounters::default());
    }
    let contents =
        fs::read_to_string(path).with_context(|| format!("read rate counters {}", path.display()))?;
    let counters: RateCounters = serde_json::from_str(&contents)
        .with_context(|| format!("parse rate counters {}", path.display()))?;
    debug!(total_calls = counters.total_calls, total_edits = counters.total_edits, "rate counters loaded");
    Ok(counters)
}

/// Atomically write counters to disk (temp file + rename).
pub fn write_counters(path: &Path, counters: &RateCounters) -> Result<()> {
    debug!(path = %path.display(), total_calls = counters.total_calls, total_edits = counters.total_edits, "writing rate counters");
    let mut buf = serde_json::to_string_pretty(counters)?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("rate counters path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension(format!("json.{}.tmp", std::process::id()));
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp rate counters {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path)
        .with_context(|| format!("replace rate counters {}", path.display()))?;
    Ok(())
}
