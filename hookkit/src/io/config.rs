//! Hook configuration stored in `.hookkit/config.json`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::core::merge::merge_validated;

/// Environment variable naming an override file.
pub const CONFIG_ENV: &str = "HOOKKIT_CONFIG";

/// Override file location relative to the project root.
pub const DEFAULT_CONFIG_RELATIVE: &str = ".hookkit/config.json";

/// Lower bounds for integer fields (dotted path, minimum).
///
/// Integer fields not listed here only need to be non-negative.
pub const FIELD_MINIMUMS: &[(&str, u64)] = &[
    ("guards.diffSize.maxLines", 1),
    ("validators.timeoutSecs", 1),
    ("validators.outputLimitBytes", 1),
    ("context.gitContext.recentCommits", 1),
];

/// Resolved hook configuration.
///
/// Every field always holds a well-typed value: user overrides are merged
/// field by field and invalid fields keep their default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Root for JSONL event logs (relative paths resolve against the event cwd).
    pub log_dir: String,
    /// Root for per-session state such as rate-limit counters.
    pub state_dir: String,
    /// Emit debug tracing on stderr.
    pub verbose: bool,
    pub guards: GuardsConfig,
    pub rate_limiter: RateLimiterConfig,
    pub validators: ValidatorsConfig,
    pub trackers: TrackersConfig,
    pub context: ContextConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct GuardsConfig {
    pub tool_permissions: ToolPermissionsConfig,
    pub command_guard: CommandGuardConfig,
    pub protected_paths: ProtectedPathsConfig,
    pub secret_scanner: SecretScannerConfig,
    pub diff_size: DiffSizeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ToolPermissionsConfig {
    pub enabled: bool,
    /// Tool names that are always blocked.
    pub deny_tools: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct CommandGuardConfig {
    pub enabled: bool,
    /// Regexes that block a shell command.
    pub blocked_patterns: Vec<String>,
    /// Regexes that only warn.
    pub warn_patterns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ProtectedPathsConfig {
    pub enabled: bool,
    /// Entries ending in `/` protect a directory, others a file name or suffix.
    pub paths: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct SecretScannerConfig {
    pub enabled: bool,
    /// Regexes for matches that are known to be safe (e.g. test fixtures).
    pub allow_patterns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct DiffSizeConfig {
    pub enabled: bool,
    pub max_lines: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct RateLimiterConfig {
    pub enabled: bool,
    /// Tool calls allowed per session (0 = unlimited).
    pub max_tool_calls_per_session: u64,
    /// File edits allowed per session (0 = unlimited).
    pub max_file_edits_per_session: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidatorsConfig {
    pub enabled: bool,
    /// Shell commands run after file edits (each through `sh -c`).
    pub commands: Vec<String>,
    pub timeout_secs: u64,
    /// Bytes of validator output kept in a block message.
    pub output_limit_bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackersConfig {
    pub event_log: ToggleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ToggleConfig {
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ContextConfig {
    pub git_context: GitContextConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct GitContextConfig {
    pub enabled: bool,
    pub recent_commits: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_dir: ".hookkit/logs".to_string(),
            state_dir: ".hookkit/state".to_string(),
            verbose: false,
            guards: GuardsConfig::default(),
            rate_limiter: RateLimiterConfig::default(),
            validators: ValidatorsConfig::default(),
            trackers: TrackersConfig::default(),
            context: ContextConfig::default(),
        }
    }
}

impl Default for ToolPermissionsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            deny_tools: Vec::new(),
        }
    }
}

impl Default for CommandGuardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            blocked_patterns: strings(&[
                r"\brm\s+-[a-zA-Z]*r[a-zA-Z]*f[a-zA-Z]*\s+(/|~|\$HOME)(\s|$)",
                r"\brm\s+-[a-zA-Z]*f[a-zA-Z]*r[a-zA-Z]*\s+(/|~|\$HOME)(\s|$)",
                r":\(\)\s*\{\s*:\|:&\s*\};\s*:",
                r"\bmkfs(\.\w+)?\s",
                r"\bdd\s+.*\bof=/dev/(sd|nvme|disk|hd)",
                r"\bchmod\s+-R\s+777\s+/(\s|$)",
                r"\bgit\s+push\s+.*(--force\b|-f\b)",
                r"\b(curl|wget)\b[^|]*\|\s*(sudo\s+)?(ba|z)?sh\b",
            ]),
            warn_patterns: strings(&[
                r"\bgit\s+reset\s+--hard\b",
                r"\bgit\s+clean\s+-[a-zA-Z]*f",
                r"\bsudo\b",
            ]),
        }
    }
}

impl Default for ProtectedPathsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            paths: strings(&[".env", ".git/", ".ssh/", "id_rsa", "id_ed25519"]),
        }
    }
}

impl Default for SecretScannerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allow_patterns: Vec::new(),
        }
    }
}

impl Default for DiffSizeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_lines: 500,
        }
    }
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_tool_calls_per_session: 0,
            max_file_edits_per_session: 0,
        }
    }
}

impl Default for ValidatorsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            commands: Vec::new(),
            timeout_secs: 60,
            output_limit_bytes: 4_000,
        }
    }
}

impl Default for ToggleConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for GitContextConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            recent_commits: 5,
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

impl Config {
    /// Resolve a configured directory against `root` unless it is absolute.
    pub fn resolve_dir(dir: &str, root: &Path) -> PathBuf {
        let path = Path::new(dir);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            root.join(path)
        }
    }
}

/// Pick the override file: explicit path, then `HOOKKIT_CONFIG`, then the
/// project default under `root`.
pub fn config_path(explicit: Option<&Path>, root: &Path) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    match std::env::var_os(CONFIG_ENV) {
        Some(value) if !value.is_empty() => PathBuf::from(value),
        _ => root.join(DEFAULT_CONFIG_RELATIVE),
    }
}

/// Load and resolve configuration from an optional override file.
///
/// Never fails: a missing, unreadable or malformed file yields the defaults,
/// and individual invalid fields fall back to their default value.
pub fn resolve(path: Option<&Path>) -> Config {
    let Some(path) = path else {
        return Config::default();
    };
    if !path.exists() {
        debug!(path = %path.display(), "no config override, using defaults");
        return Config::default();
    }
    match read_override(path) {
        Ok(overrides) => resolve_value(&overrides),
        Err(err) => {
            warn!(path = %path.display(), err = %format!("{err:#}"), "ignoring unreadable config");
            Config::default()
        }
    }
}

/// Merge an already parsed override onto the defaults.
pub fn resolve_value(overrides: &Value) -> Config {
    let defaults = match serde_json::to_value(Config::default()) {
        Ok(value) => value,
        Err(err) => {
            warn!(err = %err, "serialize default config");
            return Config::default();
        }
    };
    let (merged, rejections) = merge_validated(&defaults, overrides, FIELD_MINIMUMS);
    for rejection in &rejections {
        warn!(field = %rejection.path, reason = %rejection.reason, "config field rejected, using default");
    }
    match serde_json::from_value(merged) {
        Ok(config) => config,
        Err(err) => {
            warn!(err = %err, "merged config did not deserialize, using defaults");
            Config::default()
        }
    }
}

/// Whether the override file asks for verbose logging.
///
/// Read before tracing is initialized, so it never logs and treats any
/// problem with the file as `false`.
pub fn peek_verbose(path: &Path) -> bool {
    read_override(path)
        .ok()
        .and_then(|value| value.get("verbose").and_then(Value::as_bool))
        .unwrap_or(false)
}

fn read_override(path: &Path) -> Result<Value> {
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let value = serde_json::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    Ok(value)
}
