//! Block edits to protected files and directories.

use anyhow::Result;
use tracing::debug;

use crate::core::edits::target_path;
use crate::core::types::GuardDecision;
use crate::features::{FeatureContext, Guard, Handler};

pub fn load() -> Handler {
    Handler::Guard(Box::new(ProtectedPaths))
}

pub struct ProtectedPaths;

/// First protected entry matching `path`.
///
/// Entries ending in `/` match any directory segment sequence of the path;
/// other entries match the file name or a trailing path suffix.
fn matching_entry<'a>(path: &str, entries: &'a [String]) -> Option<&'a str> {
    let normalized = path.replace('\\', "/");
    let wrapped = format!("/{}/", normalized.trim_matches('/'));
    entries
        .iter()
        .map(String::as_str)
        .filter(|entry| !entry.is_empty())
        .find(|entry| {
            if entry.ends_with('/') {
                let dir = entry.trim_matches('/');
                !dir.is_empty() && wrapped.contains(&format!("/{dir}/"))
            } else {
                let suffix = entry.trim_start_matches('/');
                normalized == suffix || normalized.ends_with(&format!("/{suffix}"))
            }
        })
}

impl Guard for ProtectedPaths {
    fn evaluate(&self, ctx: &FeatureContext<'_>) -> Result<GuardDecision> {
        let (Some(tool), Some(input)) = (ctx.event.tool_name(), ctx.event.tool_input()) else {
            return Ok(GuardDecision::Proceed);
        };
        let Some(path) = target_path(tool, input) else {
            return Ok(GuardDecision::Proceed);
        };
        let entries = &ctx.config.guards.protected_paths.paths;
        match matching_entry(path, entries) {
            Some(entry) => {
                debug!(path, entry, "protected path matched");
                Ok(GuardDecision::block_with_details(
                    format!("Refusing to modify protected path `{path}`"),
                    format!("matched protected entry: {entry}"),
                ))
            }
            None => Ok(GuardDecision::Proceed),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use serde_json::json;

    use super::*;
    use crate::core::event::EventType;
    use crate::io::config::Config;
    use crate::test_support::tool_event;

    fn defaults() -> Vec<String> {
        Config::default().guards.protected_paths.paths
    }

    #[test]
    fn directory_entries_match_segments() {
        let entries = defaults();
        assert_eq!(matching_entry(".git/config", &entries), Some(".git/"));
        assert_eq!(matching_entry("/repo/.git/HEAD", &entries), Some(".git/"));
        assert_eq!(matching_entry("/home/u/.ssh/config", &entries), Some(".ssh/"));
        assert_eq!(matching_entry("docs/git/readme.md", &entries), None);
        assert_eq!(matching_entry("my.git/file", &entries), None);
    }

    #[test]
    fn file_entries_match_name_or_suffix() {
        let entries = defaults();
        assert_eq!(matching_entry(".env", &entries), Some(".env"));
        assert_eq!(matching_entry("/app/config/.env", &entries), Some(".env"));
        assert_eq!(matching_entry(r"C:\Users\me\.ssh\id_rsa", &entries), Some(".ssh/"));
        assert_eq!(matching_entry("src/.env.example", &entries), None);
        assert_eq!(matching_entry("src/main.rs", &entries), None);

        let nested = vec!["config/prod.json".to_string()];
        assert_eq!(matching_entry("/srv/config/prod.json", &nested), Some("config/prod.json"));
        assert_eq!(matching_entry("/srv/oldconfig/prod.json", &nested), None);
    }

    #[test]
    fn blocks_only_edit_tools() {
        let config = Config::default();
        let edit = tool_event(
            EventType::PreToolUse,
            "Write",
            json!({"file_path": "/repo/.env", "content": "A=1"}),
        );
        let ctx = FeatureContext { event: &edit, config: &config, root: Path::new(".") };
        let decision = ProtectedPaths.evaluate(&ctx).expect("evaluate");
        assert!(matches!(decision, GuardDecision::Block { ref message, .. } if message.contains("/repo/.env")));

        let read = tool_event(EventType::PreToolUse, "Read", json!({"file_path": "/repo/.env"}));
        let ctx = FeatureContext { event: &read, config: &config, root: Path::new(".") };
        assert_eq!(ProtectedPaths.evaluate(&ctx).expect("evaluate"), GuardDecision::Proceed);
    }
}
