//! Shell command blocklist for the `Bash` tool.
//!
//! Pattern matching is advisory: it catches common destructive commands, not
//! a determined attempt to hide one.

use anyhow::Result;
use regex::Regex;
use tracing::{debug, warn};

use crate::core::types::GuardDecision;
use crate::features::{FeatureContext, Guard, Handler};

pub fn load() -> Handler {
    Handler::Guard(Box::new(CommandGuard))
}

pub struct CommandGuard;

/// Compile configured patterns, skipping (and logging) invalid ones.
fn compile(patterns: &[String]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|pattern| match Regex::new(pattern) {
            Ok(re) => Some(re),
            Err(err) => {
                warn!(pattern = %pattern, err = %err, "skipping invalid command pattern");
                None
            }
        })
        .collect()
}

fn first_match<'a>(patterns: &'a [Regex], command: &str) -> Option<&'a Regex> {
    patterns.iter().find(|re| re.is_match(command))
}

impl Guard for CommandGuard {
    fn evaluate(&self, ctx: &FeatureContext<'_>) -> Result<GuardDecision> {
        if ctx.event.tool_name() != Some("Bash") {
            return Ok(GuardDecision::Proceed);
        }
        let Some(command) = ctx.event.tool_input_str("command") else {
            return Ok(GuardDecision::Proceed);
        };
        let cfg = &ctx.config.guards.command_guard;

        let blocked = compile(&cfg.blocked_patterns);
        if let Some(re) = first_match(&blocked, command) {
            debug!(pattern = re.as_str(), "command blocked");
            return Ok(GuardDecision::block_with_details(
                "Blocked potentially destructive command",
                format!("command: {command}\nmatched pattern: {}", re.as_str()),
            ));
        }

        let warned = compile(&cfg.warn_patterns);
        if let Some(re) = first_match(&warned, command) {
            return Ok(GuardDecision::warn(format!(
                "Caution: `{command}` matches risky pattern {}",
                re.as_str()
            )));
        }
        Ok(GuardDecision::Proceed)
    }
}
