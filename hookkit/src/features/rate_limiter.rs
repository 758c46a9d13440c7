//! Per-session limits on tool calls and file edits.
//!
//! Counters live in `<stateDir>/rate-limits/<session>.json` and are rewritten
//! atomically after every permitted call. Each permitted call also appends an
//! audit line to `<logDir>/<session>/rate-limiter.jsonl`.

use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::edits::is_edit_tool;
use crate::core::types::GuardDecision;
use crate::features::{FeatureContext, Guard, Handler};
use crate::io::config::RateLimiterConfig;
use crate::io::jsonl::{append_record, log_path};
use crate::io::rate_state::{RateCounters, counters_path, load_counters, write_counters};

pub fn load() -> Handler {
    Handler::Guard(Box::new(RateLimitGuard))
}

/// Which configured maximum a call ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    ToolCalls,
    FileEdits,
}

impl LimitKind {
    fn describe(self) -> &'static str {
        match self {
            LimitKind::ToolCalls => "tool calls",
            LimitKind::FileEdits => "file edits",
        }
    }
}

/// Outcome of a counter check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LimitCheck {
    /// The call was permitted and counted; holds the persisted counters.
    Allowed(RateCounters),
    /// The call would exceed a maximum and was not counted.
    Exceeded { kind: LimitKind, count: u64, max: u64 },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuditRecord<'a> {
    timestamp: String,
    session_id: &'a str,
    tool_name: &'a str,
    is_edit: bool,
    total_calls: u64,
    total_edits: u64,
}

/// Session-scoped counter store.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    counters: PathBuf,
    audit: PathBuf,
    session_id: String,
}

impl RateLimiter {
    pub fn new(ctx: &FeatureContext<'_>) -> Self {
        let session_id = ctx.event.session_id.clone();
        Self {
            counters: counters_path(&ctx.state_dir(), &session_id),
            audit: log_path(&ctx.log_dir(), &session_id, "rate-limiter"),
            session_id,
        }
    }

    /// Check `tool` against the limits and count it when permitted.
    ///
    /// A maximum of 0 is unlimited. A count already at its maximum blocks, so
    /// exactly `max` calls proceed. Storage failures are returned as errors.
    pub fn check(&self, tool: &str, limits: &RateLimiterConfig) -> Result<LimitCheck> {
        let current = load_counters(&self.counters)?;
        let is_edit = is_edit_tool(tool);

        if let Some(hit) = exceeded(
            LimitKind::ToolCalls,
            current.total_calls,
            limits.max_tool_calls_per_session,
        ) {
            return Ok(hit);
        }
        if is_edit
            && let Some(hit) = exceeded(
                LimitKind::FileEdits,
                current.total_edits,
                limits.max_file_edits_per_session,
            )
        {
            return Ok(hit);
        }

        let next = RateCounters {
            total_calls: current.total_calls.saturating_add(1),
            total_edits: current.total_edits.saturating_add(u64::from(is_edit)),
        };
        write_counters(&self.counters, &next)?;
        append_record(
            &self.audit,
            &AuditRecord {
                timestamp: Utc::now().to_rfc3339(),
                session_id: &self.session_id,
                tool_name: tool,
                is_edit,
                total_calls: next.total_calls,
                total_edits: next.total_edits,
            },
        )?;
        debug!(tool, total_calls = next.total_calls, total_edits = next.total_edits, "rate limit check passed");
        Ok(LimitCheck::Allowed(next))
    }
}

fn exceeded(kind: LimitKind, count: u64, max: u64) -> Option<LimitCheck> {
    (max > 0 && count >= max).then_some(LimitCheck::Exceeded { kind, count, max })
}

pub struct RateLimitGuard;

impl Guard for RateLimitGuard {
    fn evaluate(&self, ctx: &FeatureContext<'_>) -> Result<GuardDecision> {
        let Some(tool) = ctx.event.tool_name() else {
            return Ok(GuardDecision::Proceed);
        };
        let limiter = RateLimiter::new(ctx);
        match limiter.check(tool, &ctx.config.rate_limiter) {
            Ok(LimitCheck::Allowed(_)) => Ok(GuardDecision::Proceed),
            Ok(LimitCheck::Exceeded { kind, count, max }) => {
                info!(session = %ctx.event.session_id, tool, count, max, "rate limit reached");
                Ok(GuardDecision::block_with_details(
                    format!("Rate limit reached: {count} {} already made this session (max {max})", kind.describe()),
                    "start a new session or raise the limit in rateLimiter",
                ))
            }
            Err(err) => {
                warn!(session = %ctx.event.session_id, err = %format!("{err:#}"), "rate limiter storage failed, proceeding");
                Ok(GuardDecision::Proceed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use serde_json::json;

    use super::*;
    use crate::core::event::{EventType, HookEvent};
    use crate::io::config::Config;
    use crate::test_support::{tool_event, with_session, write_input};

    fn config(root: &Path, calls: u64, edits: u64) -> Config {
        let mut config = Config::default();
        config.state_dir = root.join("state").display().to_string();
        config.log_dir = root.join("logs").display().to_string();
        config.rate_limiter.enabled = true;
        config.rate_limiter.max_tool_calls_per_session = calls;
        config.rate_limiter.max_file_edits_per_session = edits;
        config
    }

    fn bash() -> HookEvent {
        tool_event(EventType::PreToolUse, "Bash", json!({"command": "ls"}))
    }

    fn decide(config: &Config, event: &HookEvent) -> GuardDecision {
        let ctx = FeatureContext { event, config, root: Path::new(".") };
        RateLimitGuard.evaluate(&ctx).expect("evaluate")
    }

    #[test]
    fn permits_exactly_max_calls() {
        let temp = tempfile::tempdir().expect("tempdir");
        let config = config(temp.path(), 3, 0);
        let event = bash();
        for _ in 0..3 {
            assert_eq!(decide(&config, &event), GuardDecision::Proceed);
        }
        match decide(&config, &event) {
            GuardDecision::Block { message, .. } => assert!(message.contains("max 3")),
            other => panic!("expected block, got {other:?}"),
        }
    }

    #[test]
    fn blocked_calls_are_not_counted() {
        let temp = tempfile::tempdir().expect("tempdir");
        let config = config(temp.path(), 1, 0);
        let event = bash();
        assert_eq!(decide(&config, &event), GuardDecision::Proceed);
        assert!(matches!(decide(&config, &event), GuardDecision::Block { .. }));
        assert!(matches!(decide(&config, &event), GuardDecision::Block { .. }));

        let path = counters_path(&temp.path().join("state"), &event.session_id);
        assert_eq!(load_counters(&path).expect("load").total_calls, 1);
    }

    #[test]
    fn zero_is_unlimited() {
        let temp = tempfile::tempdir().expect("tempdir");
        let config = config(temp.path(), 0, 0);
        let event = bash();
        for _ in 0..20 {
            assert_eq!(decide(&config, &event), GuardDecision::Proceed);
        }
    }

    #[test]
    fn edit_limit_only_counts_edits() {
        let temp = tempfile::tempdir().expect("tempdir");
        let config = config(temp.path(), 0, 1);
        let write = tool_event(EventType::PreToolUse, "Write", write_input("a.rs", 1));
        assert_eq!(decide(&config, &write), GuardDecision::Proceed);
        assert_eq!(decide(&config, &bash()), GuardDecision::Proceed);
        match decide(&config, &write) {
            GuardDecision::Block { message, .. } => assert!(message.contains("file edits")),
            other => panic!("expected block, got {other:?}"),
        }
    }

    #[test]
    fn sessions_are_independent() {
        let temp = tempfile::tempdir().expect("tempdir");
        let config = config(temp.path(), 1, 0);
        assert_eq!(decide(&config, &bash()), GuardDecision::Proceed);
        let other = with_session(bash(), "other-session");
        assert_eq!(decide(&config, &other), GuardDecision::Proceed);
    }

    #[test]
    fn similar_session_ids_keep_separate_counters() {
        let temp = tempfile::tempdir().expect("tempdir");
        let config = config(temp.path(), 1, 0);
        let dotted = with_session(bash(), "team.alpha");
        let underscored = with_session(bash(), "team_alpha");
        assert_eq!(decide(&config, &dotted), GuardDecision::Proceed);
        assert_eq!(decide(&config, &underscored), GuardDecision::Proceed);
        assert!(matches!(decide(&config, &dotted), GuardDecision::Block { .. }));
        assert!(matches!(decide(&config, &underscored), GuardDecision::Block { .. }));
    }

    #[test]
    fn saturated_counters_do_not_overflow() {
        let temp = tempfile::tempdir().expect("tempdir");
        let config = config(temp.path(), 0, 0);
        let event = bash();
        let path = counters_path(&temp.path().join("state"), &event.session_id);
        let full = RateCounters {
            total_calls: u64::MAX,
            total_edits: u64::MAX,
        };
        write_counters(&path, &full).expect("write");

        let write = tool_event(EventType::PreToolUse, "Write", write_input("a.rs", 1));
        assert_eq!(decide(&config, &write), GuardDecision::Proceed);
        assert_eq!(load_counters(&path).expect("load"), full);
    }

    #[test]
    fn permitted_calls_are_audited() {
        let temp = tempfile::tempdir().expect("tempdir");
        let config = config(temp.path(), 5, 0);
        let event = bash();
        decide(&config, &event);
        decide(&config, &event);
        let audit = log_path(&temp.path().join("logs"), &event.session_id, "rate-limiter");
        let contents = fs::read_to_string(audit).expect("read audit");
        let last: serde_json::Value =
            serde_json::from_str(contents.lines().last().expect("line")).expect("json");
        assert_eq!(contents.lines().count(), 2);
        assert_eq!(last["totalCalls"], 2);
        assert_eq!(last["toolName"], "Bash");
    }

    #[test]
    fn storage_failure_is_an_error_from_check_and_proceed_from_guard() {
        let temp = tempfile::tempdir().expect("tempdir");
        let blocker = temp.path().join("state");
        fs::write(&blocker, "not a directory").expect("write");
        let config = config(temp.path(), 1, 0);
        let event = bash();
        let ctx = FeatureContext { event: &event, config: &config, root: Path::new(".") };

        let limiter = RateLimiter::new(&ctx);
        assert!(limiter.check("Bash", &config.rate_limiter).is_err());
        assert_eq!(decide(&config, &event), GuardDecision::Proceed);
        assert_eq!(decide(&config, &event), GuardDecision::Proceed);
    }
}
