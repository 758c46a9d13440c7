//! Shared deterministic types for the hook pipeline.
//!
//! These types define the contract between features, the pipeline executor and
//! the output formatter. They carry no I/O and serialize deterministically.

use std::fmt;
use std::str::FromStr;

use anyhow::{Result, anyhow};
use serde::Serialize;

use crate::exit_codes;

/// Closed set of feature categories used for filtering and listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Policy checks that may warn or block.
    Guard,
    /// External checks (lint/test) reporting pass or fail.
    Validator,
    /// Best-effort recorders that never block.
    Tracker,
    /// Best-effort producers of extra context for the host.
    Context,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Guard => "guard",
            Category::Validator => "validator",
            Category::Tracker => "tracker",
            Category::Context => "context",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "guard" => Ok(Category::Guard),
            "validator" => Ok(Category::Validator),
            "tracker" => Ok(Category::Tracker),
            "context" => Ok(Category::Context),
            _ => Err(anyhow!("unknown category '{s}'")),
        }
    }
}

/// What the executor does when an authoritative feature fails to decide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Log and continue as if the feature had no objection.
    Proceed,
    /// Treat the failure itself as a block.
    Block,
}

/// Structured description of a block, rendered into the JSON envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockContext {
    pub feature: String,
    pub reason: String,
    pub details: Option<String>,
}

/// Process-level result contributed by one feature.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeatureResult {
    pub exit_code: i32,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub block: Option<BlockContext>,
}

impl FeatureResult {
    /// Non-blocking result carrying text for the host's context.
    pub fn context(stdout: impl Into<String>) -> Self {
        Self {
            stdout: Some(stdout.into()),
            ..Self::default()
        }
    }

    pub fn is_blocking(&self) -> bool {
        self.exit_code != exit_codes::OK
    }
}

/// Outcome of a policy evaluation.
///
/// This is the single conversion point from a guard's decision to a
/// process-level signal; see [`GuardDecision::into_result`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Proceed,
    Warn(String),
    Block {
        message: String,
        details: Option<String>,
    },
}

impl GuardDecision {
    pub fn block(message: impl Into<String>) -> Self {
        GuardDecision::Block {
            message: message.into(),
            details: None,
        }
    }

    pub fn block_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        GuardDecision::Block {
            message: message.into(),
            details: Some(details.into()),
        }
    }

    pub fn warn(message: impl Into<String>) -> Self {
        GuardDecision::Warn(message.into())
    }

    /// Convert into the result the executor aggregates.
    ///
    /// - `Proceed` yields no result.
    /// - `Warn` yields exit code 0 with the message on stderr.
    /// - `Block` yields [`exit_codes::BLOCK`], the message (and details) on
    ///   stderr, and a [`BlockContext`] naming `feature`.
    pub fn into_result(self, feature: &str) -> Option<FeatureResult> {
        match self {
            GuardDecision::Proceed => None,
            GuardDecision::Warn(message) => Some(FeatureResult {
                exit_code: exit_codes::OK,
                stderr: Some(with_newline(message)),
                ..FeatureResult::default()
            }),
            GuardDecision::Block { message, details } => {
                let mut stderr = with_newline(message.clone());
                if let Some(details) = &details {
                    stderr.push_str(&with_newline(details.clone()));
                }
                Some(FeatureResult {
                    exit_code: exit_codes::BLOCK,
                    stdout: None,
                    stderr: Some(stderr),
                    block: Some(BlockContext {
                        feature: feature.to_string(),
                        reason: message,
                        details,
                    }),
                })
            }
        }
    }
}

fn with_newline(mut text: String) -> String {
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text
}

/// Everything the pipeline produced for one event.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AggregatedResult {
    pub stdout: String,
    pub stderr: String,
    /// Exit code of the last feature that returned a result (0 if none did).
    pub exit_code: i32,
    /// Set when the final exit code came from a block decision.
    pub block: Option<BlockContext>,
    /// Names of the features that executed, in order.
    pub ran: Vec<String>,
}

impl AggregatedResult {
    pub fn is_blocked(&self) -> bool {
        self.exit_code != exit_codes::OK
    }

    /// Fold one feature result in. Returns true when execution must stop.
    pub fn absorb(&mut self, result: FeatureResult) -> bool {
        if let Some(stdout) = result.stdout {
            self.stdout.push_str(&stdout);
        }
        if let Some(stderr) = result.stderr {
            self.stderr.push_str(&stderr);
        }
        self.exit_code = result.exit_code;
        if result.exit_code != exit_codes::OK {
            self.block = result.block;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proceed_has_no_result() {
        assert_eq!(GuardDecision::Proceed.into_result("g"), None);
    }

    #[test]
    fn warn_is_exit_zero_with_stderr() {
        let result = GuardDecision::warn("careful").into_result("g").expect("result");
        assert_eq!(result.exit_code, exit_codes::OK);
        assert_eq!(result.stderr.as_deref(), Some("careful\n"));
        assert!(result.block.is_none());
        assert!(!result.is_blocking());
    }

    #[test]
    fn block_carries_exit_code_and_context() {
        let result = GuardDecision::block_with_details("nope", "line 3")
            .into_result("commandGuard")
            .expect("result");
        assert_eq!(result.exit_code, exit_codes::BLOCK);
        assert_eq!(result.stderr.as_deref(), Some("nope\nline 3\n"));
        assert_eq!(
            result.block,
            Some(BlockContext {
                feature: "commandGuard".to_string(),
                reason: "nope".to_string(),
                details: Some("line 3".to_string()),
            })
        );
    }

    #[test]
    fn absorb_stops_on_non_zero_exit() {
        let mut agg = AggregatedResult::default();
        assert!(!agg.absorb(FeatureResult::context("ctx\n")));
        assert!(agg.absorb(GuardDecision::block("stop").into_result("g").expect("block")));
        assert_eq!(agg.stdout, "ctx\n");
        assert_eq!(agg.stderr, "stop\n");
        assert_eq!(agg.exit_code, exit_codes::BLOCK);
        assert!(agg.is_blocked());
    }

    #[test]
    fn category_round_trips_through_str() {
        for category in [
            Category::Guard,
            Category::Validator,
            Category::Tracker,
            Category::Context,
        ] {
            assert_eq!(category.as_str().parse::<Category>().expect("parse"), category);
        }
    }
}
