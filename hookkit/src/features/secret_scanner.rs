//! Detect credentials in written file content and submitted prompts.
//!
//! Matches are reported by pattern name only; the secret itself is never
//! echoed back to the host.

use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use tracing::{debug, warn};

use crate::core::edits::written_text;
use crate::core::event::EventDetail;
use crate::core::types::GuardDecision;
use crate::features::{FeatureContext, Guard, Handler};

pub fn load() -> Handler {
    Handler::Guard(Box::new(SecretScanner))
}

pub struct SecretScanner;

static SECRET_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("AWS access key", r"\b(AKIA|ASIA)[0-9A-Z]{16}\b"),
        (
            "private key",
            r"-----BEGIN (RSA |EC |DSA |OPENSSH |PGP )?PRIVATE KEY( BLOCK)?-----",
        ),
        ("GitHub token", r"\bgh[pousr]_[A-Za-z0-9]{36,}\b"),
        ("Slack token", r"\bxox[abposr]-[A-Za-z0-9-]{10,}"),
        (
            "hard-coded credential",
            r#"(?i)\b(api[_-]?key|secret|token|passw(or)?d)\b\s*[:=]\s*["'][^"'\s]{8,}["']"#,
        ),
    ]
    .into_iter()
    .filter_map(|(name, pattern)| match Regex::new(pattern) {
        Ok(re) => Some((name, re)),
        Err(err) => {
            warn!(name, err = %err, "skipping invalid built-in secret pattern");
            None
        }
    })
    .collect()
});

/// Names of the secret kinds found in `text`, ignoring allowed matches.
fn find_secrets(text: &str, allow: &[Regex]) -> Vec<&'static str> {
    let mut found = Vec::new();
    for (name, re) in &*SECRET_PATTERNS {
        let hit = re
            .find_iter(text)
            .any(|m| !allow.iter().any(|allowed| allowed.is_match(m.as_str())));
        if hit && !found.contains(name) {
            found.push(*name);
        }
    }
    found
}

fn compile_allow(patterns: &[String]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|pattern| match Regex::new(pattern) {
            Ok(re) => Some(re),
            Err(err) => {
                warn!(pattern = %pattern, err = %err, "skipping invalid secret allow pattern");
                None
            }
        })
        .collect()
}

impl Guard for SecretScanner {
    fn evaluate(&self, ctx: &FeatureContext<'_>) -> Result<GuardDecision> {
        let (texts, subject): (Vec<&str>, &str) = match &ctx.event.detail {
            EventDetail::Tool { name, input, .. } => (written_text(name, input), "File content"),
            EventDetail::Prompt { text } => (vec![text.as_str()], "Prompt"),
            _ => return Ok(GuardDecision::Proceed),
        };
        if texts.is_empty() {
            return Ok(GuardDecision::Proceed);
        }

        let allow = compile_allow(&ctx.config.guards.secret_scanner.allow_patterns);
        let mut found: Vec<&'static str> = Vec::new();
        for text in texts {
            for name in find_secrets(text, &allow) {
                if !found.contains(&name) {
                    found.push(name);
                }
            }
        }
        if found.is_empty() {
            return Ok(GuardDecision::Proceed);
        }
        debug!(kinds = ?found, "secrets detected");
        Ok(GuardDecision::block_with_details(
            format!("{subject} appears to contain secrets"),
            format!(
                "detected: {}\nremove the credential or add an allowPatterns entry",
                found.join(", ")
            ),
        ))
    }
}
