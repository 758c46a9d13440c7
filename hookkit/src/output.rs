//! Rendering of an aggregated result for the host.
//!
//! Two protocols are derived from the same [`AggregatedResult`]:
//!
//! - [`Protocol::Text`]: feature stdout verbatim, diagnostics on stderr, and
//!   the recorded exit code.
//! - [`Protocol::Json`]: one JSON envelope on stdout with a
//!   `hookSpecificOutput` object; blocks carry `permissionDecision: "deny"`.

use std::fmt;
use std::str::FromStr;

use anyhow::{Result, anyhow};
use serde::Serialize;

use crate::core::event::{EventType, HostFlavor};
use crate::core::types::AggregatedResult;
use crate::exit_codes;
use crate::io::config::Config;
use crate::registry::Descriptor;

/// Host output protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Text,
    Json,
}

impl Protocol {
    /// Explicit choice wins; otherwise answer in the shape the host spoke.
    pub fn select(explicit: Option<Protocol>, flavor: HostFlavor) -> Protocol {
        explicit.unwrap_or(match flavor {
            HostFlavor::Primary => Protocol::Text,
            HostFlavor::Alternate => Protocol::Json,
        })
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Text => f.write_str("text"),
            Protocol::Json => f.write_str("json"),
        }
    }
}

impl FromStr for Protocol {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Protocol::Text),
            "json" => Ok(Protocol::Json),
            _ => Err(anyhow!("unknown protocol '{s}' (expected text or json)")),
        }
    }
}

/// Bytes and exit code the process should emit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<'a> {
    hook_specific_output: HookSpecificOutput<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_message: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HookSpecificOutput<'a> {
    hook_event_name: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    permission_decision: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    permission_decision_reason: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    additional_context: Option<&'a str>,
}

/// Render `result` for `event_type` in `protocol`.
pub fn render(event_type: EventType, result: &AggregatedResult, protocol: Protocol) -> Result<Rendered> {
    match protocol {
        Protocol::Text => Ok(render_text(result)),
        Protocol::Json => render_json(event_type, result),
    }
}

fn render_text(result: &AggregatedResult) -> Rendered {
    if result.is_blocked() {
        return Rendered {
            stdout: String::new(),
            stderr: result.stderr.clone(),
            exit_code: result.exit_code,
        };
    }
    Rendered {
        stdout: result.stdout.clone(),
        stderr: result.stderr.clone(),
        exit_code: exit_codes::OK,
    }
}

/// Reason text and attribution for a blocked result.
///
/// The reason carries the details too, so the envelope says as much as the
/// text protocol's stderr.
fn deny_reason(result: &AggregatedResult) -> (String, Option<String>) {
    match &result.block {
        Some(block) => {
            let mut reason = block.reason.trim_end().to_string();
            if let Some(details) = block.details.as_deref().map(str::trim_end)
                && !details.is_empty()
            {
                reason.push('\n');
                reason.push_str(details);
            }
            (reason, Some(format!("Blocked by {}", block.feature)))
        }
        None => (result.stderr.trim_end().to_string(), None),
    }
}

fn render_json(event_type: EventType, result: &AggregatedResult) -> Result<Rendered> {
    let (reason, attribution) = deny_reason(result);
    let envelope = if result.is_blocked() {
        Envelope {
            hook_specific_output: HookSpecificOutput {
                hook_event_name: event_type.as_str(),
                permission_decision: Some("deny"),
                permission_decision_reason: Some(&reason),
                additional_context: None,
            },
            system_message: attribution.as_deref(),
        }
    } else {
        Envelope {
            hook_specific_output: HookSpecificOutput {
                hook_event_name: event_type.as_str(),
                permission_decision: None,
                permission_decision_reason: None,
                additional_context: non_empty(&result.stdout),
            },
            system_message: non_empty(result.stderr.trim_end()),
        }
    };
    let mut stdout = serde_json::to_string(&envelope)?;
    stdout.push('\n');
    Ok(Rendered {
        stdout,
        stderr: String::new(),
        exit_code: exit_codes::OK,
    })
}

/// Plain-text table of descriptors in the order given.
pub fn catalog_table(descriptors: &[&Descriptor], config: &Config) -> String {
    let mut out = format!(
        "{:>4}  {:<16} {:<9} {:<7} {}\n",
        "PRIO", "NAME", "CATEGORY", "ENABLED", "EVENTS"
    );
    for descriptor in descriptors {
        let events: Vec<&str> = descriptor.events.iter().map(|event| event.as_str()).collect();
        out.push_str(&format!(
            "{:>4}  {:<16} {:<9} {:<7} {}\n",
            descriptor.priority,
            descriptor.name,
            descriptor.category.as_str(),
            if descriptor.is_enabled(config) { "yes" } else { "no" },
            events.join(",")
        ));
    }
    out
}

fn non_empty(text: &str) -> Option<&str> {
    if text.is_empty() { None } else { Some(text) }
}
