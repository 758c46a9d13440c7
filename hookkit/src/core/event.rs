//! Normalized hook events.
//!
//! Hosts deliver one JSON object per invocation in one of two wire shapes
//! (snake_case or camelCase keys). Both converge on [`HookEvent`] before any
//! feature sees them.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Lifecycle moment the host is notifying about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventType {
    PreToolUse,
    PostToolUse,
    UserPromptSubmit,
    SessionStart,
    SessionEnd,
    Stop,
    SubagentStop,
    Notification,
    PreCompact,
}

impl EventType {
    pub const ALL: &'static [EventType] = &[
        EventType::PreToolUse,
        EventType::PostToolUse,
        EventType::UserPromptSubmit,
        EventType::SessionStart,
        EventType::SessionEnd,
        EventType::Stop,
        EventType::SubagentStop,
        EventType::Notification,
        EventType::PreCompact,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EventType::PreToolUse => "PreToolUse",
            EventType::PostToolUse => "PostToolUse",
            EventType::UserPromptSubmit => "UserPromptSubmit",
            EventType::SessionStart => "SessionStart",
            EventType::SessionEnd => "SessionEnd",
            EventType::Stop => "Stop",
            EventType::SubagentStop => "SubagentStop",
            EventType::Notification => "Notification",
            EventType::PreCompact => "PreCompact",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        EventType::ALL
            .iter()
            .copied()
            .find(|event| event.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| anyhow!("unknown event type '{s}'"))
    }
}

/// Wire shape the host used for the raw payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HostFlavor {
    /// snake_case keys (`session_id`, `tool_name`, ...).
    Primary,
    /// camelCase keys (`sessionId`, `toolName`, ...).
    Alternate,
}

/// Event-specific part of a normalized payload.
#[derive(Debug, Clone, PartialEq)]
pub enum EventDetail {
    Tool {
        name: String,
        input: Value,
        response: Option<Value>,
    },
    Prompt {
        text: String,
    },
    Session {
        source: Option<String>,
    },
    Notification {
        message: String,
    },
    Stop {
        active: bool,
    },
    Other,
}

/// Host notification after normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct HookEvent {
    pub event_type: EventType,
    pub session_id: String,
    pub cwd: Option<PathBuf>,
    pub transcript_path: Option<PathBuf>,
    pub flavor: HostFlavor,
    pub detail: EventDetail,
}

impl HookEvent {
    /// Tool name for tool events.
    pub fn tool_name(&self) -> Option<&str> {
        match &self.detail {
            EventDetail::Tool { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Tool input for tool events.
    pub fn tool_input(&self) -> Option<&Value> {
        match &self.detail {
            EventDetail::Tool { input, .. } => Some(input),
            _ => None,
        }
    }

    /// String field of the tool input (e.g. `command`, `file_path`).
    pub fn tool_input_str(&self, field: &str) -> Option<&str> {
        self.tool_input()
            .and_then(|input| input.get(field))
            .and_then(Value::as_str)
    }
}

/// Key names for one wire shape.
struct WireKeys {
    session_id: &'static str,
    transcript_path: &'static str,
    event_name: &'static str,
    tool_name: &'static str,
    tool_input: &'static str,
    tool_response: &'static [&'static str],
    stop_active: &'static str,
}

const PRIMARY_KEYS: WireKeys = WireKeys {
    session_id: "session_id",
    transcript_path: "transcript_path",
    event_name: "hook_event_name",
    tool_name: "tool_name",
    tool_input: "tool_input",
    tool_response: &["tool_response"],
    stop_active: "stop_hook_active",
};

const ALTERNATE_KEYS: WireKeys = WireKeys {
    session_id: "sessionId",
    transcript_path: "transcriptPath",
    event_name: "hookEventName",
    tool_name: "toolName",
    tool_input: "toolInput",
    tool_response: &["toolResponse", "toolOutput"],
    stop_active: "stopHookActive",
};

const ALTERNATE_MARKERS: &[&str] = &["sessionId", "hookEventName", "toolName", "transcriptPath"];

/// Detect which wire shape a raw payload uses.
pub fn detect_flavor(raw: &Map<String, Value>) -> HostFlavor {
    if raw.contains_key(PRIMARY_KEYS.session_id) {
        return HostFlavor::Primary;
    }
    if ALTERNATE_MARKERS.iter().any(|key| raw.contains_key(*key)) {
        HostFlavor::Alternate
    } else {
        HostFlavor::Primary
    }
}

/// Parse raw stdin text into a normalized event for `event_type`.
///
/// The entry point decides the event type; a conflicting event name inside the
/// payload is ignored.
pub fn parse_event(event_type: EventType, input: &str) -> Result<HookEvent> {
    if input.trim().is_empty() {
        bail!("empty hook input on stdin");
    }
    let raw: Value = serde_json::from_str(input).map_err(|err| anyhow!("parse hook input: {err}"))?;
    normalize(event_type, &raw)
}

/// Converge either wire shape onto [`HookEvent`].
pub fn normalize(event_type: EventType, raw: &Value) -> Result<HookEvent> {
    let obj = raw
        .as_object()
        .ok_or_else(|| anyhow!("hook input must be a JSON object"))?;
    let flavor = detect_flavor(obj);
    let keys = match flavor {
        HostFlavor::Primary => &PRIMARY_KEYS,
        HostFlavor::Alternate => &ALTERNATE_KEYS,
    };

    let session_id = str_field(obj, keys.session_id)
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| anyhow!("hook input missing '{}'", keys.session_id))?
        .to_string();

    if let Some(declared) = str_field(obj, keys.event_name)
        && !declared.eq_ignore_ascii_case(event_type.as_str())
    {
        debug!(declared, entry_point = %event_type, "payload event name differs from entry point");
    }

    let detail = match event_type {
        EventType::PreToolUse | EventType::PostToolUse => EventDetail::Tool {
            name: str_field(obj, keys.tool_name).unwrap_or_default().to_string(),
            input: obj.get(keys.tool_input).cloned().unwrap_or(Value::Null),
            response: keys
                .tool_response
                .iter()
                .find_map(|key| obj.get(*key))
                .cloned(),
        },
        EventType::UserPromptSubmit => EventDetail::Prompt {
            text: str_field(obj, "prompt").unwrap_or_default().to_string(),
        },
        EventType::SessionStart | EventType::SessionEnd => EventDetail::Session {
            source: str_field(obj, "source")
                .or_else(|| str_field(obj, "reason"))
                .map(str::to_string),
        },
        EventType::Notification => EventDetail::Notification {
            message: str_field(obj, "message").unwrap_or_default().to_string(),
        },
        EventType::Stop | EventType::SubagentStop => EventDetail::Stop {
            active: obj
                .get(keys.stop_active)
                .and_then(Value::as_bool)
                .unwrap_or(false),
        },
        EventType::PreCompact => EventDetail::Other,
    };

    debug!(event = %event_type, ?flavor, session_id, "normalized hook input");
    Ok(HookEvent {
        event_type,
        session_id,
        cwd: str_field(obj, "cwd").map(PathBuf::from),
        transcript_path: str_field(obj, keys.transcript_path).map(PathBuf::from),
        flavor,
        detail,
    })
}

fn str_field<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(Value::as_str)
}
