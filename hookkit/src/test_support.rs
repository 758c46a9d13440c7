//! Test-only helpers for constructing normalized hook events.

use serde_json::Value;

use crate::core::event::{EventDetail, EventType, HookEvent, HostFlavor};

/// Session id shared by helper-built events.
pub const TEST_SESSION: &str = "test-session";

/// Create a deterministic event with no cwd and the given detail.
pub fn event(event_type: EventType, detail: EventDetail) -> HookEvent {
    HookEvent {
        event_type,
        session_id: TEST_SESSION.to_string(),
        cwd: None,
        transcript_path: None,
        flavor: HostFlavor::Primary,
        detail,
    }
}

/// Create a tool event (`PreToolUse`/`PostToolUse`) for `tool` with `input`.
pub fn tool_event(event_type: EventType, tool: &str, input: Value) -> HookEvent {
    event(
        event_type,
        EventDetail::Tool {
            name: tool.to_string(),
            input,
            response: None,
        },
    )
}

/// Create a `UserPromptSubmit` event.
pub fn prompt_event(text: &str) -> HookEvent {
    event(
        EventType::UserPromptSubmit,
        EventDetail::Prompt {
            text: text.to_string(),
        },
    )
}

/// Same event under a different session id.
pub fn with_session(mut event: HookEvent, session_id: &str) -> HookEvent {
    event.session_id = session_id.to_string();
    event
}

/// A `Write` tool input with `lines` lines of content.
pub fn write_input(path: &str, lines: usize) -> Value {
    let content: String = (0..lines).map(|i| format!("line {i}\n")).collect();
    serde_json::json!({"file_path": path, "content": content})
}
