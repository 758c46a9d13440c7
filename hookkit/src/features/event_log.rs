//! JSONL event log: one line per hook event, grouped by session and kind.

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::core::event::{EventDetail, HookEvent};
use crate::core::types::FeatureResult;
use crate::features::{FeatureContext, Handler, Tracker};
use crate::io::jsonl::{append_record, log_path};

pub fn load() -> Handler {
    Handler::Tracker(Box::new(EventLog))
}

pub struct EventLog;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EventRecord<'a> {
    timestamp: String,
    event: &'static str,
    session_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    input: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
}

/// Log file name for an event's detail kind.
fn log_category(event: &HookEvent) -> &'static str {
    match event.detail {
        EventDetail::Tool { .. } => "tools",
        EventDetail::Prompt { .. } => "prompts",
        EventDetail::Notification { .. } => "notifications",
        EventDetail::Session { .. } | EventDetail::Stop { .. } | EventDetail::Other => "sessions",
    }
}

fn record(event: &HookEvent) -> EventRecord<'_> {
    let mut record = EventRecord {
        timestamp: Utc::now().to_rfc3339(),
        event: event.event_type.as_str(),
        session_id: &event.session_id,
        tool: None,
        input: None,
        prompt: None,
        source: None,
        message: None,
    };
    match &event.detail {
        EventDetail::Tool { name, input, .. } => {
            record.tool = Some(name.as_str());
            record.input = Some(input);
        }
        EventDetail::Prompt { text } => record.prompt = Some(text.as_str()),
        EventDetail::Session { source } => record.source = source.as_deref(),
        EventDetail::Notification { message } => record.message = Some(message.as_str()),
        EventDetail::Stop { .. } | EventDetail::Other => {}
    }
    record
}

impl Tracker for EventLog {
    fn run(&self, ctx: &FeatureContext<'_>) -> Option<FeatureResult> {
        let path = log_path(&ctx.log_dir(), &ctx.event.session_id, log_category(ctx.event));
        match append_record(&path, &record(ctx.event)) {
            Ok(()) => debug!(path = %path.display(), "event logged"),
            Err(err) => warn!(path = %path.display(), err = %format!("{err:#}"), "event log write failed"),
        }
        None
    }
}
