//! Classification of tool calls that modify files.

use serde_json::Value;

/// Tools that write or edit files.
pub const EDIT_TOOLS: &[&str] = &["Write", "Edit", "MultiEdit", "NotebookEdit"];

pub fn is_edit_tool(tool_name: &str) -> bool {
    EDIT_TOOLS.contains(&tool_name)
}

/// Path targeted by an edit tool, if any.
pub fn target_path<'a>(tool_name: &str, input: &'a Value) -> Option<&'a str> {
    if !is_edit_tool(tool_name) {
        return None;
    }
    input
        .get("file_path")
        .or_else(|| input.get("notebook_path"))
        .and_then(Value::as_str)
}

/// Text a tool call is about to write.
///
/// - `Write`: `content`
/// - `Edit`: `new_string`
/// - `MultiEdit`: every `edits[].new_string`
/// - `NotebookEdit`: `new_source`
pub fn written_text<'a>(tool_name: &str, input: &'a Value) -> Vec<&'a str> {
    match tool_name {
        "Write" => str_field(input, "content").into_iter().collect(),
        "Edit" => str_field(input, "new_string").into_iter().collect(),
        "NotebookEdit" => str_field(input, "new_source").into_iter().collect(),
        "MultiEdit" => input
            .get("edits")
            .and_then(Value::as_array)
            .map(|edits| {
                edits
                    .iter()
                    .filter_map(|edit| edit.get("new_string").and_then(Value::as_str))
                    .collect()
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

fn str_field<'a>(input: &'a Value, name: &str) -> Option<&'a str> {
    input.get(name).and_then(Value::as_str)
}

/// Number of lines a tool call writes.
pub fn written_line_count(tool_name: &str, input: &Value) -> usize {
    written_text(tool_name, input)
        .iter()
        .map(|text| text.lines().count())
        .sum()
}
