//! Block oversized writes.

use anyhow::Result;

use crate::core::edits::written_line_count;
use crate::core::types::GuardDecision;
use crate::features::{FeatureContext, Guard, Handler};

pub fn load() -> Handler {
    Handler::Guard(Box::new(DiffSize))
}

pub struct DiffSize;

impl Guard for DiffSize {
    fn evaluate(&self, ctx: &FeatureContext<'_>) -> Result<GuardDecision> {
        let (Some(tool), Some(input)) = (ctx.event.tool_name(), ctx.event.tool_input()) else {
            return Ok(GuardDecision::Proceed);
        };
        let lines = written_line_count(tool, input) as u64;
        let max_lines = ctx.config.guards.diff_size.max_lines;
        if lines <= max_lines {
            return Ok(GuardDecision::Proceed);
        }
        Ok(GuardDecision::block_with_details(
            format!("Change too large: {lines} lines exceeds limit of {max_lines} lines"),
            "split the change into smaller edits or raise guards.diffSize.maxLines",
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::core::event::EventType;
    use crate::io::config::Config;
    use crate::test_support::{tool_event, write_input};

    fn decide(lines: usize, max_lines: u64) -> GuardDecision {
        let mut config = Config::default();
        config.guards.diff_size.max_lines = max_lines;
        let event = tool_event(EventType::PreToolUse, "Write", write_input("big.rs", lines));
        let ctx = FeatureContext { event: &event, config: &config, root: Path::new(".") };
        DiffSize.evaluate(&ctx).expect("evaluate")
    }

    #[test]
    fn blocks_above_limit_with_both_numbers() {
        match decide(600, 500) {
            GuardDecision::Block { message, .. } => {
                assert!(message.contains("600"));
                assert!(message.contains("500"));
            }
            other => panic!("expected block, got {other:?}"),
        }
    }

    #[test]
    fn limit_itself_is_allowed() {
        assert_eq!(decide(500, 500), GuardDecision::Proceed);
        assert!(matches!(decide(501, 500), GuardDecision::Block { .. }));
    }
}
