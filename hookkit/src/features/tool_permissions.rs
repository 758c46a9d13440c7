//! Block tools denied by name in configuration.

use anyhow::Result;

use crate::core::types::GuardDecision;
use crate::features::{FeatureContext, Guard, Handler};

pub fn load() -> Handler {
    Handler::Guard(Box::new(ToolPermissions))
}

pub struct ToolPermissions;

impl Guard for ToolPermissions {
    fn evaluate(&self, ctx: &FeatureContext<'_>) -> Result<GuardDecision> {
        let Some(tool) = ctx.event.tool_name() else {
            return Ok(GuardDecision::Proceed);
        };
        let denied = &ctx.config.guards.tool_permissions.deny_tools;
        if denied.iter().any(|name| name == tool) {
            return Ok(GuardDecision::block(format!(
                "Tool `{tool}` is denied by hook configuration"
            )));
        }
        Ok(GuardDecision::Proceed)
    }
}
