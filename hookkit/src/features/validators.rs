//! Run configured check commands after file edits.

use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::core::edits::is_edit_tool;
use crate::core::types::GuardDecision;
use crate::features::{FeatureContext, Guard, Handler};
use crate::io::process::run_command_with_timeout;

/// Bytes captured per stream before the tail is cut for reporting.
pub const CAPTURE_LIMIT_BYTES: usize = 1_000_000;

pub fn load() -> Handler {
    Handler::Guard(Box::new(Validators { runner: ShellRunner }))
}

#[derive(Debug, Clone)]
pub struct ValidationRequest {
    pub command: String,
    pub workdir: PathBuf,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Pass,
    Fail { exit_code: Option<i32>, output: String },
    TimedOut,
}

pub trait ValidatorRunner {
    fn run(&self, request: &ValidationRequest) -> Result<ValidationOutcome>;
}

/// Runs each command through `sh -c` in the request's working directory.
pub struct ShellRunner;

impl ValidatorRunner for ShellRunner {
    fn run(&self, request: &ValidationRequest) -> Result<ValidationOutcome> {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(&request.command).current_dir(&request.workdir);
        let output = run_command_with_timeout(cmd, request.timeout, CAPTURE_LIMIT_BYTES)?;
        if output.timed_out {
            return Ok(ValidationOutcome::TimedOut);
        }
        if output.status.success() {
            return Ok(ValidationOutcome::Pass);
        }
        let mut text = output.combined_text();
        text.push_str(&output.truncated_notice());
        Ok(ValidationOutcome::Fail {
            exit_code: output.status.code(),
            output: text,
        })
    }
}

pub struct Validators<R> {
    runner: R,
}

impl<R: ValidatorRunner> Validators<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }
}

impl<R: ValidatorRunner> Guard for Validators<R> {
    fn evaluate(&self, ctx: &FeatureContext<'_>) -> Result<GuardDecision> {
        let Some(tool) = ctx.event.tool_name() else {
            return Ok(GuardDecision::Proceed);
        };
        if !is_edit_tool(tool) {
            return Ok(GuardDecision::Proceed);
        }
        let settings = &ctx.config.validators;
        let limit = usize::try_from(settings.output_limit_bytes).unwrap_or(usize::MAX);
        let mut warnings = Vec::new();

        for command in &settings.commands {
            let request = ValidationRequest {
                command: command.clone(),
                workdir: ctx.root.to_path_buf(),
                timeout: Duration::from_secs(settings.timeout_secs),
            };
            debug!(command = %request.command, "running validator");
            match self.runner.run(&request)? {
                ValidationOutcome::Pass => {}
                ValidationOutcome::TimedOut => {
                    warn!(command = %request.command, timeout_secs = settings.timeout_secs, "validator timed out");
                    warnings.push(format!(
                        "Validator `{command}` timed out after {}s",
                        settings.timeout_secs
                    ));
                }
                ValidationOutcome::Fail { exit_code, output } => {
                    info!(command = %request.command, exit_code = ?exit_code, "validator failed");
                    let status = exit_code.map_or_else(|| "signal".to_string(), |code| format!("exit {code}"));
                    return Ok(GuardDecision::block_with_details(
                        format!("Validator `{command}` failed ({status})"),
                        tail(output.trim_end(), limit),
                    ));
                }
            }
        }

        if warnings.is_empty() {
            Ok(GuardDecision::Proceed)
        } else {
            Ok(GuardDecision::warn(warnings.join("\n")))
        }
    }
}

/// Last `limit` bytes of `text`, on a char boundary.
fn tail(text: &str, limit: usize) -> String {
    if text.len() <= limit {
        return text.to_string();
    }
    let mut start = text.len() - limit;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    format!("[... {start} bytes omitted]\n{}", &text[start..])
}
