//! Built-in features and the handler interfaces they implement.
//!
//! A feature is either *authoritative* ([`Guard`]: guards, validators, the rate
//! limiter) or *best-effort* ([`Tracker`]: loggers, context injectors). The
//! split is in the signatures: a guard may fail and the registry's error
//! policy decides what a failure means, while a tracker has no way to return
//! an error and must absorb its own failures.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::core::event::{EventType, HookEvent};
use crate::core::types::{Category, ErrorPolicy, FeatureResult, GuardDecision};
use crate::io::config::Config;
use crate::registry::Descriptor;

pub mod command_guard;
pub mod diff_size;
pub mod event_log;
pub mod git_context;
pub mod protected_paths;
pub mod rate_limiter;
pub mod secret_scanner;
pub mod tool_permissions;
pub mod validators;

/// Inputs shared by every feature invocation.
#[derive(Debug, Clone, Copy)]
pub struct FeatureContext<'a> {
    pub event: &'a HookEvent,
    pub config: &'a Config,
    /// Directory relative paths resolve against (event cwd or process cwd).
    pub root: &'a Path,
}

impl FeatureContext<'_> {
    pub fn log_dir(&self) -> PathBuf {
        Config::resolve_dir(&self.config.log_dir, self.root)
    }

    pub fn state_dir(&self) -> PathBuf {
        Config::resolve_dir(&self.config.state_dir, self.root)
    }
}

/// Authoritative policy check.
pub trait Guard {
    /// Decide on the event. An `Err` means the policy could not be determined.
    fn evaluate(&self, ctx: &FeatureContext<'_>) -> Result<GuardDecision>;
}

/// Best-effort feature that never fails the pipeline.
pub trait Tracker {
    /// Record or emit context. Failures must be handled internally.
    fn run(&self, ctx: &FeatureContext<'_>) -> Option<FeatureResult>;
}

/// Executable behind a descriptor, produced lazily by its factory.
pub enum Handler {
    Guard(Box<dyn Guard>),
    Tracker(Box<dyn Tracker>),
}

/// The built-in catalog.
pub fn catalog() -> Vec<Descriptor> {
    vec![
        Descriptor {
            name: "eventLog",
            events: EventType::ALL,
            priority: 0,
            category: Category::Tracker,
            config_path: "trackers.eventLog",
            enabled: Some(|config: &Config| config.trackers.event_log.enabled),
            on_error: ErrorPolicy::Proceed,
            load: event_log::load,
        },
        Descriptor {
            name: "toolPermissions",
            events: &[EventType::PreToolUse],
            priority: 10,
            category: Category::Guard,
            config_path: "guards.toolPermissions",
            enabled: Some(|config: &Config| config.guards.tool_permissions.enabled),
            on_error: ErrorPolicy::Proceed,
            load: tool_permissions::load,
        },
        Descriptor {
            name: "commandGuard",
            events: &[EventType::PreToolUse],
            priority: 20,
            category: Category::Guard,
            config_path: "guards.commandGuard",
            enabled: Some(|config: &Config| config.guards.command_guard.enabled),
            on_error: ErrorPolicy::Proceed,
            load: command_guard::load,
        },
        Descriptor {
            name: "protectedPaths",
            events: &[EventType::PreToolUse],
            priority: 30,
            category: Category::Guard,
            config_path: "guards.protectedPaths",
            enabled: Some(|config: &Config| config.guards.protected_paths.enabled),
            on_error: ErrorPolicy::Proceed,
            load: protected_paths::load,
        },
        Descriptor {
            name: "secretScanner",
            events: &[EventType::PreToolUse, EventType::UserPromptSubmit],
            priority: 40,
            category: Category::Guard,
            config_path: "guards.secretScanner",
            enabled: Some(|config: &Config| config.guards.secret_scanner.enabled),
            on_error: ErrorPolicy::Proceed,
            load: secret_scanner::load,
        },
        Descriptor {
            name: "diffSize",
            events: &[EventType::PreToolUse],
            priority: 50,
            category: Category::Guard,
            config_path: "guards.diffSize",
            enabled: Some(|config: &Config| config.guards.diff_size.enabled),
            on_error: ErrorPolicy::Proceed,
            load: diff_size::load,
        },
        Descriptor {
            name: "rateLimiter",
            events: &[EventType::PreToolUse],
            priority: 90,
            category: Category::Guard,
            config_path: "rateLimiter",
            enabled: Some(|config: &Config| config.rate_limiter.enabled),
            on_error: ErrorPolicy::Proceed,
            load: rate_limiter::load,
        },
        Descriptor {
            name: "validators",
            events: &[EventType::PostToolUse],
            priority: 50,
            category: Category::Validator,
            config_path: "validators",
            enabled: Some(|config: &Config| config.validators.enabled),
            on_error: ErrorPolicy::Proceed,
            load: validators::load,
        },
        Descriptor {
            name: "gitContext",
            events: &[EventType::SessionStart],
            priority: 50,
            category: Category::Context,
            config_path: "context.gitContext",
            enabled: Some(|config: &Config| config.context.git_context.enabled),
            on_error: ErrorPolicy::Proceed,
            load: git_context::load,
        },
    ]
}
