//! Orchestration for a single hook invocation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, instrument};

use crate::core::event::{EventType, HookEvent, parse_event};
use crate::features::FeatureContext;
use crate::io::config::{self, Config};
use crate::output::{self, Protocol, Rendered};
use crate::pipeline;
use crate::registry::Registry;

/// A parsed event together with where its configuration lives.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub event: HookEvent,
    /// Project root: the event cwd, or the process cwd when absent.
    pub root: PathBuf,
    pub config_path: PathBuf,
}

impl Invocation {
    /// Normalize raw stdin text for `event_type`.
    ///
    /// Fails on protocol errors (empty input, invalid JSON, missing session).
    pub fn parse(event_type: EventType, input: &str, explicit_config: Option<&Path>) -> Result<Self> {
        let event = parse_event(event_type, input)?;
        let root = project_root(&event)?;
        let config_path = config::config_path(explicit_config, &root);
        Ok(Self {
            event,
            root,
            config_path,
        })
    }

    /// Whether the override file enables verbose logging.
    pub fn verbose_requested(&self) -> bool {
        config::peek_verbose(&self.config_path)
    }

    pub fn resolve_config(&self) -> Config {
        config::resolve(Some(&self.config_path))
    }

    /// Run the pipeline and render its result.
    #[instrument(skip_all, fields(event = %self.event.event_type))]
    pub fn run(&self, registry: &Registry, protocol: Option<Protocol>) -> Result<Rendered> {
        let config = self.resolve_config();
        let ctx = FeatureContext {
            event: &self.event,
            config: &config,
            root: &self.root,
        };
        let aggregated = pipeline::run(registry, &ctx);
        let protocol = Protocol::select(protocol, self.event.flavor);
        debug!(%protocol, exit_code = aggregated.exit_code, "rendering result");
        output::render(self.event.event_type, &aggregated, protocol)
    }
}

fn project_root(event: &HookEvent) -> Result<PathBuf> {
    match event.cwd.as_deref().filter(|cwd| !cwd.as_os_str().is_empty()) {
        Some(cwd) => Ok(cwd.to_path_buf()),
        None => std::env::current_dir().context("resolve current directory"),
    }
}

/// Parse, resolve and run in one call.
pub fn run_hook(
    registry: &Registry,
    event_type: EventType,
    input: &str,
    explicit_config: Option<&Path>,
    protocol: Option<Protocol>,
) -> Result<Rendered> {
    Invocation::parse(event_type, input, explicit_config)?.run(registry, protocol)
}
