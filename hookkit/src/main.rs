//! Hook entry points for coding-agent hosts.
//!
//! Each event subcommand reads one JSON object on stdin, runs the enabled
//! features for that event and answers with stdout, stderr and an exit code
//! the host understands.

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use hookkit::core::event::EventType;
use hookkit::core::types::Category;
use hookkit::exit_codes;
use hookkit::hook::Invocation;
use hookkit::io::config::{self, Config};
use hookkit::logging;
use hookkit::output::{Protocol, Rendered, catalog_table};
use hookkit::registry::{Descriptor, Registry};

#[derive(Parser)]
#[command(name = "hookkit", version, about = "Policy hooks for coding-agent hosts")]
struct Cli {
    /// Debug logging on stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Before a tool runs; may block it.
    PreToolUse(HookArgs),
    /// After a tool ran; runs validators.
    PostToolUse(HookArgs),
    /// Before a prompt is sent to the model.
    UserPromptSubmit(HookArgs),
    /// A session started or resumed; may add context.
    SessionStart(HookArgs),
    SessionEnd(HookArgs),
    Stop(HookArgs),
    SubagentStop(HookArgs),
    Notification(HookArgs),
    PreCompact(HookArgs),
    /// List features in execution order with their enabled state.
    Features {
        /// Only features participating in this event (e.g. PreToolUse).
        #[arg(long)]
        event: Option<EventType>,
        /// Only features in this category.
        #[arg(long)]
        category: Option<Category>,
        #[arg(long, value_name = "PATH", env = config::CONFIG_ENV)]
        config: Option<PathBuf>,
    },
    /// Print the resolved configuration as JSON.
    Config {
        #[arg(long, value_name = "PATH", env = config::CONFIG_ENV)]
        config: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Clone, Default)]
struct HookArgs {
    /// Override file (default: `.hookkit/config.json` under the event cwd).
    #[arg(long, value_name = "PATH", env = config::CONFIG_ENV)]
    config: Option<PathBuf>,
    /// Output protocol; defaults to the wire shape of the input.
    #[arg(long)]
    protocol: Option<Protocol>,
}

impl Command {
    fn hook(&self) -> Option<(EventType, &HookArgs)> {
        let event = match self {
            Command::PreToolUse(args) => (EventType::PreToolUse, args),
            Command::PostToolUse(args) => (EventType::PostToolUse, args),
            Command::UserPromptSubmit(args) => (EventType::UserPromptSubmit, args),
            Command::SessionStart(args) => (EventType::SessionStart, args),
            Command::SessionEnd(args) => (EventType::SessionEnd, args),
            Command::Stop(args) => (EventType::Stop, args),
            Command::SubagentStop(args) => (EventType::SubagentStop, args),
            Command::Notification(args) => (EventType::Notification, args),
            Command::PreCompact(args) => (EventType::PreCompact, args),
            Command::Features { .. } | Command::Config { .. } => return None,
        };
        Some(event)
    }
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INTERNAL);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    if let Some((event_type, args)) = cli.command.hook() {
        return cmd_hook(event_type, args, cli.verbose);
    }
    logging::init(cli.verbose);
    match cli.command {
        Command::Features {
            event,
            category,
            config,
        } => cmd_features(event, category, config.as_deref()),
        Command::Config { config } => cmd_config(config.as_deref()),
        _ => Ok(exit_codes::OK),
    }
}

fn cmd_hook(event_type: EventType, args: &HookArgs, verbose: bool) -> Result<i32> {
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("read hook input from stdin")?;
    let invocation = Invocation::parse(event_type, &input, args.config.as_deref())?;
    logging::init(verbose || invocation.verbose_requested());
    let registry = Registry::builtin()?;
    let rendered = invocation.run(&registry, args.protocol)?;
    emit(&rendered)?;
    Ok(rendered.exit_code)
}

fn cmd_features(event: Option<EventType>, category: Option<Category>, config_override: Option<&Path>) -> Result<i32> {
    let config = load_config(config_override)?;
    let registry = Registry::builtin()?;
    let mut descriptors: Vec<&Descriptor> = match event {
        Some(event) => registry.descriptors_for(event),
        None => {
            let mut all: Vec<&Descriptor> = registry.descriptors().iter().collect();
            all.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.name.cmp(b.name)));
            all
        }
    };
    if let Some(category) = category {
        descriptors.retain(|descriptor| descriptor.category == category);
    }
    print!("{}", catalog_table(&descriptors, &config));
    Ok(exit_codes::OK)
}

fn cmd_config(config_override: Option<&Path>) -> Result<i32> {
    let config = load_config(config_override)?;
    let payload = serde_json::to_string_pretty(&config).context("serialize config")?;
    println!("{payload}");
    Ok(exit_codes::OK)
}

fn load_config(config_override: Option<&Path>) -> Result<Config> {
    let root = std::env::current_dir().context("resolve current directory")?;
    let path = config::config_path(config_override, &root);
    Ok(config::resolve(Some(&path)))
}

fn emit(rendered: &Rendered) -> Result<()> {
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(rendered.stdout.as_bytes())
        .context("write stdout")?;
    stdout.flush().context("flush stdout")?;
    let mut stderr = io::stderr().lock();
    stderr
        .write_all(rendered.stderr.as_bytes())
        .context("write stderr")?;
    stderr.flush().context("flush stderr")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_event_subcommand() {
        let cli = Cli::parse_from(["hookkit", "pre-tool-use"]);
        let (event, args) = cli.command.hook().expect("hook command");
        assert_eq!(event, EventType::PreToolUse);
        assert!(args.protocol.is_none());
    }

    #[test]
    fn parse_protocol_and_config() {
        let cli = Cli::parse_from([
            "hookkit",
            "session-start",
            "--protocol",
            "json",
            "--config",
            "/tmp/hooks.json",
            "--verbose",
        ]);
        assert!(cli.verbose);
        let (event, args) = cli.command.hook().expect("hook command");
        assert_eq!(event, EventType::SessionStart);
        assert_eq!(args.protocol, Some(Protocol::Json));
        assert_eq!(args.config.as_deref(), Some(Path::new("/tmp/hooks.json")));
    }

    #[test]
    fn parse_features_filters() {
        let cli = Cli::parse_from(["hookkit", "features", "--event", "PreToolUse", "--category", "guard"]);
        match cli.command {
            Command::Features { event, category, .. } => {
                assert_eq!(event, Some(EventType::PreToolUse));
                assert_eq!(category, Some(Category::Guard));
            }
            _ => panic!("expected features command"),
        }
    }

    #[test]
    fn rejects_unknown_protocol() {
        assert!(Cli::try_parse_from(["hookkit", "stop", "--protocol", "xml"]).is_err());
    }
}
