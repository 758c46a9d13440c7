//! Inject repository context at session start.

use std::thread;

use anyhow::{Result, anyhow};
use tracing::debug;

use crate::core::types::FeatureResult;
use crate::features::{FeatureContext, Handler, Tracker};
use crate::io::git::Git;

pub fn load() -> Handler {
    Handler::Tracker(Box::new(GitContext))
}

pub struct GitContext;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Snapshot {
    branch: String,
    commits: Vec<String>,
    uncommitted: usize,
}

/// Query branch, recent commits and status concurrently.
fn snapshot(git: &Git, recent: u64) -> Result<Snapshot> {
    thread::scope(|scope| -> Result<Snapshot> {
        let branch = scope.spawn(|| git.current_branch());
        let commits = scope.spawn(|| git.recent_commits(recent));
        let status = scope.spawn(|| git.status_porcelain());
        let join_err = || anyhow!("git query thread panicked");
        Ok(Snapshot {
            branch: branch.join().map_err(|_| join_err())??,
            // A fresh repository has no commits yet.
            commits: commits.join().map_err(|_| join_err())?.unwrap_or_default(),
            uncommitted: status.join().map_err(|_| join_err())??.len(),
        })
    })
}

fn render(snapshot: &Snapshot) -> String {
    let mut out = String::new();
    out.push_str(&format!("Git branch: {}\n", snapshot.branch));
    out.push_str(&format!("Uncommitted files: {}\n", snapshot.uncommitted));
    if !snapshot.commits.is_empty() {
        out.push_str("Recent commits:\n");
        for commit in &snapshot.commits {
            out.push_str(&format!("  {commit}\n"));
        }
    }
    out
}

impl Tracker for GitContext {
    fn run(&self, ctx: &FeatureContext<'_>) -> Option<FeatureResult> {
        let git = Git::new(ctx.root);
        let recent = ctx.config.context.git_context.recent_commits;
        match snapshot(&git, recent) {
            Ok(snapshot) => Some(FeatureResult::context(render(&snapshot))),
            Err(err) => {
                debug!(workdir = %git.workdir().display(), err = %format!("{err:#}"), "no git context");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::process::Command;

    use super::*;
    use crate::core::event::{EventDetail, EventType};
    use crate::io::config::Config;
    use crate::test_support::event;

    #[test]
    fn renders_context_block() {
        let snapshot = Snapshot {
            branch: "main".to_string(),
            commits: vec!["abc123 first".to_string()],
            uncommitted: 2,
        };
        assert_eq!(
            render(&snapshot),
            "Git branch: main\nUncommitted files: 2\nRecent commits:\n  abc123 first\n"
        );
    }

    #[test]
    fn outside_a_repository_emits_nothing() {
        let temp = tempfile::tempdir().expect("tempdir");
        let config = Config::default();
        let start = event(EventType::SessionStart, EventDetail::Session { source: None });
        let ctx = FeatureContext { event: &start, config: &config, root: temp.path() };
        assert_eq!(GitContext.run(&ctx), None);
    }

    fn git(dir: &Path, args: &[&str]) -> bool {
        Command::new("git")
            .args(args)
            .current_dir(dir)
            .status()
            .is_ok_and(|status| status.success())
    }

    #[test]
    fn reports_branch_commits_and_changes() {
        let temp = tempfile::tempdir().expect("tempdir");
        let dir = temp.path();
        let ready = git(dir, &["init", "-q", "-b", "trunk"])
            && git(
                dir,
                &["-c", "user.name=t", "-c", "user.email=t@example.com", "commit", "-q", "--allow-empty", "-m", "first"],
            );
        if !ready {
            return;
        }
        std::fs::write(dir.join("new.txt"), "x").expect("write");

        let snap = snapshot(&Git::new(dir), 5).expect("snapshot");
        assert_eq!(snap.branch, "trunk");
        assert_eq!(snap.commits.len(), 1);
        assert!(snap.commits[0].ends_with("first"));
        assert_eq!(snap.uncommitted, 1);
    }
}
