// src/gitcommit.rs
// =============================================================================
// Commits and pushes the regenerated README / config from CI.
//
// Runs plain `git` commands in the site root. Nothing is committed when
// `git status --short` reports no changes.
// =============================================================================

use anyhow::{bail, Context, Result};
use chrono::{SecondsFormat, Utc};
use std::path::Path;
use std::process::Command;
use tracing::info;

const BOT_NAME: &str = "github-actions[bot]";
const BOT_EMAIL: &str = "41898282+github-actions[bot]@users.noreply.github.com";

/// Commits every change under `root` and pushes. Returns whether a commit
/// was made.
pub fn git_commit(root: &Path) -> Result<bool> {
    let status = git(root, &["status", "--short"])?;
    if !has_changes(&status) {
        info!("[gitCommit] not updated");
        return Ok(false);
    }

    info!("[gitCommit] changes:\n{}", status.trim_end());

    let message = commit_message(Utc::now());
    git(root, &["config", "user.name", BOT_NAME])?;
    git(root, &["config", "user.email", BOT_EMAIL])?;
    git(root, &["add", "--all"])?;
    git(root, &["commit", "-m", &message])?;
    git(root, &["push"])?;

    Ok(true)
}

// A couple of stray characters (e.g. a lone "M") are not worth a commit
fn has_changes(status: &str) -> bool {
    status.trim().len() > 5
}

fn commit_message(now: chrono::DateTime<Utc>) -> String {
    format!("Updated at {}", now.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn git(root: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(root)
        .output()
        .with_context(|| format!("failed to run git {}", args.join(" ")))?;

    if !output.status.success() {
        bail!(
            "git {} failed ({}): {}",
            args.join(" "),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
