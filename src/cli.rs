// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// There are no subcommands: one invocation is one run
//   verify sites -> render README -> save config -> (optionally) commit
// and the flags switch phases off or on.
//
// The camelCase flags (`--onlyUpdate`, `--urlCheck`) are what existing CI
// workflows already pass, so they are kept verbatim.
// =============================================================================

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

use crate::github::DEFAULT_API_BASE;

#[derive(Parser, Debug)]
#[command(
    name = "site-sentry",
    version,
    about = "Re-checks a curated site directory and regenerates its README listing",
    long_about = "site-sentry probes every site in the directory, discovers mirror deployments \
                  of the GitHub repos it lists, and rewrites the site list section of README.md. \
                  Run it from CI to keep the directory honest."
)]
pub struct Cli {
    /// Only regenerate README.md: no checks, no config save, no commit
    #[arg(long = "onlyUpdate")]
    pub only_update: bool,

    /// Probe sites and discover mirrors (`--urlCheck=false` renders and
    /// commits without probing)
    #[arg(
        long = "urlCheck",
        action = ArgAction::Set,
        default_value_t = true,
        default_missing_value = "true",
        num_args = 0..=1,
        require_equals = true
    )]
    pub url_check: bool,

    /// Commit and push the results (also enabled by CI=true)
    #[arg(long, env = "CI", value_parser = BoolishValueParser::new())]
    pub ci: bool,

    /// Commit and push the results
    #[arg(long)]
    pub commit: bool,

    /// Verbose logging
    #[arg(long, env = "SITE_SENTRY_DEBUG", value_parser = BoolishValueParser::new())]
    pub debug: bool,

    /// Directory holding README.md and sites.json
    #[arg(long, env = "SITE_SENTRY_ROOT", default_value = ".")]
    pub root_dir: PathBuf,

    /// Site config store [default: <root-dir>/sites.json]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Document to update [default: <root-dir>/README.md]
    #[arg(long)]
    pub readme: Option<PathBuf>,

    /// Maximum site probes in flight
    #[arg(long, default_value_t = 20)]
    pub concurrency: usize,

    /// Forks to scan per GitHub repo for homepage mirrors (0 = skip)
    #[arg(long, default_value_t = 0)]
    pub forks: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 15)]
    pub timeout: u64,

    /// GitHub API token (raises the API quota)
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// GitHub API base URL
    #[arg(long, default_value = DEFAULT_API_BASE)]
    pub github_api: String,
}
