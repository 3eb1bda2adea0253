// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens in one run:
// 1. Parse flags, load the site config store (its `ci` / `debug` switches
//    are OR-ed with the flags), set up logging
// 2. Verify: probe every site, discover mirrors (skipped by --onlyUpdate
//    and --urlCheck=false)
// 3. Render the ranked listing into README.md (always)
// 4. Save the config store, then commit if asked (skipped by --onlyUpdate)
// 5. Log `done! Total: <listed> / <all>` and exit
//
// Exit codes:
//   0 = success
//   1 = verification aborted on an exhausted GitHub quota (README and config
//       are still written with what was gathered)
//   2 = any other error
// =============================================================================

mod checker;
mod cli;
mod config;
mod error;
mod gitcommit;
mod github;
mod render;
mod site;
mod verify;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use checker::LinkChecker;
use cli::Cli;
use config::RunOptions;
use github::GithubClient;
use site::SiteStore;
use verify::SiteVerifier;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let mut options = RunOptions::from_cli(&cli);

    // The store can switch on debug logging, so it is read before the
    // subscriber is installed
    let store = config::load_store(&options.config_path);
    if let Ok(store) = &store {
        options.merge_store(store);
    }
    init_tracing(options.debug);

    let outcome = match store {
        Ok(store) => run(&cli, &options, store).await,
        Err(e) => Err(e.into()),
    };

    let exit_code = match outcome {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// RUST_LOG wins; otherwise info, or debug with --debug
fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn run(cli: &Cli, options: &RunOptions, mut store: SiteStore) -> Result<i32> {
    debug!(
        config = %options.config_path.display(),
        readme = %options.readme_path.display(),
        sites = store.site_info.len(),
        ci = options.ci,
        "starting"
    );

    let mut exit_code = 0;

    if !cli.only_update && cli.url_check {
        let checker = LinkChecker::new(options.timeout).context("failed to build HTTP client")?;
        let github = GithubClient::new(&options.github_api, options.github_token.as_deref(), options.timeout)
            .context("failed to build GitHub client")?;

        let verifier = SiteVerifier::new(&checker, &github, options.verify.clone());
        if let Err(e) = verifier.run(&mut store).await {
            // Keep going: whatever was verified before the abort still gets
            // rendered and saved
            error!("verification aborted: {}", e);
            exit_code = 1;
        }
    }

    let rendered = render::render(&store);
    render::update_readme(&options.readme_path, &rendered)?;

    if !cli.only_update {
        config::save_store(&options.config_path, &store)?;
        if options.wants_commit() {
            gitcommit::git_commit(&options.root_dir)?;
        }
    }

    info!("done! Total: {} / {}", rendered.total, store.site_info.len());
    Ok(exit_code)
}
