// src/config.rs
// =============================================================================
// Run options and the JSON site config store.
//
// The store is one file (default `<root>/sites.json`):
//
//   {
//     "siteInfo":     { "https://a.com": { "title": "...", "type": ["ai"] } },
//     "categoryInfo": { "ai": { "sort": 10 } }
//   }
//
// Saving re-serializes the whole store and only touches the disk when the
// bytes differ, so an unchanged run leaves the file (and git) clean.
// =============================================================================

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::cli::Cli;
use crate::error::ConfigError;
use crate::site::SiteStore;
use crate::verify::VerifyOptions;

/// Everything a run needs to know, resolved from CLI flags and environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub root_dir: PathBuf,
    pub config_path: PathBuf,
    pub readme_path: PathBuf,
    pub debug: bool,
    pub ci: bool,
    pub commit: bool,
    pub timeout: Duration,
    pub github_api: String,
    pub github_token: Option<String>,
    pub verify: VerifyOptions,
}

impl RunOptions {
    pub fn from_cli(cli: &Cli) -> Self {
        let root_dir = cli.root_dir.clone();
        RunOptions {
            config_path: cli.config.clone().unwrap_or_else(|| root_dir.join("sites.json")),
            readme_path: cli.readme.clone().unwrap_or_else(|| root_dir.join("README.md")),
            root_dir,
            debug: cli.debug,
            ci: cli.ci,
            commit: cli.commit,
            timeout: Duration::from_secs(cli.timeout),
            github_api: cli.github_api.clone(),
            github_token: cli.github_token.clone(),
            verify: VerifyOptions {
                concurrency: cli.concurrency,
                forks_per_repo: cli.forks,
            },
        }
    }

    /// Folds in the `ci` / `debug` switches kept in the config store. Either
    /// source turning a switch on is enough.
    pub fn merge_store(&mut self, store: &SiteStore) {
        self.ci |= store.ci.unwrap_or(false);
        self.debug |= store.debug.unwrap_or(false);
    }

    pub fn wants_commit(&self) -> bool {
        self.ci || self.commit
    }
}

pub fn load_store(path: &Path) -> Result<SiteStore, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let store: SiteStore = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(
        path = %path.display(),
        sites = store.site_info.len(),
        categories = store.category_info.len(),
        "config loaded"
    );
    Ok(store)
}

/// Writes the store if it differs from what is on disk. Returns whether it
/// wrote.
pub fn save_store(path: &Path, store: &SiteStore) -> Result<bool, ConfigError> {
    let mut serialized = serde_json::to_string_pretty(store)?;
    serialized.push('\n');

    if fs::read_to_string(path).is_ok_and(|current| current == serialized) {
        debug!(path = %path.display(), "config unchanged");
        return Ok(false);
    }

    fs::write(path, serialized).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), sites = store.site_info.len(), "config saved");
    Ok(true)
}
