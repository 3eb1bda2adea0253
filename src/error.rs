// src/error.rs
// =============================================================================
// Typed errors for the parts of the run that callers need to tell apart.
//
// Most failures never get here: a dead link is recorded on its entry, and an
// empty or malformed API payload is logged and treated as "no new data".
// What remains is the quota-exhaustion abort and config store I/O.
// =============================================================================

use std::path::PathBuf;
use thiserror::Error;

/// Failures from the GitHub mirror discovery phase.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    /// The platform quota is exhausted. Fatal for the whole run: the reset
    /// time is outside our control, so we stop instead of retrying.
    #[error("[{repo}] {message}")]
    RateLimited { repo: String, message: String },
}

/// Failures loading or saving the site config store.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}
