// src/checker/mod.rs
// =============================================================================
// This module contains the link checking logic.
//
// Submodules:
// - http: Probes a URL and classifies the outcome (alive / redirected /
//   HTTP error / verify failure / transport error)
//
// Rust concepts:
// - pub use: Re-export items so callers write `checker::LinkChecker`
// =============================================================================

mod http;

pub use http::{CheckOptions, LinkCheckResult, LinkChecker};

#[cfg(test)]
pub use http::{LinkStatus, CODE_TRANSPORT};
