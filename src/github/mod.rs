// src/github/mod.rs
// =============================================================================
// This module talks to the GitHub REST API to discover mirror URLs of the
// repositories listed in the site directory.
//
// Submodules:
// - api: HTTP client, rate-limit headers, success/error payloads
// - repo: which repository (owner/name) a site entry points at
// - forks: paginated fork listing (fork homepages are mirrors)
// - commits: deployment links from the latest commit comments
// - links: Markdown link extraction
// =============================================================================

mod api;
mod commits;
mod forks;
mod links;
mod repo;

pub use api::{GithubClient, DEFAULT_API_BASE};
pub use commits::latest_commit_urls;
pub use forks::{list_forks, ForkQuery};
pub use repo::entry_repo;
