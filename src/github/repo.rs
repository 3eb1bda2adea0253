// src/github/repo.rs
// =============================================================================
// Works out which GitHub repository a site entry belongs to.
//
// Supported URL formats:
//   - https://github.com/owner/repo
//   - https://github.com/owner/repo.git
//   - https://github.com/owner/repo/tree/main/...
//   - github.com/owner/repo
// =============================================================================

use anyhow::{anyhow, Result};

use crate::site::SiteEntry;

/// `owner/name` for an entry: its explicit `repo` tag, else parsed from the URL.
pub fn entry_repo(url: &str, entry: &SiteEntry) -> Option<String> {
    if let Some(repo) = entry.repo.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
        return Some(repo.to_string());
    }

    parse_github_url(url)
        .ok()
        .map(|(owner, repo)| format!("{}/{}", owner, repo))
}

// Parses a GitHub URL to extract owner and repository name
//
// Example:
//   "https://github.com/rust-lang/rust" -> ("rust-lang", "rust")
pub fn parse_github_url(url: &str) -> Result<(String, String)> {
    let url = url
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_start_matches("www.");

    let path = url
        .strip_prefix("github.com/")
        .ok_or_else(|| anyhow!("Not a GitHub URL: {}", url))?;

    let mut parts = path.split('/').filter(|p| !p.is_empty());
    let (Some(owner), Some(repo)) = (parts.next(), parts.next()) else {
        return Err(anyhow!("Invalid GitHub URL format: {}", url));
    };

    let repo = repo.trim_end_matches(".git");
    Ok((owner.to_string(), repo.to_string()))
}
