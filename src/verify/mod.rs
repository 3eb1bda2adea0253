// src/verify/mod.rs
// =============================================================================
// The verification phase: brings every entry's status flags up to date.
//
// How a run goes:
// 1. Probe every visible entry (bounded concurrency), record the outcome
// 2. For entries backed by a GitHub repo, discover mirror URLs (forks'
//    homepages + latest commit comment links), one repo at a time
// 3. Append unseen mirrors as new entries and probe them too
//
// Failure handling:
// - A dead link is recorded on its entry; the run continues
// - A soft API failure means "no mirrors for this repo"; the run continues
// - An exhausted API quota aborts the run. Mirrors appended before the abort
//   stay in the store, so the caller can still save partial progress.
// =============================================================================

use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::checker::{CheckOptions, LinkCheckResult, LinkChecker};
use crate::error::DiscoveryError;
use crate::github::{entry_repo, latest_commit_urls, list_forks, ForkQuery, GithubClient};
use crate::site::{normalize, Invalid, SiteEntry, SiteStore};

/// After this many consecutive failures an entry is marked `invalid: true`.
pub const INVALID_AFTER: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyOptions {
    /// Maximum probes in flight
    pub concurrency: usize,
    /// Forks to scan per repo for homepages (0 disables the fork scan)
    pub forks_per_repo: usize,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        VerifyOptions {
            concurrency: 20,
            forks_per_repo: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VerifySummary {
    pub checked: usize,
    pub failed: usize,
    pub redirected: usize,
    pub added: usize,
}

pub struct SiteVerifier<'a> {
    checker: &'a LinkChecker,
    github: &'a GithubClient,
    options: VerifyOptions,
}

impl<'a> SiteVerifier<'a> {
    pub fn new(checker: &'a LinkChecker, github: &'a GithubClient, options: VerifyOptions) -> Self {
        SiteVerifier {
            checker,
            github,
            options,
        }
    }

    /// Runs the whole phase over `store`, mutating it in place.
    ///
    /// Only `DiscoveryError::RateLimited` is returned, unchanged from where
    /// discovery raised it.
    pub async fn run(&self, store: &mut SiteStore) -> Result<VerifySummary, DiscoveryError> {
        let mut summary = VerifySummary::default();

        let targets: Vec<String> = store.visible().map(|(url, _)| url.clone()).collect();
        info!(count = targets.len(), "checking sites");
        self.probe(store, targets, &mut summary).await;

        let added = self.discover_mirrors(store).await?;
        summary.added = added.len();
        if !added.is_empty() {
            info!(count = added.len(), "checking new mirrors");
            self.probe(store, added, &mut summary).await;
        }

        info!(
            checked = summary.checked,
            failed = summary.failed,
            redirected = summary.redirected,
            added = summary.added,
            "verification finished"
        );
        Ok(summary)
    }

    async fn probe(&self, store: &mut SiteStore, urls: Vec<String>, summary: &mut VerifySummary) {
        let results = self
            .checker
            .check_many(urls, &CheckOptions::default(), self.options.concurrency)
            .await;

        // All probes are done before any entry is touched
        for (url, result) in results {
            let Some(entry) = store.site_info.get_mut(&url) else {
                continue;
            };

            summary.checked += 1;
            if result.redirected {
                summary.redirected += 1;
                info!(url = %url, target = %result.url, "redirected");
            }
            if !result.is_ok() {
                summary.failed += 1;
                warn!(url = %url, code = result.code, errmsg = %result.errmsg, "check failed");
            }

            apply_check(entry, &result);
        }
    }

    // Walks repo-backed entries in store order. Returns the URLs appended.
    async fn discover_mirrors(&self, store: &mut SiteStore) -> Result<Vec<String>, DiscoveryError> {
        let repos: Vec<(String, Vec<String>)> = store
            .visible()
            .filter_map(|(url, entry)| entry_repo(url, entry).map(|repo| (repo, entry.tags.clone())))
            .collect();

        let mut known: HashSet<String> = store.site_info.keys().map(|url| normalize(url)).collect();
        let mut added = Vec::new();

        for (repo, tags) in repos {
            let mut candidates: Vec<String> = Vec::new();

            if self.options.forks_per_repo > 0 {
                let forks = list_forks(self.github, &repo, self.options.forks_per_repo, ForkQuery::default()).await;
                candidates.extend(forks.iter().filter_map(|f| f.homepage_url()).map(str::to_string));
            }

            // `?` here is the only way out of the run besides finishing it
            let found = latest_commit_urls(self.github, &repo).await?;
            debug!(
                repo = %found.repo,
                urls = found.urls.len(),
                remaining = found.rate.remaining,
                message = %found.message,
                "commit links"
            );
            candidates.extend(found.urls);

            for candidate in candidates {
                let url = normalize(candidate.trim());
                if url.is_empty() || !known.insert(url.clone()) {
                    continue;
                }

                info!(repo = %repo, url = %url, "new mirror");
                store
                    .site_info
                    .insert(url.clone(), SiteEntry::mirror_of(&repo, tags.clone()));
                added.push(url);
            }
        }

        Ok(added)
    }
}

/// Records one probe outcome on its entry.
///
/// - success: failure counter, errmsg and a boolean `invalid` are cleared;
///   a written `invalid` reason is curator data and stays
/// - failure: counter + 1, errmsg = the probe's message, `invalid: true`
///   once the counter passes INVALID_AFTER
pub fn apply_check(entry: &mut SiteEntry, result: &LinkCheckResult) {
    if result.is_ok() {
        entry.need_verify = None;
        entry.errmsg = None;
        if matches!(entry.invalid, Some(Invalid::Flag(_))) {
            entry.invalid = None;
        }
        return;
    }

    let failures = entry.need_verify.unwrap_or(0).saturating_add(1);
    entry.need_verify = Some(failures);
    entry.errmsg = Some(result.errmsg.clone());

    if failures > INVALID_AFTER && !entry.flags().invalid {
        entry.invalid = Some(Invalid::Flag(true));
    }
}
