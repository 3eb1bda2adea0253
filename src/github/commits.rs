// src/github/commits.rs
// =============================================================================
// Finds deployment URLs a repo announces in its latest commit comments.
//
// Deployment bots (Vercel, Netlify...) comment on each commit with preview
// links. We look at the 5 most recent commits, take the first one that has
// comments, and harvest the links in its first comment.
//
// Preview hosts produce a new URL per deployment, so at most ONE of those is
// kept per repo: the shortest (usually the stable production alias), first
// seen on ties.
//
// Rate limits:
// - "API rate limit ..." message  -> DiscoveryError::RateLimited (fatal)
// - quota resets in under 2 min   -> sleep it out, then return
// - anything else                 -> warn, return no URLs
// =============================================================================

use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use super::api::{now_ms, GithubClient, RateLimitSnapshot};
use super::links::extract_markdown_links;
use crate::error::DiscoveryError;
use crate::site::strip_trailing_slash;

/// Hosts whose subdomains are per-deployment preview URLs.
pub const PREVIEW_HOSTS: [&str; 2] = ["vercel.app", "netlify.app"];

const RECENT_COMMITS: u32 = 5;

#[derive(Debug, Deserialize)]
struct CommitSummary {
    comments_url: String,
    #[serde(default)]
    commit: CommitDetail,
}

#[derive(Debug, Default, Deserialize)]
struct CommitDetail {
    #[serde(default)]
    comment_count: u64,
}

#[derive(Debug, Deserialize)]
struct CommitComment {
    #[serde(default)]
    body: String,
}

/// What one repo's latest commit comments yielded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitUrls {
    pub repo: String,
    /// Discovered URLs, trailing slash stripped, preview URL last
    pub urls: Vec<String>,
    /// API error message when the commit list could not be fetched
    pub message: String,
    pub rate: RateLimitSnapshot,
}

pub async fn latest_commit_urls(client: &GithubClient, repo: &str) -> Result<CommitUrls, DiscoveryError> {
    let mut result = CommitUrls {
        repo: repo.to_string(),
        ..Default::default()
    };

    let url = client.repo_url(repo, "commits");
    let response = match client
        .get_list::<CommitSummary>(&url, &[("per_page", RECENT_COMMITS.to_string())])
        .await
    {
        Ok(response) => response,
        Err(e) => {
            warn!(repo, error = %e, "failed to fetch commits");
            result.message = e.to_string();
            return Ok(result);
        }
    };
    result.rate = response.rate;

    let commits = match response.data {
        Ok(commits) => commits,
        Err(failure) => {
            warn!(
                repo,
                message = %failure.message,
                limit = result.rate.limit,
                remaining = result.rate.remaining,
                reset_at_ms = result.rate.reset_at_ms,
                "failed to fetch commits"
            );

            if failure.is_rate_limit() {
                return Err(DiscoveryError::RateLimited {
                    repo: repo.to_string(),
                    message: failure.message,
                });
            }

            result.message = failure.message;
            backoff_if_short(&result.rate).await;
            return Ok(result);
        }
    };

    if result.rate.is_exhausted() {
        backoff_if_short(&result.rate).await;
    }

    let Some(commented) = commits.into_iter().find(|c| c.commit.comment_count > 0) else {
        debug!(repo, "no commented commit among the latest {}", RECENT_COMMITS);
        return Ok(result);
    };

    let comments = match client.get_list::<CommitComment>(&commented.comments_url, &[]).await {
        Ok(response) => response.data,
        Err(e) => {
            warn!(repo, url = %commented.comments_url, error = %e, "failed to fetch comments");
            return Ok(result);
        }
    };

    let first_body = match comments {
        Ok(comments) => match comments.into_iter().next() {
            Some(comment) => comment.body,
            None => {
                warn!(repo, url = %commented.comments_url, "comments list is empty");
                return Ok(result);
            }
        },
        Err(failure) => {
            warn!(repo, url = %commented.comments_url, message = %failure.message, "failed to fetch comments");
            return Ok(result);
        }
    };

    result.urls = collect_deploy_urls(&first_body);
    Ok(result)
}

// Collapses preview-host links into one representative and keeps every
// other http(s) link as-is, in order.
pub fn collect_deploy_urls(markdown: &str) -> Vec<String> {
    let mut urls = Vec::new();
    let mut preview: Option<String> = None;

    for target in extract_markdown_links(markdown) {
        let target = strip_trailing_slash(&target).to_string();

        if is_preview_host(&target) {
            if preview.as_ref().map_or(true, |best| target.len() < best.len()) {
                preview = Some(target);
            }
        } else {
            urls.push(target);
        }
    }

    urls.extend(preview);
    urls
}

fn is_preview_host(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };

    PREVIEW_HOSTS
        .iter()
        .any(|suffix| host == *suffix || host.ends_with(&format!(".{}", suffix)))
}

async fn backoff_if_short(rate: &RateLimitSnapshot) {
    if let Some(wait) = rate.short_wait(now_ms()) {
        warn!(wait_ms = wait.as_millis() as u64, "rate limit resets soon, waiting");
        tokio::time::sleep(wait).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::{Duration, Instant};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> GithubClient {
        GithubClient::new(&server.uri(), None, Duration::from_secs(5)).unwrap()
    }

    async fn mount_commits(server: &MockServer, comment_counts: &[u64]) {
        let commits: Vec<_> = comment_counts
            .iter()
            .enumerate()
            .map(|(i, count)| {
                json!({
                    "sha": format!("sha{i}"),
                    "comments_url": format!("{}/repos/o/app/commits/sha{i}/comments", server.uri()),
                    "commit": { "comment_count": count }
                })
            })
            .collect();

        Mock::given(method("GET"))
            .and(path("/repos/o/app/commits"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("x-ratelimit-limit", "60")
                    .insert_header("x-ratelimit-remaining", "59")
                    .set_body_json(json!(commits)),
            )
            .mount(server)
            .await;
    }

    #[test]
    fn test_preview_urls_collapse_to_shortest() {
        let body = "[a](https://x.vercel.app) [b](https://y.vercel.app/) [c](https://long-name.vercel.app)";
        assert_eq!(collect_deploy_urls(body), vec!["https://x.vercel.app"]);
    }

    #[test]
    fn test_shorter_later_preview_wins() {
        let body = "[a](https://app-git-main.netlify.app) [b](https://app.netlify.app/)";
        assert_eq!(collect_deploy_urls(body), vec!["https://app.netlify.app"]);
    }

    #[test]
    fn test_other_links_kept_in_order_before_preview() {
        let body = "[p](https://p.vercel.app) [i](https://vercel.com/team/app/1/) [d](https://demo.example.org)";
        assert_eq!(
            collect_deploy_urls(body),
            vec![
                "https://vercel.com/team/app/1",
                "https://demo.example.org",
                "https://p.vercel.app",
            ]
        );
    }

    #[test]
    fn test_preview_host_match_is_on_host() {
        assert!(is_preview_host("https://a.vercel.app/path"));
        assert!(!is_preview_host("https://notvercel.app"));
        assert!(!is_preview_host("https://example.com/vercel.app"));
    }

    #[tokio::test]
    async fn test_urls_from_first_commented_commit() {
        let server = MockServer::start().await;
        mount_commits(&server, &[0, 2, 1]).await;
        Mock::given(method("GET"))
            .and(path("/repos/o/app/commits/sha1/comments"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "body": "[Visit Preview](https://app-abc.vercel.app/) [Site](https://app.example.com/)" },
                { "body": "[ignored](https://second.example.com)" }
            ])))
            .mount(&server)
            .await;

        let found = latest_commit_urls(&client(&server), "o/app").await.unwrap();
        assert_eq!(found.urls, vec!["https://app.example.com", "https://app-abc.vercel.app"]);
        assert_eq!(found.rate.limit, 60);
        assert_eq!(found.rate.remaining, 59);
    }

    #[tokio::test]
    async fn test_no_commented_commit_yields_nothing() {
        let server = MockServer::start().await;
        mount_commits(&server, &[0, 0]).await;

        let found = latest_commit_urls(&client(&server), "o/app").await.unwrap();
        assert!(found.urls.is_empty());
    }

    #[tokio::test]
    async fn test_empty_comment_list_is_soft_failure() {
        let server = MockServer::start().await;
        mount_commits(&server, &[1]).await;
        Mock::given(method("GET"))
            .and(path("/repos/o/app/commits/sha0/comments"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let found = latest_commit_urls(&client(&server), "o/app").await.unwrap();
        assert!(found.urls.is_empty());
    }

    #[tokio::test]
    async fn test_rate_limit_message_is_fatal_and_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/o/app/commits"))
            .respond_with(
                ResponseTemplate::new(403)
                    .insert_header("x-ratelimit-remaining", "0")
                    .set_body_json(json!({ "message": "API rate limit exceeded for 1.2.3.4." })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let err = latest_commit_urls(&client(&server), "o/app").await.unwrap_err();
        let DiscoveryError::RateLimited { repo, message } = err;
        assert_eq!(repo, "o/app");
        assert!(message.starts_with("API rate limit"));
    }

    #[tokio::test]
    async fn test_other_api_error_is_soft() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/o/app/commits"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({ "message": "Git Repository is empty." })))
            .mount(&server)
            .await;

        let found = latest_commit_urls(&client(&server), "o/app").await.unwrap();
        assert!(found.urls.is_empty());
        assert_eq!(found.message, "Git Repository is empty.");
    }

    async fn mount_soft_failure(server: &MockServer, reset_at_ms: u64) {
        Mock::given(method("GET"))
            .and(path("/repos/o/app/commits"))
            .respond_with(
                ResponseTemplate::new(403)
                    .insert_header("x-ratelimit-remaining", "0")
                    .insert_header("x-ratelimit-reset", reset_at_ms.to_string().as_str())
                    .set_body_json(json!({ "message": "Resource not accessible" })),
            )
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_reset_within_two_minutes_is_waited_out() {
        let server = MockServer::start().await;
        let started = Instant::now();
        // 13 digits: already epoch milliseconds
        mount_soft_failure(&server, now_ms() + 1_500).await;

        let found = latest_commit_urls(&client(&server), "o/app").await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(1_300), "{:?}", started.elapsed());
        assert!(found.urls.is_empty());
        assert_eq!(found.message, "Resource not accessible");
    }

    #[tokio::test]
    async fn test_distant_reset_returns_immediately() {
        let server = MockServer::start().await;
        mount_soft_failure(&server, now_ms() + 10 * 60 * 1_000).await;

        let started = Instant::now();
        let found = latest_commit_urls(&client(&server), "o/app").await.unwrap();
        assert!(started.elapsed() < Duration::from_secs(2), "{:?}", started.elapsed());
        assert!(found.urls.is_empty());
        assert!(found.rate.is_exhausted());
    }
}
