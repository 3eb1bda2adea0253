// src/github/forks.rs
// =============================================================================
// Lists a repository's forks, page by page.
//
// Forks of a self-hostable web app often deploy their own copy and put the
// URL in the repo "homepage" field; those homepages are mirror candidates.
//
// GET /repos/{repo}/forks?per_page=..&page=..&sort=newest
// =============================================================================

use serde::Deserialize;
use tracing::{debug, error, info};

use super::api::{GithubClient, RateLimitSnapshot};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Fork {
    pub full_name: String,
    #[serde(default)]
    pub homepage: Option<String>,
}

impl Fork {
    /// The fork's homepage, if it set a non-blank one.
    pub fn homepage_url(&self) -> Option<&str> {
        self.homepage.as_deref().map(str::trim).filter(|h| !h.is_empty())
    }
}

/// Pagination cursor for one `list_forks` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForkQuery {
    pub per_page: u32,
    pub page: u32,
    pub sort: String,
}

impl Default for ForkQuery {
    fn default() -> Self {
        ForkQuery {
            per_page: 10,
            page: 1,
            sort: "newest".to_string(),
        }
    }
}

impl ForkQuery {
    fn params(&self) -> [(&'static str, String); 3] {
        [
            ("per_page", self.per_page.to_string()),
            ("page", self.page.to_string()),
            ("sort", self.sort.clone()),
        ]
    }
}

/// Collects forks until `total_wanted` are gathered or a page comes back
/// empty. `total_wanted == 0` fetches just the first page.
///
/// API and transport errors end the walk early; whatever was gathered so far
/// is returned.
pub async fn list_forks(
    client: &GithubClient,
    repo: &str,
    total_wanted: usize,
    mut query: ForkQuery,
) -> Vec<Fork> {
    let url = client.repo_url(repo, "forks");
    let mut forks: Vec<Fork> = Vec::new();
    let mut rate = RateLimitSnapshot::default();

    loop {
        debug!(repo, page = query.page, per_page = query.per_page, "listing forks");

        let response = match client.get_list::<Fork>(&url, &query.params()).await {
            Ok(response) => response,
            Err(e) => {
                error!(repo, error = %e, "[fork] request failed");
                break;
            }
        };
        rate = response.rate;

        let page = match response.data {
            Ok(page) => page,
            Err(failure) => {
                error!(repo, message = %failure.message, "[fork] failed to list forks");
                break;
            }
        };

        if page.is_empty() {
            break;
        }
        for fork in &page {
            debug!(repo, fork = %fork.full_name, homepage = ?fork.homepage_url(), "fork");
        }
        forks.extend(page);

        if forks.len() >= total_wanted {
            break;
        }
        query.page += 1;
    }

    if total_wanted > 0 {
        forks.truncate(total_wanted);
        info!(
            repo,
            wanted = total_wanted,
            found = forks.len(),
            remaining = rate.remaining,
            "[fork] listed forks"
        );
    }

    forks
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fork_page(names: &[&str]) -> serde_json::Value {
        json!(names
            .iter()
            .map(|n| json!({ "full_name": n, "homepage": format!("https://{n}.example.com") }))
            .collect::<Vec<_>>())
    }

    async fn mount_page(server: &MockServer, page: &str, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/repos/o/app/forks"))
            .and(query_param("page", page))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    fn client(server: &MockServer) -> GithubClient {
        GithubClient::new(&server.uri(), None, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_paginates_until_enough() {
        let server = MockServer::start().await;
        mount_page(&server, "1", fork_page(&["a", "b"])).await;
        mount_page(&server, "2", fork_page(&["c", "d"])).await;
        mount_page(&server, "3", fork_page(&["e", "f"])).await;

        let query = ForkQuery {
            per_page: 2,
            ..Default::default()
        };
        let forks = list_forks(&client(&server), "o/app", 3, query).await;
        let names: Vec<_> = forks.iter().map(|f| f.full_name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_stops_on_empty_page() {
        let server = MockServer::start().await;
        mount_page(&server, "1", fork_page(&["a", "b"])).await;
        mount_page(&server, "2", json!([])).await;

        let forks = list_forks(&client(&server), "o/app", 10, ForkQuery::default()).await;
        assert_eq!(forks.len(), 2);
    }

    #[tokio::test]
    async fn test_zero_wanted_fetches_one_page() {
        let server = MockServer::start().await;
        mount_page(&server, "1", fork_page(&["a"])).await;
        Mock::given(method("GET"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(fork_page(&["z"])))
            .expect(0)
            .mount(&server)
            .await;

        let forks = list_forks(&client(&server), "o/app", 0, ForkQuery::default()).await;
        assert_eq!(forks.len(), 1);
    }

    #[tokio::test]
    async fn test_api_error_returns_partial_results() {
        let server = MockServer::start().await;
        mount_page(&server, "1", fork_page(&["a", "b"])).await;
        Mock::given(method("GET"))
            .and(path("/repos/o/app/forks"))
            .and(query_param("page", "2"))
            .respond_with(
                ResponseTemplate::new(403)
                    .set_body_json(json!({ "message": "API rate limit exceeded for 1.2.3.4." })),
            )
            .mount(&server)
            .await;

        let forks = list_forks(&client(&server), "o/app", 10, ForkQuery::default()).await;
        assert_eq!(forks.len(), 2);
        assert_eq!(forks[0].homepage_url(), Some("https://a.example.com"));
    }

    #[test]
    fn test_blank_homepage_is_ignored() {
        let fork = Fork {
            full_name: "x/app".into(),
            homepage: Some("  ".into()),
        };
        assert_eq!(fork.homepage_url(), None);
    }
}
