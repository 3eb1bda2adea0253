// src/github/api.rs
// =============================================================================
// A thin client for the GitHub REST API.
//
// Every list endpoint we call answers in one of two shapes:
//   - a JSON array of items (success)
//   - a JSON object with a "message" (error: rate limit, not found, ...)
// Both shapes carry the same x-ratelimit-* headers. We model that as
// ApiResponse { data: Result<Vec<T>, ApiFailure>, rate: RateLimitSnapshot }
// instead of one loosely-typed payload.
//
// Rust concepts:
// - Generics + DeserializeOwned: one request helper for every item type
// - #[serde(untagged)]: try each enum variant until one fits the JSON
// =============================================================================

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Reset windows shorter than this are waited out instead of treated as fatal.
pub const SHORT_RESET_WINDOW: Duration = Duration::from_secs(120);

/// Quota state reported by one API response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimitSnapshot {
    pub limit: u64,
    pub remaining: u64,
    /// Quota reset time in epoch milliseconds (0 when unknown)
    pub reset_at_ms: u64,
}

impl RateLimitSnapshot {
    // Missing headers read as limit 0, remaining 1, reset unknown: i.e.
    // "nothing suggests we are throttled"
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let number = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
        };

        RateLimitSnapshot {
            limit: number("x-ratelimit-limit").unwrap_or(0),
            remaining: number("x-ratelimit-remaining").unwrap_or(1),
            reset_at_ms: number("x-ratelimit-reset").map(epoch_to_ms).unwrap_or(0),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// How long until the quota resets, if that is in the future and under
    /// SHORT_RESET_WINDOW.
    pub fn short_wait(&self, now_ms: u64) -> Option<Duration> {
        let wait = Duration::from_millis(self.reset_at_ms.checked_sub(now_ms)?);
        (!wait.is_zero() && wait < SHORT_RESET_WINDOW).then_some(wait)
    }
}

// The reset header is documented as epoch seconds, but proxies and mocks
// sometimes send milliseconds. 10 digits = seconds, anything else is taken
// as milliseconds already.
pub fn epoch_to_ms(raw: u64) -> u64 {
    if raw.to_string().len() == 10 {
        raw * 1000
    } else {
        raw
    }
}

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// The error payload GitHub sends instead of a list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ApiFailure {
    #[serde(default)]
    pub message: String,
}

impl ApiFailure {
    /// GitHub's wording when the quota is exhausted.
    pub fn is_rate_limit(&self) -> bool {
        self.message.starts_with("API rate limit")
    }
}

#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    pub data: Result<Vec<T>, ApiFailure>,
    pub rate: RateLimitSnapshot,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Payload<T> {
    List(Vec<T>),
    Failure(ApiFailure),
    Other(serde_json::Value),
}

#[derive(Debug, Clone)]
pub struct GithubClient {
    client: Client,
    api_base: String,
}

impl GithubClient {
    // GitHub rejects requests without a User-Agent; the token is optional
    // but raises the quota from 60 to 5000 requests per hour.
    pub fn new(api_base: &str, token: Option<&str>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            if let Ok(mut value) = HeaderValue::from_str(&format!("Bearer {}", token)) {
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
        }

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(GithubClient {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    /// `{api_base}/repos/{repo}/{tail}`
    pub fn repo_url(&self, repo: &str, tail: &str) -> String {
        format!("{}/repos/{}/{}", self.api_base, repo, tail)
    }

    /// GETs a list endpoint. Only transport failures are `Err`; API errors
    /// come back inside `ApiResponse::data`.
    pub async fn get_list<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<ApiResponse<T>, reqwest::Error> {
        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();
        let rate = RateLimitSnapshot::from_headers(response.headers());
        let body = response.bytes().await?;

        let data = match serde_json::from_slice::<Payload<T>>(&body) {
            Ok(Payload::List(items)) => Ok(items),
            Ok(Payload::Failure(failure)) => Err(failure),
            Ok(Payload::Other(value)) => Err(ApiFailure {
                message: format!("unexpected payload (HTTP {}): {}", status.as_u16(), value),
            }),
            Err(e) => Err(ApiFailure {
                message: format!("invalid JSON (HTTP {}): {}", status.as_u16(), e),
            }),
        };

        Ok(ApiResponse { data, rate })
    }
}
