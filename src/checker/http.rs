// src/checker/http.rs
// =============================================================================
// This module checks if a site is alive by making one HTTP request.
//
// Key functionality:
// - HEAD request by default (lightweight, no body download)
// - GET + body predicate when the caller supplies a `verify` function
// - Redirects are NOT followed; a 30x pointing elsewhere counts as alive
// - Classifies the outcome into a numeric `code` plus an `errmsg`
// - Runs many checks concurrently with a bounded buffer
//
// Result codes:
//   0      alive (2xx, or a redirect to a different URL)
//   > 0    HTTP status outside 200..=299
//   -1     body rejected by the verify predicate
//   -2     transport failure (DNS, TLS, refused, timeout)
//
// Rust concepts:
// - async/await: For concurrent network I/O
// - Arc<dyn Fn>: A shareable, thread-safe callback
// - Streams: For processing many items concurrently
// =============================================================================

use futures::stream::{self, StreamExt}; // StreamExt gives us .buffer_unordered()
use reqwest::header::{HeaderMap, LOCATION};
use reqwest::{redirect, Client, Response};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::site::strip_trailing_slash;

/// Code for a body rejected by the verify predicate.
pub const CODE_VERIFY_FAILED: i32 = -1;
/// Code for a request that never produced an HTTP response.
pub const CODE_TRANSPORT: i32 = -2;

/// Longest error message we keep from a rejected response body.
const MAX_BODY_ERRMSG: usize = 200;

// A body predicate: returns true when the page content looks right.
// Arc lets the same predicate be shared across concurrent checks.
pub type VerifyFn = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Per-request knobs for a single check.
#[derive(Clone, Default)]
pub struct CheckOptions {
    /// Extra request headers (cookies, auth, a browser User-Agent...)
    pub headers: HeaderMap,
    /// When set, the body is downloaded and must satisfy this predicate
    pub verify: Option<VerifyFn>,
}

impl fmt::Debug for CheckOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckOptions")
            .field("headers", &self.headers)
            .field("verify", &self.verify.is_some())
            .finish()
    }
}

// What kind of outcome a check produced
//
// This is finer-grained than `code` and only used for logs and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkStatus {
    /// 2xx
    Ok,
    /// 30x pointing to a different URL
    Redirect { target: String },
    /// Any other non-2xx status
    HttpError { status: u16 },
    /// 2xx, but the verify predicate rejected the body
    VerifyFailed,
    /// Request timed out
    Timeout,
    /// SSL/TLS certificate error
    SslError,
    /// Could not resolve hostname
    DnsError,
    /// Other transport error
    Error,
}

/// The outcome of checking a single URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCheckResult {
    /// Redirect target (trailing slash stripped) or the requested URL
    pub url: String,
    /// 0 when alive, see the module header for the rest
    pub code: i32,
    /// Empty exactly when `code == 0`
    pub errmsg: String,
    pub redirected: bool,
    pub status: LinkStatus,
}

impl LinkCheckResult {
    pub fn is_ok(&self) -> bool {
        self.code == 0
    }

    fn alive(url: String, status: LinkStatus, redirected: bool) -> Self {
        LinkCheckResult {
            url,
            code: 0,
            errmsg: String::new(),
            redirected,
            status,
        }
    }
}

/// Reusable prober holding one connection pool.
#[derive(Debug, Clone)]
pub struct LinkChecker {
    client: Client,
}

impl LinkChecker {
    // Builds a client that never follows redirects: we want to see the 30x
    // and its Location header ourselves.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(redirect::Policy::none())
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(LinkChecker { client })
    }

    /// Probes one URL and classifies the result. Never fails: transport
    /// errors come back as a non-zero `code`.
    pub async fn check(&self, url: &str, options: &CheckOptions) -> LinkCheckResult {
        // HEAD when we only care about existence, GET when we must read the body
        let request = if options.verify.is_some() {
            self.client.get(url)
        } else {
            self.client.head(url)
        };

        match request.headers(options.headers.clone()).send().await {
            Ok(response) => analyze_response(url, response, options.verify.as_ref()).await,
            Err(e) => categorize_error(url, e),
        }
    }

    // Checks many URLs concurrently
    //
    // Returns (requested_url, result) pairs. Order follows completion, not
    // input, so callers match results back by URL.
    pub async fn check_many(
        &self,
        urls: Vec<String>,
        options: &CheckOptions,
        concurrency: usize,
    ) -> Vec<(String, LinkCheckResult)> {
        let futures = urls.into_iter().map(|url| async move {
            let result = self.check(&url, options).await;
            debug!(url = %url, code = result.code, status = ?result.status, errmsg = %result.errmsg, "checked");
            (url, result)
        });

        // .buffer_unordered(N) keeps at most N requests in flight
        stream::iter(futures)
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await
    }
}

// Classifies an HTTP response in priority order:
// 1. 30x to a different URL  -> alive, redirected
// 2. status outside 2xx      -> code = status
// 3. verify predicate fails  -> code = -1, errmsg = body
// 4. otherwise               -> alive
async fn analyze_response(url: &str, response: Response, verify: Option<&VerifyFn>) -> LinkCheckResult {
    let status = response.status();
    let code = status.as_u16();

    let effective_url = response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(|location| resolve_location(url, location))
        .map(|target| strip_trailing_slash(&target).to_string())
        .unwrap_or_else(|| url.to_string());

    if code / 10 == 30 && effective_url != url {
        return LinkCheckResult::alive(
            effective_url.clone(),
            LinkStatus::Redirect { target: effective_url },
            true,
        );
    }

    if !status.is_success() {
        let errmsg = status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP_{}", code));

        return LinkCheckResult {
            url: effective_url,
            code: i32::from(code),
            errmsg,
            redirected: false,
            status: LinkStatus::HttpError { status: code },
        };
    }

    let Some(verify) = verify else {
        // HEAD: dropping the response releases the connection right away
        drop(response);
        return LinkCheckResult::alive(effective_url, LinkStatus::Ok, false);
    };

    match response.text().await {
        Ok(body) if verify(&body) => LinkCheckResult::alive(effective_url, LinkStatus::Ok, false),
        Ok(body) => {
            let errmsg = if body.trim().is_empty() {
                "VERIFY_FAILED".to_string()
            } else {
                body.chars().take(MAX_BODY_ERRMSG).collect()
            };

            LinkCheckResult {
                url: effective_url,
                code: CODE_VERIFY_FAILED,
                errmsg,
                redirected: false,
                status: LinkStatus::VerifyFailed,
            }
        }
        Err(e) => categorize_error(url, e),
    }
}

// Location may be relative ("/login"); resolve it against the request URL
fn resolve_location(url: &str, location: &str) -> String {
    Url::parse(url)
        .and_then(|base| base.join(location))
        .map(String::from)
        .unwrap_or_else(|_| location.to_string())
}

// Categorizes transport errors from reqwest
//
// The errmsg is the full error chain text, so the README shows what actually
// went wrong ("dns error: failed to lookup address ...").
fn categorize_error(url: &str, error: reqwest::Error) -> LinkCheckResult {
    let errmsg = error_chain(&error);
    let lower = errmsg.to_lowercase();

    let status = if error.is_timeout() {
        LinkStatus::Timeout
    } else if lower.contains("dns") || lower.contains("lookup") {
        LinkStatus::DnsError
    } else if lower.contains("certificate") || lower.contains("tls") || lower.contains("ssl") {
        LinkStatus::SslError
    } else {
        LinkStatus::Error
    };

    LinkCheckResult {
        url: url.to_string(),
        code: CODE_TRANSPORT,
        errmsg,
        redirected: false,
        status,
    }
}

fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }

    if message.is_empty() {
        "NETWORK_ERROR".to_string()
    } else {
        message
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why not let reqwest follow redirects?
//    - A followed redirect hides the 30x status and the Location header
//    - We want to know "this site moved" without treating it as broken
//
// 2. What is `let ... else`?
//    - Binds a pattern or runs the else block, which must return/break
//    - Keeps the happy path unindented
//
// 3. Why `async move` inside check_many?
//    - Each future owns its URL string
//    - `self` and `options` are borrowed; the futures all finish before
//      check_many returns, so the borrows stay valid
// -----------------------------------------------------------------------------
