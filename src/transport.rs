//! HTTP session used for one search: browser-like headers, a cookie jar
//! warmed up by a home page visit, and bounded retry with linear backoff.
//!
//! Certificate validation is disabled on purpose. The default target is
//! plain HTTP, and when it is switched to HTTPS a certificate problem must
//! not abort the fetch. This is a scraping compromise, not a recommendation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use reqwest::cookie::Jar;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, CACHE_CONTROL, CONNECTION,
    REFERER,
};
use reqwest::{redirect, Client};
use tracing::{debug, warn};

use crate::config::SearchConfig;
use crate::retry::RetryPolicy;
use crate::{Result, SearchError};

/// Desktop browser User-Agent strings. One is picked per session.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36 Edg/131.0.0.0",
];

/// Select a random User-Agent string from the pool.
pub fn random_user_agent() -> &'static str {
    let mut rng = rand::thread_rng();
    USER_AGENTS.choose(&mut rng).copied().unwrap_or(USER_AGENTS[0])
}

fn browser_headers(referer: &str) -> Result<HeaderMap> {
    let referer = HeaderValue::from_str(referer)
        .map_err(|e| SearchError::Config(format!("Invalid referer '{}': {}", referer, e)))?;

    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("zh-CN,zh;q=0.9,en;q=0.8"),
    );
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
    headers.insert(REFERER, referer);
    headers.insert("upgrade-insecure-requests", HeaderValue::from_static("1"));
    Ok(headers)
}

/// A fetched response: status, final URL, lowercase header map and the raw body.
///
/// The body is exactly what came over the wire; decompression is left to
/// [`decoder::decode`](crate::decoder::decode).
#[derive(Debug, Clone, Default)]
pub struct FetchedPage {
    /// HTTP status code.
    pub status: u16,
    /// URL of the last response after redirects.
    pub url: String,
    /// Response headers, names lowercased.
    pub headers: HashMap<String, String>,
    /// Raw body bytes.
    pub body: Vec<u8>,
}

impl FetchedPage {
    /// Returns true for a 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns a header value by (case-insensitive) name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Returns the `Content-Encoding` header, if any.
    pub fn content_encoding(&self) -> Option<&str> {
        self.header("content-encoding")
    }
}

/// Trait for the HTTP session behind a search.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Warms the session up (cookies). Callers treat failure as non-fatal.
    async fn bootstrap(&self) -> Result<()>;

    /// Fetches a URL, retrying per the session's policy.
    async fn fetch(&self, url: &str) -> Result<FetchedPage>;

    /// Requests a URL once, following redirects, under the shorter link
    /// timeout. Any status is returned; only transport failures are errors.
    async fn follow(&self, url: &str) -> Result<FetchedPage>;
}

/// Opens a fresh [`Transport`] for each search call.
pub trait Connector: Send + Sync {
    /// Creates a new session for the given configuration.
    fn connect(&self, config: &SearchConfig) -> Result<Arc<dyn Transport>>;
}

/// Connector producing [`HttpTransport`] sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpConnector;

impl Connector for HttpConnector {
    fn connect(&self, config: &SearchConfig) -> Result<Arc<dyn Transport>> {
        Ok(Arc::new(HttpTransport::new(config)?))
    }
}

/// reqwest-backed session with cookie persistence and retry.
pub struct HttpTransport {
    client: Client,
    user_agent: String,
    home_url: String,
    retry: RetryPolicy,
    follow_timeout: Duration,
}

impl HttpTransport {
    /// Creates a session. The User-Agent is fixed for the session's lifetime.
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let user_agent = match config.user_agent {
            Some(ref custom) => custom.clone(),
            None => random_user_agent().to_string(),
        };

        let client = Client::builder()
            .cookie_provider(Arc::new(Jar::default()))
            .user_agent(user_agent.clone())
            .default_headers(browser_headers(&config.home_url)?)
            .redirect(redirect::Policy::limited(10))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .danger_accept_invalid_certs(true)
            .build()?;

        Ok(Self {
            client,
            user_agent,
            home_url: config.home_url.clone(),
            retry: config.retry,
            follow_timeout: Duration::from_secs(config.resolve_timeout_secs),
        })
    }

    /// The User-Agent this session sends.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    async fn get(
        &self,
        url: &str,
        timeout: Option<Duration>,
    ) -> std::result::Result<FetchedPage, String> {
        let mut request = self.client.get(url);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await.map_err(|e| e.to_string())?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await.map_err(|e| e.to_string())?;

        Ok(FetchedPage {
            status,
            url: final_url,
            headers,
            body: body.to_vec(),
        })
    }

    async fn fetch_once(&self, url: &str) -> std::result::Result<FetchedPage, String> {
        let page = self.get(url, None).await?;
        if !page.is_success() {
            return Err(format!("HTTP status {}", page.status));
        }
        Ok(page)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn bootstrap(&self) -> Result<()> {
        match self.fetch_once(&self.home_url).await {
            Ok(page) => {
                debug!("Bootstrap fetched {} bytes from {}", page.body.len(), self.home_url);
                Ok(())
            }
            Err(cause) => Err(SearchError::Network {
                url: self.home_url.clone(),
                attempts: 1,
                cause,
            }),
        }
    }

    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.fetch_once(url).await {
                Ok(page) => return Ok(page),
                Err(cause) if self.retry.should_retry(attempts) => {
                    let wait = self.retry.backoff(attempts - 1);
                    warn!(
                        "Fetch attempt {}/{} for {} failed: {}; retrying in {:?}",
                        attempts,
                        self.retry.max_attempts(),
                        url,
                        cause,
                        wait
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(cause) => {
                    return Err(SearchError::Network {
                        url: url.to_string(),
                        attempts,
                        cause,
                    })
                }
            }
        }
    }

    async fn follow(&self, url: &str) -> Result<FetchedPage> {
        self.get(url, Some(self.follow_timeout))
            .await
            .map_err(|cause| SearchError::Network {
                url: url.to_string(),
                attempts: 1,
                cause,
            })
    }
}
