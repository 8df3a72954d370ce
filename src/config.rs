//! Search configuration with defaults tuned for polite scraping.

use serde::{Deserialize, Serialize};

use crate::result::DedupKey;
use crate::retry::RetryPolicy;
use crate::{Result, SearchError};

/// Configuration for a paginated search.
///
/// All fields have serde defaults, so a partial JSON document is enough to
/// override individual knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Result page endpoint.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Home page requested once per search to pick up session cookies.
    #[serde(default = "default_home_url")]
    pub home_url: String,
    /// Query string parameter carrying the search terms.
    #[serde(default = "default_query_param")]
    pub query_param: String,
    /// Query string parameter carrying the result offset.
    #[serde(default = "default_offset_param")]
    pub offset_param: String,
    /// Query string parameter carrying the page size.
    #[serde(default = "default_page_size_param")]
    pub page_size_param: String,
    /// Results per page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Maximum abstract length in characters, before the ellipsis.
    #[serde(default = "default_abstract_max")]
    pub abstract_max: usize,
    /// Retry policy applied to every page fetch.
    #[serde(default)]
    pub retry: RetryPolicy,
    /// Uniform random delay range in milliseconds `(min, max)` between page fetches.
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: (u64, u64),
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Timeout in seconds for following one tracking link.
    #[serde(default = "default_resolve_timeout")]
    pub resolve_timeout_secs: u64,
    /// Whether tracking links are followed to their final URL.
    #[serde(default = "default_resolve_redirects")]
    pub resolve_redirects: bool,
    /// Substrings identifying indirect/tracking links.
    #[serde(default = "default_tracking_patterns")]
    pub tracking_patterns: Vec<String>,
    /// Identity key used for deduplication.
    #[serde(default)]
    pub dedup_key: DedupKey,
    /// Custom User-Agent. If `None`, one is picked from a built-in pool per session.
    #[serde(default)]
    pub user_agent: Option<String>,
}

/// Fixed query prefix sent with every result page request. `ie` declares
/// the charset the query terms are percent-encoded in.
const RESULT_PAGE_QUERY: &str = "ie=utf-8&tn=baidu";

fn default_base_url() -> String {
    format!("http://www.baidu.com/s?{RESULT_PAGE_QUERY}")
}

fn default_home_url() -> String {
    "http://www.baidu.com/".to_string()
}

fn default_query_param() -> String {
    "wd".to_string()
}

fn default_offset_param() -> String {
    "pn".to_string()
}

fn default_page_size_param() -> String {
    "rn".to_string()
}

fn default_page_size() -> usize {
    10
}

fn default_abstract_max() -> usize {
    200
}

fn default_page_delay_ms() -> (u64, u64) {
    (500, 1000)
}

fn default_request_timeout() -> u64 {
    10
}

fn default_resolve_timeout() -> u64 {
    5
}

fn default_resolve_redirects() -> bool {
    true
}

fn default_tracking_patterns() -> Vec<String> {
    vec!["baidu.com/link?url=".to_string(), "/link?url=".to_string()]
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            home_url: default_home_url(),
            query_param: default_query_param(),
            offset_param: default_offset_param(),
            page_size_param: default_page_size_param(),
            page_size: default_page_size(),
            abstract_max: default_abstract_max(),
            retry: RetryPolicy::default(),
            page_delay_ms: default_page_delay_ms(),
            request_timeout_secs: default_request_timeout(),
            resolve_timeout_secs: default_resolve_timeout(),
            resolve_redirects: default_resolve_redirects(),
            tracking_patterns: default_tracking_patterns(),
            dedup_key: DedupKey::Auto,
            user_agent: None,
        }
    }
}

impl SearchConfig {
    /// Points both the result endpoint and the home page at another host,
    /// keeping the default paths and query prefix.
    pub fn for_host(origin: &str) -> Self {
        let origin = origin.trim_end_matches('/');
        Self {
            base_url: format!("{origin}/s?{RESULT_PAGE_QUERY}"),
            home_url: format!("{origin}/"),
            ..Default::default()
        }
    }

    /// Disables the inter-page delay and retry backoff.
    pub fn without_delays(mut self) -> Self {
        self.page_delay_ms = (0, 0);
        self.retry.base_ms = 0;
        self.retry.step_ms = 0;
        self
    }

    /// Returns the dedup key with `Auto` resolved.
    pub fn effective_dedup_key(&self) -> DedupKey {
        self.dedup_key.effective(self.resolve_redirects)
    }

    /// Validates this configuration.
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(SearchError::Config("page_size must be greater than 0".into()));
        }
        if self.abstract_max == 0 {
            return Err(SearchError::Config(
                "abstract_max must be greater than 0".into(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(SearchError::Config(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }
        if self.resolve_timeout_secs == 0 {
            return Err(SearchError::Config(
                "resolve_timeout_secs must be greater than 0".into(),
            ));
        }
        if self.page_delay_ms.0 > self.page_delay_ms.1 {
            return Err(SearchError::Config(
                "page_delay_ms min must be <= max".into(),
            ));
        }
        url::Url::parse(&self.base_url)?;
        url::Url::parse(&self.home_url)?;
        Ok(())
    }
}
