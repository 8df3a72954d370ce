//! Resolution of tracking links to their final target.
//!
//! Links are followed through the search's own [`Transport`], so the
//! redirect request carries the session's cookies, User-Agent and headers.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, warn};
use url::Url;

use crate::config::SearchConfig;
use crate::transport::Transport;
use crate::Result;

/// Trait for turning a (possibly indirect) result link into its final URL.
///
/// Resolution never fails: on any problem the input URL is returned.
#[async_trait]
pub trait RedirectResolver: Send + Sync {
    /// Resolves `url` over `transport`, or returns it unchanged.
    async fn resolve(&self, transport: &dyn Transport, url: &str) -> String;
}

/// Follows links that match one of the configured tracking patterns.
#[derive(Debug, Clone)]
pub struct TrackingLinkResolver {
    patterns: Vec<String>,
}

impl TrackingLinkResolver {
    /// Creates a resolver with the configured tracking patterns.
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            patterns: config.tracking_patterns.clone(),
        }
    }

    /// Returns true if `url` is an indirect link worth following.
    pub fn is_tracking_link(&self, url: &str) -> bool {
        self.patterns
            .iter()
            .any(|pattern| !pattern.is_empty() && url.contains(pattern.as_str()))
    }

    async fn follow(&self, transport: &dyn Transport, url: &str) -> Result<String> {
        let page = transport.follow(url).await?;

        // Some tracking endpoints answer 200 with a meta refresh or a script
        // redirect instead of a 3xx.
        if self.is_tracking_link(&page.url) {
            let body = String::from_utf8_lossy(&page.body);
            if let Some(target) = refresh_target(&body) {
                return Ok(target);
            }
        }

        Ok(page.url)
    }
}

#[async_trait]
impl RedirectResolver for TrackingLinkResolver {
    async fn resolve(&self, transport: &dyn Transport, url: &str) -> String {
        if !self.is_tracking_link(url) {
            return url.to_string();
        }

        match self.follow(transport, url).await {
            Ok(resolved) => {
                debug!("Resolved {} -> {}", url, resolved);
                resolved
            }
            Err(e) => {
                warn!("Failed to resolve {}: {}", url, e);
                url.to_string()
            }
        }
    }
}

fn refresh_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)(?:URL\s*=\s*'|location\.replace\(\s*")(https?://[^'"]+)"#)
            .expect("Failed to compile refresh pattern")
    })
}

/// Extracts the target of a `<meta http-equiv="refresh">` or
/// `window.location.replace(...)` page.
fn refresh_target(body: &str) -> Option<String> {
    refresh_pattern()
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Makes `href` absolute against `base`. Returns `None` for empty or
/// unparseable links and for non-HTTP schemes such as `javascript:`.
pub fn absolutize(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    let base = Url::parse(base).ok()?;
    let joined = base.join(href).ok()?;
    match joined.scheme() {
        "http" | "https" => Some(joined.to_string()),
        _ => None,
    }
}
