//! Search orchestration: pagination, extraction, resolution and dedup.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

use crate::decoder;
use crate::extract::ExtractionEngine;
use crate::query::build_url;
use crate::resolver::{absolutize, RedirectResolver, TrackingLinkResolver};
use crate::result::{Candidate, DedupSet};
use crate::text;
use crate::transport::{Connector, HttpConnector, Transport};
use crate::{Result, SearchConfig, SearchQuery, SearchResult};

/// Emits per-decision events when the caller asked for debug output.
#[derive(Debug, Clone, Copy)]
struct Tracer {
    enabled: bool,
}

impl Tracer {
    fn note(&self, args: std::fmt::Arguments<'_>) {
        if self.enabled {
            debug!(target: "a3s_serp::trace", "{}", args);
        }
    }
}

/// Paginated search against one result-page endpoint.
///
/// Each call to [`Search::search`] opens its own session (cookies and
/// User-Agent) and its own dedup set; nothing carries over between calls.
pub struct Search {
    config: SearchConfig,
    extractor: ExtractionEngine,
    connector: Arc<dyn Connector>,
    resolver: Arc<dyn RedirectResolver>,
}

impl Search {
    /// Creates a search with the given configuration.
    pub fn new(config: SearchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            extractor: ExtractionEngine::new()?,
            connector: Arc::new(HttpConnector),
            resolver: Arc::new(TrackingLinkResolver::new(&config)),
            config,
        })
    }

    /// Replaces the connector that opens a session per call.
    pub fn with_connector<C: Connector + 'static>(mut self, connector: C) -> Self {
        self.connector = Arc::new(connector);
        self
    }

    /// Replaces the redirect resolver.
    pub fn with_resolver<R: RedirectResolver + 'static>(mut self, resolver: R) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Searches for `query` and returns at most `desired_count` results.
    ///
    /// Fails only if the query is invalid or the first page cannot be
    /// fetched. A failure on a later page ends pagination and the results
    /// gathered so far are returned.
    pub async fn search(
        &self,
        query: &str,
        desired_count: usize,
        debug: bool,
    ) -> Result<Vec<SearchResult>> {
        self.run(&SearchQuery::new(query).with_count(desired_count), debug)
            .await
    }

    /// Runs a prepared query.
    pub async fn run(&self, query: &SearchQuery, debug: bool) -> Result<Vec<SearchResult>> {
        query.validate()?;
        let tracer = Tracer { enabled: debug };

        let transport = self.connector.connect(&self.config)?;
        if let Err(e) = transport.bootstrap().await {
            warn!("Session bootstrap failed, continuing without cookies: {}", e);
        }

        let pages = query.pages_needed(self.config.page_size);
        let mut seen = DedupSet::new(self.config.effective_dedup_key());
        let mut results: Vec<SearchResult> = Vec::with_capacity(query.desired_count);

        for index in 0..pages {
            if results.len() >= query.desired_count {
                break;
            }
            if index > 0 {
                self.page_delay().await;
            }

            let page = query.page(index, self.config.page_size);
            let url = build_url(&self.config, &query.text, &page);
            tracer.note(format_args!("Fetching page {} ({})", index, url));

            let candidates = match self.fetch_candidates(transport.as_ref(), &url).await {
                Ok(candidates) => candidates,
                Err(e) if index == 0 => return Err(e),
                Err(e) => {
                    warn!(
                        "Page {} failed, returning {} results gathered so far: {}",
                        index,
                        results.len(),
                        e
                    );
                    break;
                }
            };
            tracer.note(format_args!("Page {} yielded {} candidates", index, candidates.len()));

            if candidates.is_empty() {
                debug!("Page {} has no results, stopping", index);
                break;
            }

            // One candidate at a time: no link is followed once the quota is met.
            for candidate in candidates {
                if results.len() >= query.desired_count {
                    break;
                }
                let normalized = self.normalize(transport.as_ref(), candidate, tracer).await;
                let Some(result) = normalized else {
                    continue;
                };
                if seen.insert(&result) {
                    results.push(result);
                } else {
                    tracer.note(format_args!("Skipping duplicate '{}'", result.title));
                }
            }
        }

        results.truncate(query.desired_count);
        debug!("Search for '{}' returned {} results", query.text, results.len());
        Ok(results)
    }

    async fn fetch_candidates(&self, transport: &dyn Transport, url: &str) -> Result<Vec<Candidate>> {
        let page = transport.fetch(url).await?;
        let html = decoder::decode(&page.body, page.content_encoding());
        Ok(self.extractor.extract_candidates(&html))
    }

    /// Cleans a candidate's text and resolves its link over the session.
    async fn normalize(
        &self,
        transport: &dyn Transport,
        candidate: Candidate,
        tracer: Tracer,
    ) -> Option<SearchResult> {
        let title = text::clean(&candidate.raw_title);
        if title.is_empty() {
            return None;
        }
        let abstract_text =
            text::normalize_abstract(&candidate.raw_abstract, &title, self.config.abstract_max);
        let mut result = SearchResult::new(title, abstract_text);

        if self.config.resolve_redirects {
            match absolutize(&self.config.base_url, &candidate.raw_href) {
                Some(href) => {
                    let resolved = self.resolver.resolve(transport, &href).await;
                    tracer.note(format_args!("Link {} -> {}", href, resolved));
                    result.url = Some(resolved);
                }
                None => tracer.note(format_args!(
                    "No usable link for '{}' ({:?})",
                    result.title, candidate.raw_href
                )),
            }
        }

        Some(result)
    }

    async fn page_delay(&self) {
        let (min, max) = self.config.page_delay_ms;
        if max == 0 {
            return;
        }
        let ms = rand::thread_rng().gen_range(min..=max);
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

/// Searches the default endpoint with the default configuration.
pub async fn search(query: &str, desired_count: usize, debug: bool) -> Result<Vec<SearchResult>> {
    Search::new(SearchConfig::default())?
        .search(query, desired_count, debug)
        .await
}
