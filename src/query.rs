//! Search query representation and result-page URL building.

use serde::{Deserialize, Serialize};

use crate::config::SearchConfig;
use crate::{Result, SearchError};

/// A search request: terms plus how many results the caller wants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// The search terms.
    pub text: String,
    /// Number of results wanted.
    pub desired_count: usize,
}

impl SearchQuery {
    /// Creates a new query for ten results.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            desired_count: 10,
        }
    }

    /// Sets the number of results wanted.
    pub fn with_count(mut self, desired_count: usize) -> Self {
        self.desired_count = desired_count;
        self
    }

    /// Checks that the query can be run.
    pub fn validate(&self) -> Result<()> {
        if self.text.trim().is_empty() {
            return Err(SearchError::InvalidQuery("Query cannot be empty".into()));
        }
        if self.desired_count == 0 {
            return Err(SearchError::InvalidQuery(
                "desired_count must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Number of result pages needed to cover `desired_count`.
    pub fn pages_needed(&self, page_size: usize) -> usize {
        if page_size == 0 {
            return 0;
        }
        self.desired_count.div_ceil(page_size)
    }

    /// The request for zero-based page `index`.
    pub fn page(&self, index: usize, page_size: usize) -> PageRequest {
        PageRequest::new(index * page_size, page_size)
    }
}

/// One result page to fetch. The offset is always a multiple of the page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    offset: usize,
    page_size: usize,
}

impl PageRequest {
    /// Creates a page request.
    pub fn new(offset: usize, page_size: usize) -> Self {
        Self { offset, page_size }
    }

    /// Index of the first result on this page.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Results per page.
    pub fn page_size(&self) -> usize {
        self.page_size
    }
}

/// Builds the result page URL for `query` and `page`.
///
/// The query text is percent-encoded as UTF-8, the same charset the result
/// page is decoded with. Parameters are always emitted in the order
/// query, offset, page size.
pub fn build_url(config: &SearchConfig, query: &str, page: &PageRequest) -> String {
    let separator = if config.base_url.contains('?') { '&' } else { '?' };
    format!(
        "{}{}{}={}&{}={}&{}={}",
        config.base_url,
        separator,
        config.query_param,
        urlencoding::encode(query),
        config.offset_param,
        page.offset(),
        config.page_size_param,
        page.page_size(),
    )
}
