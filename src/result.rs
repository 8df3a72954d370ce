//! Search result types.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Unvalidated (title, abstract, href) triple pulled out of one result container.
///
/// Any field may be empty; the orchestrator drops candidates without a title.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidate {
    /// Title text as found in the markup.
    pub raw_title: String,
    /// Abstract text as found in the markup.
    pub raw_abstract: String,
    /// Link target as found in the markup, possibly relative or a tracking link.
    pub raw_href: String,
}

impl Candidate {
    /// Creates a new candidate.
    pub fn new(
        raw_title: impl Into<String>,
        raw_abstract: impl Into<String>,
        raw_href: impl Into<String>,
    ) -> Self {
        Self {
            raw_title: raw_title.into(),
            raw_abstract: raw_abstract.into(),
            raw_href: raw_href.into(),
        }
    }
}

/// A single normalized search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Result title, cleaned and never empty.
    pub title: String,
    /// Absolute target URL. `None` when redirect resolution is disabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Result abstract, cleaned and truncated.
    #[serde(rename = "abstract")]
    pub abstract_text: String,
}

impl SearchResult {
    /// Creates a new search result without a URL.
    pub fn new(title: impl Into<String>, abstract_text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: None,
            abstract_text: abstract_text.into(),
        }
    }

    /// Sets the resolved URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Returns a normalized URL for deduplication (without scheme and trailing slash).
    pub fn normalized_url(&self) -> Option<String> {
        self.url.as_deref().map(|url| {
            url.trim_start_matches("https://")
                .trim_start_matches("http://")
                .trim_end_matches('/')
                .to_lowercase()
        })
    }

    /// Returns the identity key of this result under the given policy.
    ///
    /// A URL policy falls back to the title when the result carries no URL.
    pub fn identity_key(&self, key: DedupKey) -> String {
        match key {
            DedupKey::Url | DedupKey::Auto => self
                .normalized_url()
                .map(|url| format!("url:{url}"))
                .unwrap_or_else(|| format!("title:{}", self.title)),
            DedupKey::Title => format!("title:{}", self.title),
        }
    }
}

/// Field used to detect duplicate results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DedupKey {
    /// URL when redirects are resolved, title otherwise.
    #[default]
    Auto,
    /// Normalized URL.
    Url,
    /// Cleaned title.
    Title,
}

impl DedupKey {
    /// Resolves `Auto` against whether URLs are being resolved.
    pub fn effective(self, resolve_redirects: bool) -> DedupKey {
        match self {
            DedupKey::Auto if resolve_redirects => DedupKey::Url,
            DedupKey::Auto => DedupKey::Title,
            other => other,
        }
    }
}

/// Call-scoped set of identity keys already emitted.
#[derive(Debug, Clone)]
pub struct DedupSet {
    key: DedupKey,
    seen: HashSet<String>,
}

impl DedupSet {
    /// Creates an empty set using the given (already effective) key.
    pub fn new(key: DedupKey) -> Self {
        Self {
            key,
            seen: HashSet::new(),
        }
    }

    /// Records the result; returns false if its identity key was already seen.
    pub fn insert(&mut self, result: &SearchResult) -> bool {
        self.seen.insert(result.identity_key(self.key))
    }

    /// Number of distinct keys recorded.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
