//! # a3s-serp
//!
//! Fetches paginated search result pages and turns them into a deduplicated,
//! length-bounded list of results.
//!
//! The pipeline for every page is:
//!
//! - fetch over a per-call HTTP session (cookies, fixed User-Agent, retry)
//! - decompress and decode the body as UTF-8
//! - locate result containers and pull title, abstract and link through
//!   ordered fallback rules
//! - resolve tracking links to their final URL
//! - clean and truncate text, drop duplicates, stop at the requested count
//!
//! ## Example
//!
//! ```rust,no_run
//! use a3s_serp::{Search, SearchConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let search = Search::new(SearchConfig::default())?;
//!     let results = search.search("rust programming", 15, false).await?;
//!
//!     for result in &results {
//!         println!("{}: {}", result.title, result.url.as_deref().unwrap_or("-"));
//!     }
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod query;
mod result;
mod retry;
mod search;

pub mod decoder;
pub mod extract;
pub mod resolver;
pub mod text;
pub mod transport;

pub use config::SearchConfig;
pub use error::{Result, SearchError};
pub use query::{build_url, PageRequest, SearchQuery};
pub use result::{Candidate, DedupKey, DedupSet, SearchResult};
pub use retry::RetryPolicy;
pub use search::{search, Search};
