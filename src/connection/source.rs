//! Connection sources — the caller-supplied fetch function
//!
//! The engine never talks to a network itself. It hands [`FetchArgs`] to a
//! [`ConnectionSource`] and applies whatever [`Page`] comes back.
//! Two implementations ship with the crate:
//! - any type implementing the trait (GraphQL clients, databases)
//! - `StaticSource`: an in-memory list with search and cursor support

use super::filter::FilterArgs;
use super::page::{Page, TotalCount};
use super::query::FetchArgs;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Errors from a single fetch call.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("invalid response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("source unavailable: {0}")]
    Unavailable(String),

    #[error("invalid cursor: {0}")]
    InvalidCursor(String),
}

/// The fetch contract.
///
/// Each call resolves exactly once, with a page or an error. Implementations
/// must not retry internally; the engine surfaces the error and waits for the
/// user to act again.
#[async_trait]
pub trait ConnectionSource<N>: Send + Sync {
    async fn fetch(&self, args: FetchArgs) -> Result<Page<N>, FetchError>;
}

/// Decides whether an item matches a search text and filter args.
pub type Matcher<N> = Arc<dyn Fn(&N, &str, &FilterArgs) -> bool + Send + Sync>;

/// An in-memory source over a fixed list of items.
///
/// Cursors are decimal offsets into the matching items. Whether the total
/// count and page info are reported is configurable so callers can exercise
/// each branch of total-count derivation.
pub struct StaticSource<N> {
    items: Vec<N>,
    matcher: Matcher<N>,
    report_total: bool,
    report_page_info: bool,
}

impl<N: Clone + Send + Sync> StaticSource<N> {
    /// A source whose matcher accepts every item.
    pub fn new(items: Vec<N>) -> Self {
        Self {
            items,
            matcher: Arc::new(|_, _, _| true),
            report_total: true,
            report_page_info: true,
        }
    }

    pub fn with_matcher(
        mut self,
        matcher: impl Fn(&N, &str, &FilterArgs) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.matcher = Arc::new(matcher);
        self
    }

    /// Report `totalCount` as unsupported (absent) instead of known.
    pub fn without_total(mut self) -> Self {
        self.report_total = false;
        self
    }

    /// Omit `pageInfo`, leaving next-page detection to the total count.
    pub fn without_page_info(mut self) -> Self {
        self.report_page_info = false;
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn page(&self, args: &FetchArgs) -> Result<Page<N>, FetchError> {
        let matching: Vec<&N> = self
            .items
            .iter()
            .filter(|item| (self.matcher)(*item, args.query_text(), &args.filter))
            .collect();

        let start = match &args.after {
            Some(cursor) => cursor
                .parse::<usize>()
                .map_err(|_| FetchError::InvalidCursor(cursor.clone()))?,
            None => 0,
        };
        let start = start.min(matching.len());
        let end = start.saturating_add(args.first).min(matching.len());

        let mut page = Page::new(matching[start..end].iter().map(|n| (*n).clone()).collect());
        if self.report_total {
            page = page.with_total(TotalCount::Known(matching.len()));
        }
        if self.report_page_info {
            page = page.with_page_info(end < matching.len(), Some(end.to_string()));
        }
        Ok(page)
    }
}

#[async_trait]
impl<N: Clone + Send + Sync> ConnectionSource<N> for StaticSource<N> {
    async fn fetch(&self, args: FetchArgs) -> Result<Page<N>, FetchError> {
        self.page(&args)
    }
}
