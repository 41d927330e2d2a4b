//! Published engine state

use crate::connection::{ConnectionQuery, TotalCount};
use serde::Serialize;

/// A snapshot of one connection list, published to subscribers on every change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionState<N> {
    /// Accumulated items (kept even while `cleared`)
    pub items: Vec<N>,
    /// A slow refresh is in progress; show a loading indicator, not the items
    pub cleared: bool,
    pub loading: bool,
    /// Typed search text not yet committed by the debounce
    pub search_pending: bool,
    /// What the user typed
    pub search_input: String,
    /// The query the current items answer (or are being fetched for)
    pub query: ConnectionQuery,
    /// Last fetch failure, cleared by the next success
    pub error: Option<String>,
    /// Advisory error reported by the source alongside the items
    pub page_error: Option<String>,
    pub total: TotalCount,
    /// Total for display; see [`derive_total_count`](super::derive_total_count)
    pub total_count: Option<usize>,
    pub has_next_page: bool,
    /// `first` of the most recently issued request
    pub requested_first: usize,
    /// Whether any page has been applied
    pub loaded: bool,
}

impl<N> ConnectionState<N> {
    /// Items to render, or `None` before the first page or while cleared.
    pub fn visible_items(&self) -> Option<&[N]> {
        (self.loaded && !self.cleared).then_some(self.items.as_slice())
    }

    /// No fetch in flight and no search text waiting on the debounce.
    pub fn is_settled(&self) -> bool {
        !self.loading && !self.search_pending
    }

    /// Empty result, as opposed to an indeterminate one.
    pub fn is_empty_result(&self) -> bool {
        self.total_count == Some(0)
    }

    /// Fetch error first, then the advisory page error.
    pub fn errors(&self) -> Vec<&str> {
        self.error
            .as_deref()
            .into_iter()
            .chain(self.page_error.as_deref())
            .collect()
    }
}

impl<N> Default for ConnectionState<N> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            cleared: false,
            loading: false,
            search_pending: false,
            search_input: String::new(),
            query: ConnectionQuery::default(),
            error: None,
            page_error: None,
            total: TotalCount::Unsupported,
            total_count: None,
            has_next_page: false,
            requested_first: 0,
            loaded: false,
        }
    }
}
