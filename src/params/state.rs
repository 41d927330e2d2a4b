//! Query parameter state: search text, filter, page size and cursor

use super::url::UrlQueryState;
use crate::connection::{ConnectionQuery, FetchArgs, FilterSet};

/// How the next fetch relates to the items already shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Discard accumulated items and start over
    Refresh,
    /// Keep accumulated items and fetch more
    Append,
}

/// The mutable request parameters owned by one engine.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParams {
    /// What the user typed, shown immediately
    search_input: String,
    /// What fetches use, committed after the debounce
    search_text: String,
    filter_id: Option<String>,
    page_size: usize,
    after_cursor: Option<String>,
    /// One-shot size for the very first fetch (restored from `visible`)
    visible_override: Option<usize>,
    default_first: usize,
}

impl QueryParams {
    pub fn new(default_first: usize, filters: &FilterSet) -> Self {
        Self {
            search_input: String::new(),
            search_text: String::new(),
            filter_id: filters.default_id().map(str::to_string),
            page_size: default_first,
            after_cursor: None,
            visible_override: None,
            default_first,
        }
    }

    /// Restore from the URL. Cursors are never restored; `visible` is.
    pub fn from_url(url: &UrlQueryState, default_first: usize, filters: &FilterSet) -> Self {
        let query = url.query.clone().unwrap_or_default();
        Self {
            search_input: query.clone(),
            search_text: query,
            filter_id: filters
                .resolve(url.filter.as_deref())
                .map(|f| f.id.clone()),
            page_size: url.first.unwrap_or(default_first),
            after_cursor: None,
            visible_override: url.visible.filter(|v| *v > 0),
            default_first,
        }
    }

    pub fn search_input(&self) -> &str {
        &self.search_input
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn filter_id(&self) -> Option<&str> {
        self.filter_id.as_deref()
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn after_cursor(&self) -> Option<&str> {
        self.after_cursor.as_deref()
    }

    pub fn set_search_input(&mut self, text: impl Into<String>) {
        self.search_input = text.into();
    }

    /// Make the typed text effective. Returns true if it changed.
    pub fn commit_search_text(&mut self) -> bool {
        if self.search_input == self.search_text {
            return false;
        }
        self.search_text = self.search_input.clone();
        true
    }

    /// Returns true if the filter changed.
    pub fn select_filter(&mut self, id: &str) -> bool {
        if self.filter_id.as_deref() == Some(id) {
            return false;
        }
        self.filter_id = Some(id.to_string());
        true
    }

    /// Advance to the next page.
    ///
    /// Cursor paging continues after `end_cursor`. Legacy paging doubles the
    /// previously requested size and re-fetches from the start.
    pub fn request_more(&mut self, cursor_paging: bool, end_cursor: Option<&str>, last_first: usize) {
        if cursor_paging {
            self.after_cursor = end_cursor.map(str::to_string);
        } else {
            self.page_size = last_first.max(1) * 2;
            self.after_cursor = None;
        }
    }

    /// Build the args for the next fetch.
    ///
    /// The `visible` override applies to the first query only; refreshes
    /// always start from the beginning.
    pub fn fetch_args(&self, kind: RequestKind, first_query: bool, filters: &FilterSet) -> FetchArgs {
        let first = match self.visible_override {
            Some(visible) if first_query => visible,
            _ => self.page_size,
        };
        let after = match kind {
            RequestKind::Refresh => None,
            RequestKind::Append => self.after_cursor.clone(),
        };
        FetchArgs {
            first,
            after,
            query: (!self.search_text.is_empty()).then(|| self.search_text.clone()),
            filter: filters.args_for(self.filter_id.as_deref()),
        }
    }

    /// Called once a refresh starts: the cursor no longer applies.
    pub fn reset_cursor(&mut self) {
        self.after_cursor = None;
    }

    /// The override is spent once the first page has been applied.
    pub fn clear_visible_override(&mut self) {
        self.visible_override = None;
    }

    pub fn query(&self) -> ConnectionQuery {
        ConnectionQuery {
            search_text: self.search_text.clone(),
            active_filter_id: self.filter_id.clone(),
            page_size: self.page_size,
            after_cursor: self.after_cursor.clone(),
        }
    }

    /// The URL form of these params, given how many items are shown.
    pub fn to_url(&self, visible: usize, filters: &FilterSet) -> UrlQueryState {
        UrlQueryState {
            query: (!self.search_text.is_empty()).then(|| self.search_text.clone()),
            first: (self.page_size != self.default_first).then_some(self.page_size),
            filter: self
                .filter_id
                .clone()
                .filter(|id| !filters.is_default(id)),
            visible: (visible != 0 && visible != self.page_size).then_some(visible),
        }
    }
}
