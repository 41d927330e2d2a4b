//! Result accumulator — merges pages into the visible list
//!
//! Replace on refresh, concatenate on cursor append, replace again on legacy
//! append (the re-fetch already covers the whole list).

use crate::connection::{Page, PageInfo, TotalCount};

/// How a page combines with what is already shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    Replace,
    Append,
}

/// Derive a total for summary display.
///
/// A reported count wins. Otherwise, a page shorter than requested, or
/// exactly as long with `has_next_page` explicitly false, is complete and
/// its length is the total. Anything else is indeterminate.
pub fn derive_total_count(
    reported: TotalCount,
    returned: usize,
    first: usize,
    has_next_page: Option<bool>,
) -> Option<usize> {
    if let TotalCount::Known(n) = reported {
        return Some(n);
    }
    if returned < first || (returned == first && has_next_page == Some(false)) {
        Some(returned)
    } else {
        None
    }
}

/// Items accumulated across pages, plus the latest page's metadata.
#[derive(Debug, Clone)]
pub struct Accumulator<N> {
    items: Vec<N>,
    total: TotalCount,
    page_info: Option<PageInfo>,
    /// Items in the last applied page
    page_len: usize,
    page_error: Option<String>,
    loaded: bool,
    /// The items answer an earlier query whose refresh failed; they stay
    /// visible but cannot be continued.
    stale: bool,
}

impl<N> Default for Accumulator<N> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: TotalCount::Unsupported,
            page_info: None,
            page_len: 0,
            page_error: None,
            loaded: false,
            stale: false,
        }
    }
}

impl<N> Accumulator<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, mode: MergeMode, page: Page<N>) {
        self.page_len = page.items.len();
        self.total = page.total_count;
        self.page_info = page.page_info;
        self.page_error = page.error;
        self.loaded = true;
        self.stale = false;
        match mode {
            MergeMode::Replace => self.items = page.items,
            MergeMode::Append => self.items.extend(page.items),
        }
    }

    /// Keep the items but refuse to page past them until the next merge.
    pub fn mark_stale(&mut self) {
        self.stale = true;
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn items(&self) -> &[N] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether any page has been applied yet.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn total(&self) -> TotalCount {
        self.total
    }

    pub fn page_len(&self) -> usize {
        self.page_len
    }

    pub fn page_error(&self) -> Option<&str> {
        self.page_error.as_deref()
    }

    pub fn end_cursor(&self) -> Option<&str> {
        if self.stale {
            return None;
        }
        self.page_info.as_ref().and_then(|p| p.end_cursor.as_deref())
    }

    /// `hasNextPage` when reported, else inferred from a known total.
    /// Always false for stale items.
    pub fn has_next_page(&self) -> bool {
        if self.stale {
            return false;
        }
        match &self.page_info {
            Some(info) => info.has_next_page,
            None => self.total.known().is_some_and(|total| self.items.len() < total),
        }
    }

    /// Total count for display, judged against the requested `first`.
    ///
    /// When completeness is inferred from the last page, the total is the
    /// accumulated length so cursor-appended lists count every item.
    pub fn total_count(&self, first: usize) -> Option<usize> {
        if !self.loaded {
            return None;
        }
        let has_next = self.page_info.as_ref().map(|p| p.has_next_page);
        match derive_total_count(self.total, self.page_len, first, has_next) {
            Some(_) if self.total.known().is_none() => Some(self.items.len()),
            derived => derived,
        }
    }
}
