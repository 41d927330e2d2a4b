//! URL query-string synchronization
//!
//! Reads `query`, `first`, `filter` and `visible` from a location's search
//! string and writes them back, replacing the current history entry.
//! Parameters the engine does not own are preserved in order.

use std::sync::Mutex;
use url::form_urlencoded;

pub const QUERY_PARAM: &str = "query";
pub const FIRST_PARAM: &str = "first";
pub const FILTER_PARAM: &str = "filter";
pub const VISIBLE_PARAM: &str = "visible";

/// The host's location (a browser URL, a persisted terminal state, a test double).
pub trait Location: Send + Sync {
    /// Current search string, with or without the leading `?`.
    fn search(&self) -> String;

    /// Replace the current history entry's search string. Never pushes.
    fn replace_search(&self, search: &str);
}

/// In-memory location that records how many times it was replaced.
#[derive(Debug, Default)]
pub struct MemoryLocation {
    search: Mutex<String>,
    replacements: Mutex<usize>,
}

impl MemoryLocation {
    pub fn new(search: impl Into<String>) -> Self {
        Self {
            search: Mutex::new(search.into()),
            replacements: Mutex::new(0),
        }
    }

    pub fn replacements(&self) -> usize {
        *self.replacements.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Location for MemoryLocation {
    fn search(&self) -> String {
        self.search.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn replace_search(&self, search: &str) {
        *self.search.lock().unwrap_or_else(|e| e.into_inner()) = search.to_string();
        *self.replacements.lock().unwrap_or_else(|e| e.into_inner()) += 1;
    }
}

/// The engine's parameters as they appear in the URL.
///
/// `None` means the parameter is absent (or unparseable, for numbers).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlQueryState {
    pub query: Option<String>,
    pub first: Option<usize>,
    pub filter: Option<String>,
    pub visible: Option<usize>,
}

impl UrlQueryState {
    pub fn parse(search: &str) -> Self {
        let mut state = Self::default();
        for (key, value) in parse_pairs(search) {
            match key.as_str() {
                QUERY_PARAM => state.query = Some(value),
                FIRST_PARAM => state.first = value.parse().ok().filter(|n| *n > 0),
                FILTER_PARAM => state.filter = Some(value),
                VISIBLE_PARAM => state.visible = value.parse().ok(),
                _ => {}
            }
        }
        state
    }

    /// Merge into an existing search string: set present params, delete
    /// absent ones, keep everything else.
    pub fn apply_to(&self, existing: &str) -> String {
        let mut pairs: Vec<(String, String)> = parse_pairs(existing)
            .into_iter()
            .filter(|(k, _)| {
                ![QUERY_PARAM, FIRST_PARAM, FILTER_PARAM, VISIBLE_PARAM].contains(&k.as_str())
            })
            .collect();

        if let Some(query) = &self.query {
            pairs.push((QUERY_PARAM.into(), query.clone()));
        }
        if let Some(first) = self.first {
            pairs.push((FIRST_PARAM.into(), first.to_string()));
        }
        if let Some(filter) = &self.filter {
            pairs.push((FILTER_PARAM.into(), filter.clone()));
        }
        if let Some(visible) = self.visible {
            pairs.push((VISIBLE_PARAM.into(), visible.to_string()));
        }

        let mut serializer = form_urlencoded::Serializer::new(String::new());
        serializer.extend_pairs(&pairs);
        serializer.finish()
    }
}

/// Split a search string into decoded key/value pairs.
pub fn parse_pairs(search: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(search.trim_start_matches('?').as_bytes())
        .into_owned()
        .collect()
}
