//! Request shapes: the user-facing query and the args handed to a source

use super::filter::FilterArgs;
use serde::{Deserialize, Serialize};

/// The current request shape, as driven by user interaction.
///
/// Never mutated by a fetch result; a new query supersedes the old one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionQuery {
    /// Effective (debounced) search text
    pub search_text: String,
    /// Active filter id, if the connection has filters
    pub active_filter_id: Option<String>,
    /// Page size (`first`)
    pub page_size: usize,
    /// Cursor to continue after (cursor paging only)
    pub after_cursor: Option<String>,
}

impl ConnectionQuery {
    pub fn has_search(&self) -> bool {
        !self.search_text.is_empty()
    }
}

/// Arguments for one call to a [`ConnectionSource`](super::ConnectionSource).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchArgs {
    pub first: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Active filter's args, flattened next to the pagination args
    #[serde(default, flatten)]
    pub filter: FilterArgs,
}

impl FetchArgs {
    pub fn new(first: usize) -> Self {
        Self {
            first,
            ..Self::default()
        }
    }

    pub fn with_after(mut self, after: impl Into<String>) -> Self {
        self.after = Some(after.into());
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        let query = query.into();
        self.query = (!query.is_empty()).then_some(query);
        self
    }

    pub fn with_filter(mut self, filter: FilterArgs) -> Self {
        self.filter = filter;
        self
    }

    /// Search text, or empty when unset.
    pub fn query_text(&self) -> &str {
        self.query.as_deref().unwrap_or("")
    }

    /// GraphQL-style variables: `{ first, after?, query?, ..filter args }`.
    pub fn to_variables(&self) -> serde_json::Value {
        let mut vars = serde_json::Map::new();
        vars.insert("first".into(), serde_json::Value::from(self.first));
        if let Some(after) = &self.after {
            vars.insert("after".into(), serde_json::Value::String(after.clone()));
        }
        if let Some(query) = &self.query {
            vars.insert("query".into(), serde_json::Value::String(query.clone()));
        }
        for (name, value) in &self.filter {
            vars.insert(name.clone(), value.to_json());
        }
        serde_json::Value::Object(vars)
    }
}
