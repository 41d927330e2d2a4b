//! Connection configuration
//!
//! Everything a caller can tune lives in one explicit struct, loadable from
//! YAML. Unset fields take their defaults.
//!
//! ```yaml
//! default_first: 20
//! cursor_paging: true
//! noun: repository
//! plural_noun: repositories
//! filters:
//!   - id: all
//!     label: All
//!   - id: cloned
//!     label: Cloned
//!     args: { cloned: true }
//! ```

use crate::connection::{Filter, FilterError, FilterSchema, FilterSet};
use crate::view::{SummaryOptions, SummaryPosition};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_FIRST: usize = 20;
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 200;
pub const DEFAULT_CLEAR_DELAY_MS: u64 = 250;

/// Errors from loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("default_first must be at least 1")]
    InvalidPageSize,

    #[error("invalid filter configuration: {0}")]
    Filter(#[from] FilterError),
}

/// Options recognized by a connection list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConnectionConfig {
    /// Page size when the URL does not say otherwise
    pub default_first: usize,
    /// Read and write `query`/`first`/`filter`/`visible` in the location
    pub use_url_query: bool,
    /// Append by cursor instead of doubling `first`
    pub cursor_paging: bool,
    pub hide_search: bool,
    pub filters: Vec<Filter>,
    /// Declared filter argument kinds; unchecked when absent
    pub filter_schema: Option<FilterSchema>,
    /// Defaults to the first filter
    pub default_filter: Option<String>,
    pub no_show_more: bool,
    pub no_summary_if_all_nodes_visible: bool,
    /// Replaces the "No {plural_noun}" message
    pub empty_message: Option<String>,
    pub noun: String,
    pub plural_noun: String,
    pub summary_position: SummaryPosition,
    /// Opaque key; changing it forces a refresh
    pub update_on_change: Option<String>,
    pub search_debounce_ms: u64,
    pub clear_delay_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            default_first: DEFAULT_FIRST,
            use_url_query: true,
            cursor_paging: false,
            hide_search: false,
            filters: Vec::new(),
            filter_schema: None,
            default_filter: None,
            no_show_more: false,
            no_summary_if_all_nodes_visible: false,
            empty_message: None,
            noun: "item".to_string(),
            plural_noun: "items".to_string(),
            summary_position: SummaryPosition::default(),
            update_on_change: None,
            search_debounce_ms: DEFAULT_SEARCH_DEBOUNCE_MS,
            clear_delay_ms: DEFAULT_CLEAR_DELAY_MS,
        }
    }
}

impl ConnectionConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Check the page size and build the validated filter set.
    pub fn validate(&self) -> Result<FilterSet, ConfigError> {
        if self.default_first == 0 {
            return Err(ConfigError::InvalidPageSize);
        }
        Ok(FilterSet::new(
            self.filters.clone(),
            self.default_filter.as_deref(),
            self.filter_schema.as_ref(),
        )?)
    }

    pub fn with_default_first(mut self, first: usize) -> Self {
        self.default_first = first;
        self
    }

    pub fn with_cursor_paging(mut self, enabled: bool) -> Self {
        self.cursor_paging = enabled;
        self
    }

    pub fn with_filters(mut self, filters: Vec<Filter>) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_nouns(mut self, noun: impl Into<String>, plural_noun: impl Into<String>) -> Self {
        self.noun = noun.into();
        self.plural_noun = plural_noun.into();
        self
    }

    pub fn without_url_query(mut self) -> Self {
        self.use_url_query = false;
        self
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn clear_delay(&self) -> Duration {
        Duration::from_millis(self.clear_delay_ms)
    }

    pub fn summary_options(&self) -> SummaryOptions {
        SummaryOptions {
            noun: self.noun.clone(),
            plural_noun: self.plural_noun.clone(),
            empty_message: self.empty_message.clone(),
            no_summary_if_all_nodes_visible: self.no_summary_if_all_nodes_visible,
        }
    }
}
