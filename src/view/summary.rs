//! Summary sentence for a connection list
//!
//! "{total} {noun|plural} total" or "... matching **{query}**", followed by
//! "(showing first {n})" when only part of the total is shown. A total of
//! zero yields the empty message instead.

use crate::engine::ConnectionState;
use serde::{Deserialize, Serialize};

/// Where the caller places the summary relative to the list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryPosition {
    #[default]
    Top,
    Bottom,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryOptions {
    pub noun: String,
    pub plural_noun: String,
    pub empty_message: Option<String>,
    pub no_summary_if_all_nodes_visible: bool,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            noun: "item".to_string(),
            plural_noun: "items".to_string(),
            empty_message: None,
            no_summary_if_all_nodes_visible: false,
        }
    }
}

impl SummaryOptions {
    pub fn pluralize(&self, count: usize) -> &str {
        if count == 1 {
            &self.noun
        } else {
            &self.plural_noun
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Summary {
    /// Nothing matched
    Empty {
        message: String,
    },
    Count {
        total: usize,
        noun: String,
        /// The active search text, if any
        matching: Option<String>,
        /// Number shown, when fewer than `total`
        showing: Option<usize>,
    },
}

impl Summary {
    /// Derive the summary for a state, or `None` when none should be shown.
    ///
    /// Nothing is derived before the first page, while a refresh has
    /// cleared the list, or when the total is indeterminate.
    pub fn derive<N>(state: &ConnectionState<N>, options: &SummaryOptions) -> Option<Self> {
        let items = state.visible_items()?;
        if options.no_summary_if_all_nodes_visible && !items.is_empty() && !state.has_next_page {
            return None;
        }
        let total = state.total_count?;
        let matching = state
            .query
            .has_search()
            .then(|| state.query.search_text.clone());

        if total == 0 {
            let message = match &options.empty_message {
                Some(message) => message.clone(),
                None => match &matching {
                    Some(query) => format!("No {} matching **{}**", options.plural_noun, query),
                    None => format!("No {}", options.plural_noun),
                },
            };
            return Some(Self::Empty { message });
        }

        Some(Self::Count {
            total,
            noun: options.pluralize(total).to_string(),
            matching,
            showing: (items.len() < total).then_some(items.len()),
        })
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty { message } => write!(f, "{}", message),
            Self::Count {
                total,
                noun,
                matching,
                showing,
            } => {
                write!(f, "{} {}", total, noun)?;
                match matching {
                    Some(query) => write!(f, " matching **{}**", query)?,
                    None => write!(f, " total")?,
                }
                if let Some(shown) = showing {
                    write!(f, " (showing first {})", shown)?;
                }
                Ok(())
            }
        }
    }
}
