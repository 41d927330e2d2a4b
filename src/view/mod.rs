//! Presentation model
//!
//! Derives what a renderer needs from engine state and configuration:
//! the items, the summary and its position, the Show-more affordance and
//! the errors to display. Rendering itself belongs to the caller.

mod summary;

pub use summary::{Summary, SummaryOptions, SummaryPosition};

use crate::config::ConnectionConfig;
use crate::engine::ConnectionState;

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionView<'a, N> {
    /// `None` while loading the first page or while a refresh has cleared the list
    pub items: Option<&'a [N]>,
    pub summary: Option<Summary>,
    pub summary_position: SummaryPosition,
    pub show_more: bool,
    pub loading: bool,
    /// Search box contents, or `None` when the search box is hidden
    pub search_input: Option<&'a str>,
    pub errors: Vec<&'a str>,
}

impl<'a, N> ConnectionView<'a, N> {
    pub fn new(state: &'a ConnectionState<N>, config: &ConnectionConfig) -> Self {
        let show_more = !config.no_show_more
            && state.loaded
            && !state.loading
            && state.has_next_page
            && !state.is_empty_result();

        Self {
            items: state.visible_items(),
            summary: Summary::derive(state, &config.summary_options()),
            summary_position: config.summary_position,
            show_more,
            loading: state.loading,
            search_input: (!config.hide_search).then_some(state.search_input.as_str()),
            errors: state.errors(),
        }
    }

    /// Plain-text rendering: errors, then the summary and list in the
    /// configured order, then the Show-more hint.
    pub fn render(&self, mut item: impl FnMut(&N) -> String) -> String {
        let mut out = String::new();
        for error in &self.errors {
            out.push_str(&format!("error: {}\n", error));
        }

        let summary = self.summary.as_ref().map(|s| s.to_string());
        if self.summary_position == SummaryPosition::Top {
            if let Some(summary) = &summary {
                out.push_str(&format!("{}\n", summary));
            }
        }

        match self.items {
            Some(items) => {
                for node in items {
                    out.push_str(&format!("  {}\n", item(node)));
                }
            }
            None if self.loading => out.push_str("loading...\n"),
            None => {}
        }

        if self.summary_position == SummaryPosition::Bottom {
            if let Some(summary) = &summary {
                out.push_str(&format!("{}\n", summary));
            }
        }
        if self.show_more {
            out.push_str("[show more]\n");
        }
        out
    }
}
