//! Common test utilities for engine integration tests
//!
//! `ScriptedSource` records every fetch and holds it open until the test
//! releases it, so tests decide exactly when (and in which order) responses
//! arrive.

pub mod scripted;

pub use scripted::ScriptedSource;

use connlist::{ConnectionConfig, Filter, ScalarValue};

/// Config without URL sync, with "thing"/"things" nouns.
pub fn config(first: usize) -> ConnectionConfig {
    ConnectionConfig::default()
        .with_default_first(first)
        .with_nouns("thing", "things")
        .without_url_query()
}

pub fn filters() -> Vec<Filter> {
    vec![
        Filter::new("all", "All"),
        Filter::new("open", "Open").with_arg("state", ScalarValue::String("OPEN".into())),
        Filter::new("closed", "Closed").with_arg("state", ScalarValue::String("CLOSED".into())),
    ]
}
