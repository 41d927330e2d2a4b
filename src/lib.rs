//! connlist: Connection List Engine
//!
//! A reusable data-fetching and pagination engine for lists backed by a
//! cursor-or-offset "connection" source (GraphQL-style `{ nodes, totalCount,
//! pageInfo }`), with debounced search, filter selection and URL state.
//!
//! # Core Concepts
//!
//! - **Source**: the caller's fetch function, a [`ConnectionSource`]
//! - **Refresh vs append**: a search or filter change starts over; "Show
//!   more" grows the list, by cursor or by doubling `first`
//! - **Latest wins**: only the response to the most recent request is applied
//! - **View**: a presentation model with the summary sentence and Show-more state
//!
//! # Example
//!
//! ```no_run
//! use connlist::{ConnectionConfig, ConnectionEngine, ConnectionSource, StaticSource};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), connlist::EngineError> {
//! let source: Arc<dyn ConnectionSource<&str>> =
//!     Arc::new(StaticSource::new(vec!["alpha", "beta", "gamma"]));
//! let engine = ConnectionEngine::new(source, ConnectionConfig::default())?;
//! let state = engine.settled().await;
//! assert_eq!(state.total_count, Some(3));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connection;
pub mod engine;
pub mod params;
pub mod view;

pub use config::{ConfigError, ConnectionConfig};
pub use connection::{
    ConnectionQuery, ConnectionSource, FetchArgs, FetchError, Filter, FilterArgs, FilterError,
    FilterSchema, FilterSet, Page, PageInfo, ScalarKind, ScalarValue, StaticSource, TotalCount,
};
pub use engine::{ConnectionEngine, ConnectionState, EngineError};
pub use params::{Location, MemoryLocation, UrlQueryState};
pub use view::{ConnectionView, Summary, SummaryOptions, SummaryPosition};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
