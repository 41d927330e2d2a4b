//! Query parameter state and its URL form

mod state;
pub mod url;

pub use state::{QueryParams, RequestKind};
pub use url::{Location, MemoryLocation, UrlQueryState};
