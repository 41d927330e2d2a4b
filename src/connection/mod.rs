//! Connection data model and the fetch contract

mod filter;
mod page;
mod query;
mod source;

pub use filter::{
    Filter, FilterArgs, FilterError, FilterSchema, FilterSet, ScalarKind, ScalarValue,
    RESERVED_ARGS,
};
pub use page::{Page, PageInfo, TotalCount};
pub use query::{ConnectionQuery, FetchArgs};
pub use source::{ConnectionSource, FetchError, Matcher, StaticSource};
