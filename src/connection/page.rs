//! One fetch result and its paging metadata

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// What a source knows about the total number of matching items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TotalCount {
    /// Precise count
    Known(usize),
    /// The source cannot compute it for this query (`null`)
    Unknown,
    /// The source never reports it (field absent)
    #[default]
    Unsupported,
}

impl TotalCount {
    pub fn known(&self) -> Option<usize> {
        match self {
            Self::Known(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported)
    }
}

impl From<Option<usize>> for TotalCount {
    fn from(value: Option<usize>) -> Self {
        value.map_or(Self::Unknown, Self::Known)
    }
}

impl Serialize for TotalCount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.known().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TotalCount {
    /// A present field is `Known` or `Unknown` (null). Absence is handled by
    /// `#[serde(default)]` on the containing field.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<usize>::deserialize(deserializer).map(TotalCount::from)
    }
}

/// Cursor paging metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    #[serde(default)]
    pub end_cursor: Option<String>,
}

/// One page returned by a source.
///
/// Deserializes from the GraphQL connection shape:
/// `{ nodes, totalCount?, pageInfo?: { hasNextPage, endCursor }, error? }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<N> {
    #[serde(alias = "nodes")]
    pub items: Vec<N>,
    #[serde(default, skip_serializing_if = "TotalCount::is_unsupported")]
    pub total_count: TotalCount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_info: Option<PageInfo>,
    /// Advisory, non-fatal error reported alongside the items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<N> Page<N> {
    pub fn new(items: Vec<N>) -> Self {
        Self {
            items,
            total_count: TotalCount::Unsupported,
            page_info: None,
            error: None,
        }
    }

    pub fn with_total(mut self, total: TotalCount) -> Self {
        self.total_count = total;
        self
    }

    pub fn with_known_total(self, total: usize) -> Self {
        self.with_total(TotalCount::Known(total))
    }

    pub fn with_page_info(mut self, has_next_page: bool, end_cursor: Option<String>) -> Self {
        self.page_info = Some(PageInfo {
            has_next_page,
            end_cursor,
        });
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// `hasNextPage` if the source reported page info.
    pub fn has_next_page(&self) -> Option<bool> {
        self.page_info.as_ref().map(|p| p.has_next_page)
    }

    pub fn end_cursor(&self) -> Option<&str> {
        self.page_info.as_ref().and_then(|p| p.end_cursor.as_deref())
    }
}
