//! Filters and their typed arguments
//!
//! A filter is a named, selectable preset whose `args` are merged into every
//! fetch while it is active. Args are scalars, optionally checked against a
//! declared schema.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Argument names owned by the pagination layer; filters may not shadow them.
pub const RESERVED_ARGS: [&str; 3] = ["first", "after", "query"];

/// A scalar filter argument value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl ScalarValue {
    pub fn kind(&self) -> ScalarKind {
        match self {
            Self::Bool(_) => ScalarKind::Bool,
            Self::Int(_) => ScalarKind::Int,
            Self::Float(_) => ScalarKind::Float,
            Self::String(_) => ScalarKind::String,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(i) => serde_json::Value::from(*i),
            Self::Float(f) => serde_json::Value::from(*f),
            Self::String(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl std::fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::String(s) => write!(f, "{}", s),
        }
    }
}

/// The declared type of a filter argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    String,
    Int,
    Float,
    Bool,
}

impl ScalarKind {
    /// Whether a value of `found` kind may be used where `self` is declared.
    /// Integers widen to floats; nothing else converts.
    pub fn accepts(self, found: ScalarKind) -> bool {
        self == found || (self == ScalarKind::Float && found == ScalarKind::Int)
    }
}

impl std::fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
        };
        write!(f, "{}", name)
    }
}

/// Filter arguments, keyed by argument name
pub type FilterArgs = BTreeMap<String, ScalarValue>;

/// Errors from filter declaration or selection
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    #[error("unknown filter: {0}")]
    UnknownFilter(String),

    #[error("duplicate filter id: {0}")]
    DuplicateId(String),

    #[error("filter '{filter}' has undeclared argument '{arg}'")]
    UnknownArg { filter: String, arg: String },

    #[error("filter '{filter}' argument '{arg}' expected {expected}, found {found}")]
    KindMismatch {
        filter: String,
        arg: String,
        expected: ScalarKind,
        found: ScalarKind,
    },

    #[error("filter '{filter}' uses reserved argument name '{arg}'")]
    ReservedArg { filter: String, arg: String },
}

/// A selectable filter preset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Filter {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
    #[serde(default)]
    pub args: FilterArgs,
}

impl Filter {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            tooltip: None,
            args: FilterArgs::new(),
        }
    }

    pub fn with_arg(mut self, name: impl Into<String>, value: ScalarValue) -> Self {
        self.args.insert(name.into(), value);
        self
    }

    pub fn with_tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = Some(tooltip.into());
        self
    }
}

/// Declared argument names and kinds that every filter must conform to
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSchema(pub BTreeMap<String, ScalarKind>);

impl FilterSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_arg(mut self, name: impl Into<String>, kind: ScalarKind) -> Self {
        self.0.insert(name.into(), kind);
        self
    }

    /// Check a filter's args against the declared names and kinds.
    pub fn validate(&self, filter: &Filter) -> Result<(), FilterError> {
        for (arg, value) in &filter.args {
            let expected = self.0.get(arg).ok_or_else(|| FilterError::UnknownArg {
                filter: filter.id.clone(),
                arg: arg.clone(),
            })?;
            if !expected.accepts(value.kind()) {
                return Err(FilterError::KindMismatch {
                    filter: filter.id.clone(),
                    arg: arg.clone(),
                    expected: *expected,
                    found: value.kind(),
                });
            }
        }
        Ok(())
    }
}

/// The validated set of filters a connection offers.
///
/// The default filter is the configured one, or the first declared filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    filters: Vec<Filter>,
    default_id: Option<String>,
}

impl FilterSet {
    /// An empty set: no filter is ever active.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(
        filters: Vec<Filter>,
        default_id: Option<&str>,
        schema: Option<&FilterSchema>,
    ) -> Result<Self, FilterError> {
        for (i, filter) in filters.iter().enumerate() {
            if filters[..i].iter().any(|f| f.id == filter.id) {
                return Err(FilterError::DuplicateId(filter.id.clone()));
            }
            if let Some(arg) = filter.args.keys().find(|k| RESERVED_ARGS.contains(&k.as_str())) {
                return Err(FilterError::ReservedArg {
                    filter: filter.id.clone(),
                    arg: arg.clone(),
                });
            }
            if let Some(schema) = schema {
                schema.validate(filter)?;
            }
        }

        let default_id = match default_id {
            Some(id) => {
                if !filters.iter().any(|f| f.id == id) {
                    return Err(FilterError::UnknownFilter(id.to_string()));
                }
                Some(id.to_string())
            }
            None => filters.first().map(|f| f.id.clone()),
        };

        Ok(Self { filters, default_id })
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Filter> {
        self.filters.iter().find(|f| f.id == id)
    }

    pub fn default_id(&self) -> Option<&str> {
        self.default_id.as_deref()
    }

    pub fn is_default(&self, id: &str) -> bool {
        self.default_id.as_deref() == Some(id)
    }

    /// Resolve a requested id, falling back to the default for unknown ids.
    pub fn resolve(&self, id: Option<&str>) -> Option<&Filter> {
        id.and_then(|id| self.get(id))
            .or_else(|| self.default_id().and_then(|d| self.get(d)))
    }

    /// Args of the given filter, or none when the id is unset or unknown.
    pub fn args_for(&self, id: Option<&str>) -> FilterArgs {
        id.and_then(|id| self.get(id))
            .map(|f| f.args.clone())
            .unwrap_or_default()
    }
}
