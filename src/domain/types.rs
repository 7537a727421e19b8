//! Shared domain enumerations aligned with the persisted record format.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Storage tag of a [`TypedValue`](crate::domain::values::TypedValue).
///
/// The serialized names match the `kind` strings written into a record's
/// JSON store, so they must never be renamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Integer,
    String,
    Float,
    Boolean,
    Array,
    Date,
    Resource,
}

impl ValueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Integer => "integer",
            ValueKind::String => "string",
            ValueKind::Float => "float",
            ValueKind::Boolean => "boolean",
            ValueKind::Array => "array",
            ValueKind::Date => "date",
            ValueKind::Resource => "resource",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
