//! The closed type-tag set a distributed object's fields are declared
//! against. Fields are stored as `serde_json::Value` at rest (see
//! `state.rs`); `FieldKind` exists purely to hand every class a documented
//! schema and a sane per-type default.

use serde_json::Value;
use std::fmt;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum FieldKind {
    Int,
    Float,
    Str,
    Bytes,
    Bool,
    /// Anything the class wants to hand-roll: passed through to/from JSON
    /// untouched, with no default-value guarantee.
    Opaque,
}

impl FieldKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Int => "int",
            FieldKind::Float => "float",
            FieldKind::Str => "string",
            FieldKind::Bytes => "bytes",
            FieldKind::Bool => "bool",
            FieldKind::Opaque => "opaque",
        }
    }

    /// The value a freshly-created field holds before anything sets it.
    pub fn default_value(self) -> Value {
        match self {
            FieldKind::Int => Value::from(0i64),
            FieldKind::Float => Value::from(0.0f64),
            FieldKind::Str => Value::from(""),
            FieldKind::Bytes => Value::Array(Vec::new()),
            FieldKind::Bool => Value::from(false),
            FieldKind::Opaque => Value::Null,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in a class's schema: the field's name and its declared kind.
/// `distributed_object!` builds a class's `Vec<FieldSchema>` at registration
/// time; the schema is advisory (it documents and seeds defaults) rather
/// than enforced on every write, since fields are dynamically typed at
/// rest.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FieldSchema {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldSchema {
    pub const fn new(name: &'static str, kind: FieldKind) -> FieldSchema {
        FieldSchema { name, kind }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values_match_kind() {
        assert_eq!(FieldKind::Int.default_value(), Value::from(0i64));
        assert_eq!(FieldKind::Bool.default_value(), Value::from(false));
        assert_eq!(FieldKind::Str.default_value(), Value::from(""));
    }

    #[test]
    fn display_matches_as_str() {
        assert_eq!(FieldKind::Opaque.to_string(), "opaque");
    }
}
