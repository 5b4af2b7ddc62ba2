use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Scalar leaf types a schema may declare.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScalarKind {
    Number,
    String,
    Boolean,
    Integer,
}

/// Flat tag over every node shape. Used for alternative path segments and shape rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Kind {
    Number,
    String,
    Boolean,
    Integer,
    Object,
    Sequence,
    OneOf,
}

impl ScalarKind {
    /// Parse a JSON-Schema `type` keyword. `object`/`array`/`null` are handled by the caller.
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "number" => Some(ScalarKind::Number),
            "string" => Some(ScalarKind::String),
            "boolean" => Some(ScalarKind::Boolean),
            "integer" => Some(ScalarKind::Integer),
            _ => None,
        }
    }

    /// Whether a literal (from `enum`) is a value of this kind.
    pub fn admits(self, value: &Value) -> bool {
        match (self, value) {
            (ScalarKind::Number, Value::Number(_)) => true,
            (ScalarKind::Integer, Value::Number(n)) => {
                n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
            }
            (ScalarKind::String, Value::String(_)) => true,
            (ScalarKind::Boolean, Value::Bool(_)) => true,
            _ => false,
        }
    }
}

impl Kind {
    pub fn is_scalar(self) -> bool {
        matches!(self, Kind::Number | Kind::String | Kind::Boolean | Kind::Integer)
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Kind::Number | Kind::Integer)
    }

    /// Capitalized name substituted into alternative identifier templates.
    pub fn type_name(self) -> &'static str {
        match self {
            Kind::Number => "Number",
            Kind::String => "String",
            Kind::Boolean => "Boolean",
            Kind::Integer => "Integer",
            Kind::Object => "Object",
            Kind::Sequence => "Sequence",
            Kind::OneOf => "OneOf",
        }
    }
}

impl From<ScalarKind> for Kind {
    fn from(kind: ScalarKind) -> Self {
        match kind {
            ScalarKind::Number => Kind::Number,
            ScalarKind::String => Kind::String,
            ScalarKind::Boolean => Kind::Boolean,
            ScalarKind::Integer => Kind::Integer,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Kind::Number => "number",
            Kind::String => "string",
            Kind::Boolean => "boolean",
            Kind::Integer => "integer",
            Kind::Object => "object",
            Kind::Sequence => "sequence",
            Kind::OneOf => "oneOf",
        };
        f.write_str(s)
    }
}
