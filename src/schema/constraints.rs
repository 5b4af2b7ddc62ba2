//! Value constraints declared next to a node's `type`.
//!
//! Only what the schema states is captured here; nothing is defaulted.
use ordered_float::OrderedFloat;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use super::kind::{Kind, ScalarKind};
use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Bound {
    pub value: OrderedFloat<f64>,
    pub exclusive: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Constraints {
    pub minimum: Option<Bound>,
    pub maximum: Option<Bound>,
    /// `minLength`/`maxLength`, strings only.
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    /// `minItems`/`maxItems`, sequences only.
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub pattern: Option<String>,
    /// `enum` literals in declaration order. Empty means unconstrained.
    pub allowed: Vec<Value>,
}

impl Constraints {
    pub fn parse(map: &Map<String, Value>, at: &str) -> Result<Self> {
        let mut out = Constraints {
            minimum: parse_bound(map, "minimum", "exclusiveMinimum", at)?,
            maximum: parse_bound(map, "maximum", "exclusiveMaximum", at)?,
            min_length: parse_count(map, "minLength", at)?,
            max_length: parse_count(map, "maxLength", at)?,
            min_items: parse_count(map, "minItems", at)?,
            max_items: parse_count(map, "maxItems", at)?,
            pattern: None,
            allowed: Vec::new(),
        };

        if let Some(pattern) = map.get("pattern") {
            let Some(pattern) = pattern.as_str() else {
                return Err(Error::schema(at, "`pattern` must be a string"));
            };
            if let Err(error) = Regex::new(pattern) {
                return Err(Error::schema(at, format!("`pattern` does not compile: {error}")));
            }
            out.pattern = Some(pattern.to_string());
        }

        if let Some(allowed) = map.get("enum") {
            match allowed {
                Value::Array(xs) if !xs.is_empty() => out.allowed = xs.clone(),
                Value::Array(_) => return Err(Error::schema(at, "`enum` must not be empty")),
                _ => return Err(Error::schema(at, "`enum` must be an array")),
            }
        }

        if let (Some(lo), Some(hi)) = (out.minimum, out.maximum) {
            let empty = lo.value > hi.value || (lo.value == hi.value && (lo.exclusive || hi.exclusive));
            if empty {
                return Err(Error::schema(at, format!("range [{}, {}] admits no value", lo.value, hi.value)));
            }
        }
        check_counts(out.min_length, out.max_length, "minLength", "maxLength", at)?;
        check_counts(out.min_items, out.max_items, "minItems", "maxItems", at)?;

        Ok(out)
    }

    pub fn is_empty(&self) -> bool {
        *self == Constraints::default()
    }

    /// Reject constraints that cannot apply to a node of `kind`.
    pub fn check_applicable(&self, kind: Kind, optional: bool, at: &str) -> Result<()> {
        let misplaced = |keyword: &str| {
            Error::schema(at, format!("`{keyword}` does not apply to a {kind} node"))
        };
        if (self.minimum.is_some() || self.maximum.is_some()) && !kind.is_numeric() {
            let keyword = if self.minimum.is_some() { "minimum" } else { "maximum" };
            return Err(misplaced(keyword));
        }
        if (self.min_length.is_some() || self.max_length.is_some() || self.pattern.is_some())
            && kind != Kind::String
        {
            let keyword = if self.pattern.is_some() { "pattern" } else { "minLength/maxLength" };
            return Err(misplaced(keyword));
        }
        if (self.min_items.is_some() || self.max_items.is_some()) && kind != Kind::Sequence {
            return Err(misplaced("minItems/maxItems"));
        }
        if !self.allowed.is_empty() {
            let Some(scalar) = scalar_of(kind) else {
                return Err(misplaced("enum"));
            };
            for value in &self.allowed {
                if value.is_null() && optional {
                    continue;
                }
                if !scalar.admits(value) {
                    return Err(Error::schema(at, format!("`enum` value {value} is not a {kind}")));
                }
            }
        }
        Ok(())
    }

    /// Reject shared constraints of a union that no alternative can carry.
    /// Run before [`Constraints::restricted_to`] distributes them.
    pub fn check_union(&self, kinds: &[Kind], optional: bool, at: &str) -> Result<()> {
        let misplaced = |keyword: &str| {
            Error::schema(at, format!("`{keyword}` applies to no alternative of this union"))
        };
        if (self.minimum.is_some() || self.maximum.is_some()) && !kinds.iter().any(|k| k.is_numeric()) {
            let keyword = if self.minimum.is_some() { "minimum" } else { "maximum" };
            return Err(misplaced(keyword));
        }
        let has_string = kinds.contains(&Kind::String);
        if (self.min_length.is_some() || self.max_length.is_some() || self.pattern.is_some()) && !has_string {
            let keyword = if self.pattern.is_some() { "pattern" } else { "minLength/maxLength" };
            return Err(misplaced(keyword));
        }
        if (self.min_items.is_some() || self.max_items.is_some()) && !kinds.contains(&Kind::Sequence) {
            return Err(misplaced("minItems/maxItems"));
        }
        if !self.allowed.is_empty() {
            let scalars: Vec<ScalarKind> = kinds.iter().filter_map(|k| scalar_of(*k)).collect();
            if scalars.is_empty() {
                return Err(misplaced("enum"));
            }
            for value in &self.allowed {
                if value.is_null() && optional {
                    continue;
                }
                if !scalars.iter().any(|s| s.admits(value)) {
                    return Err(Error::schema(at, format!("`enum` value {value} matches no alternative")));
                }
            }
        }
        Ok(())
    }

    /// The subset that applies to `kind`. Used when a OneOf's shared
    /// constraints are distributed over its alternatives.
    pub fn restricted_to(&self, kind: Kind) -> Self {
        let mut out = Constraints::default();
        if kind.is_numeric() {
            out.minimum = self.minimum;
            out.maximum = self.maximum;
        }
        if kind == Kind::String {
            out.min_length = self.min_length;
            out.max_length = self.max_length;
            out.pattern = self.pattern.clone();
        }
        if let Some(scalar) = scalar_of(kind) {
            out.allowed = self.allowed.iter().filter(|v| scalar.admits(v)).cloned().collect();
        }
        out
    }

    /// Fill every unset part from `outer`.
    pub fn inherit(mut self, outer: &Constraints) -> Self {
        self.minimum = self.minimum.or(outer.minimum);
        self.maximum = self.maximum.or(outer.maximum);
        self.min_length = self.min_length.or(outer.min_length);
        self.max_length = self.max_length.or(outer.max_length);
        self.min_items = self.min_items.or(outer.min_items);
        self.max_items = self.max_items.or(outer.max_items);
        if self.pattern.is_none() {
            self.pattern = outer.pattern.clone();
        }
        if self.allowed.is_empty() {
            self.allowed = outer.allowed.clone();
        }
        self
    }
}

fn scalar_of(kind: Kind) -> Option<ScalarKind> {
    match kind {
        Kind::Number => Some(ScalarKind::Number),
        Kind::String => Some(ScalarKind::String),
        Kind::Boolean => Some(ScalarKind::Boolean),
        Kind::Integer => Some(ScalarKind::Integer),
        _ => None,
    }
}

// Accepts both the OpenAPI 3.0 form (`exclusiveMinimum: true` next to `minimum`)
// and the draft 2019 form (`exclusiveMinimum: 3`).
fn parse_bound(map: &Map<String, Value>, key: &str, exclusive_key: &str, at: &str) -> Result<Option<Bound>> {
    let inclusive = match map.get(key) {
        None => None,
        Some(v) => match v.as_f64() {
            Some(f) => Some(f),
            None => return Err(Error::schema(at, format!("`{key}` must be a number"))),
        },
    };
    match map.get(exclusive_key) {
        None => Ok(inclusive.map(|f| Bound { value: OrderedFloat(f), exclusive: false })),
        Some(Value::Bool(flag)) => match inclusive {
            Some(f) => Ok(Some(Bound { value: OrderedFloat(f), exclusive: *flag })),
            None if !*flag => Ok(None),
            None => Err(Error::schema(at, format!("`{exclusive_key}: true` requires `{key}`"))),
        },
        Some(Value::Number(n)) => {
            if inclusive.is_some() {
                return Err(Error::schema(at, format!("both `{key}` and a numeric `{exclusive_key}` are declared")));
            }
            let f = n.as_f64().ok_or_else(|| Error::schema(at, format!("`{exclusive_key}` is not representable")))?;
            Ok(Some(Bound { value: OrderedFloat(f), exclusive: true }))
        }
        Some(_) => Err(Error::schema(at, format!("`{exclusive_key}` must be a boolean or a number"))),
    }
}

fn parse_count(map: &Map<String, Value>, key: &str, at: &str) -> Result<Option<u64>> {
    match map.get(key) {
        None => Ok(None),
        Some(v) => v
            .as_u64()
            .map(Some)
            .ok_or_else(|| Error::schema(at, format!("`{key}` must be a non-negative integer"))),
    }
}

fn check_counts(lo: Option<u64>, hi: Option<u64>, lo_key: &str, hi_key: &str, at: &str) -> Result<()> {
    match (lo, hi) {
        (Some(lo), Some(hi)) if lo > hi => {
            Err(Error::schema(at, format!("`{lo_key}` ({lo}) exceeds `{hi_key}` ({hi})")))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(v: Value) -> Result<Constraints> {
        Constraints::parse(v.as_object().unwrap(), "/x")
    }

    #[test]
    fn both_exclusive_forms_parse() {
        let c = parse(json!({ "minimum": 1, "exclusiveMinimum": true })).unwrap();
        assert_eq!(c.minimum, Some(Bound { value: OrderedFloat(1.0), exclusive: true }));

        let c = parse(json!({ "exclusiveMaximum": 10 })).unwrap();
        assert_eq!(c.maximum, Some(Bound { value: OrderedFloat(10.0), exclusive: true }));
    }

    #[test]
    fn empty_ranges_are_rejected() {
        assert!(parse(json!({ "minimum": 5, "maximum": 1 })).is_err());
        assert!(parse(json!({ "minimum": 1, "maximum": 1, "exclusiveMaximum": true })).is_err());
        assert!(parse(json!({ "minimum": 1, "maximum": 1 })).is_ok());
        assert!(parse(json!({ "minLength": 4, "maxLength": 2 })).is_err());
    }

    #[test]
    fn bad_pattern_is_a_schema_error() {
        let err = parse(json!({ "pattern": "([a-z" })).unwrap_err();
        assert_eq!(err.kind(), "schema");
    }

    #[test]
    fn applicability_follows_kind() {
        let c = parse(json!({ "pattern": "^a" })).unwrap();
        assert!(c.check_applicable(Kind::String, false, "/x").is_ok());
        assert!(c.check_applicable(Kind::Integer, false, "/x").is_err());

        let c = parse(json!({ "enum": ["a", null] })).unwrap();
        assert!(c.check_applicable(Kind::String, true, "/x").is_ok());
        assert!(c.check_applicable(Kind::String, false, "/x").is_err());
    }

    #[test]
    fn restriction_splits_shared_constraints() {
        let c = parse(json!({ "maximum": 65535, "pattern": "^[a-z]+$", "enum": [80, "http"] })).unwrap();
        let num = c.restricted_to(Kind::Number);
        assert!(num.maximum.is_some() && num.pattern.is_none());
        assert_eq!(num.allowed, vec![json!(80)]);
        let s = c.restricted_to(Kind::String);
        assert!(s.maximum.is_none() && s.pattern.is_some());
        assert_eq!(s.allowed, vec![json!("http")]);
    }
}
