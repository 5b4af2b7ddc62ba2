//! Validation rule derivation.
//!
//! Walks the schema tree alongside a resolved [`PathMap`] and produces one
//! [`ValidatorUnit`] per node that needs a runtime check. Rules inside a unit are
//! ordered so a validator can stop at the first failure:
//!
//! 1. `NonNull`
//! 2. `TypeMatch`
//! 3. value constraints: `RangeCheck`, `LengthCheck`, `PatternMatch`, `EnumMatch`
//!
//! Union nodes get no unit of their own. Each alternative gets an independent
//! unit and choosing between them is left to the emitter.
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::path::{FieldPath, PathMap, Segment};
use crate::schema::{Bound, Constraints, Kind, SchemaNode, Shape};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", rename_all = "camelCase")]
pub enum ValidationRule {
    NonNull,
    TypeMatch { kind: Kind },
    RangeCheck { min: Option<Bound>, max: Option<Bound> },
    LengthCheck { min: Option<u64>, max: Option<u64> },
    PatternMatch { pattern: String },
    EnumMatch { allowed: Vec<Value> },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorUnit {
    pub path: FieldPath,
    /// Set when this unit validates one representation of a union.
    pub alternative: Option<Kind>,
    pub identifier: String,
    /// JSON pointer of the originating schema node.
    pub origin: String,
    pub rules: Vec<ValidationRule>,
}

/// Which rule families are derived. Value-constraint families only ever fire
/// when the schema declares the matching keyword.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct DeriveOptions {
    /// Emit `TypeMatch` units for every object and sequence, not only for
    /// union alternatives.
    pub shape_checks: bool,
    pub range_checks: bool,
    pub length_checks: bool,
    pub pattern_checks: bool,
    pub enum_checks: bool,
}

impl Default for DeriveOptions {
    fn default() -> Self {
        DeriveOptions {
            shape_checks: false,
            range_checks: true,
            length_checks: true,
            pattern_checks: true,
            enum_checks: true,
        }
    }
}

/// Derive validator units in depth-first declaration order.
pub fn derive(root: &SchemaNode, names: &PathMap, options: &DeriveOptions) -> Result<Vec<ValidatorUnit>> {
    let mut deriver = Deriver { names, options, units: Vec::new() };
    deriver.visit(root, FieldPath::root(), false)?;
    tracing::debug!(units = deriver.units.len(), nodes = root.node_count(), "derived validator units");
    Ok(deriver.units)
}

struct Deriver<'a> {
    names: &'a PathMap,
    options: &'a DeriveOptions,
    units: Vec<ValidatorUnit>,
}

impl Deriver<'_> {
    fn visit(&mut self, node: &SchemaNode, path: FieldPath, is_alternative: bool) -> Result<()> {
        let identifier = self.identifier_of(node, &path)?;
        let required = !node.optional || is_alternative;

        match &node.shape {
            Shape::Scalar(_) => {
                let mut rules = Vec::new();
                if required {
                    rules.push(ValidationRule::NonNull);
                }
                rules.extend(self.value_rules(&node.constraints));
                self.push(node, &path, identifier, rules);
            }
            Shape::Object(fields) => {
                self.push_container(node, &path, identifier, required, is_alternative);
                for (name, child) in fields {
                    self.visit(child, path.child(Segment::Key(name.clone())), false)?;
                }
            }
            Shape::Sequence(item) => {
                self.push_container(node, &path, identifier, required, is_alternative);
                self.visit(item, path.child(Segment::Element), false)?;
            }
            Shape::OneOf(alternatives) => {
                for alt in alternatives {
                    self.visit(alt, path.child(Segment::Alternative(alt.kind())), true)?;
                }
            }
        }
        Ok(())
    }

    fn push_container(
        &mut self,
        node: &SchemaNode,
        path: &FieldPath,
        identifier: String,
        required: bool,
        is_alternative: bool,
    ) {
        let value_rules = self.value_rules(&node.constraints);
        let shape_check = self.options.shape_checks || is_alternative;
        if !shape_check && value_rules.is_empty() {
            return;
        }
        let mut rules = Vec::new();
        if required {
            rules.push(ValidationRule::NonNull);
        }
        if shape_check {
            rules.push(ValidationRule::TypeMatch { kind: node.kind() });
        }
        rules.extend(value_rules);
        self.push(node, path, identifier, rules);
    }

    fn value_rules(&self, c: &Constraints) -> Vec<ValidationRule> {
        let mut rules = Vec::new();
        if self.options.range_checks && (c.minimum.is_some() || c.maximum.is_some()) {
            rules.push(ValidationRule::RangeCheck { min: c.minimum, max: c.maximum });
        }
        if self.options.length_checks {
            let (min, max) = match (c.min_length, c.max_length) {
                (None, None) => (c.min_items, c.max_items),
                declared => declared,
            };
            if min.is_some() || max.is_some() {
                rules.push(ValidationRule::LengthCheck { min, max });
            }
        }
        if self.options.pattern_checks {
            if let Some(pattern) = &c.pattern {
                rules.push(ValidationRule::PatternMatch { pattern: pattern.clone() });
            }
        }
        if self.options.enum_checks && !c.allowed.is_empty() {
            rules.push(ValidationRule::EnumMatch { allowed: c.allowed.clone() });
        }
        rules
    }

    fn push(&mut self, node: &SchemaNode, path: &FieldPath, identifier: String, rules: Vec<ValidationRule>) {
        if rules.is_empty() {
            return;
        }
        tracing::trace!(%path, %identifier, rules = rules.len(), "validator unit");
        self.units.push(ValidatorUnit {
            path: path.clone(),
            alternative: path.alternative(),
            identifier,
            origin: node.origin.clone(),
            rules,
        });
    }

    fn identifier_of(&self, node: &SchemaNode, path: &FieldPath) -> Result<String> {
        match self.names.get(path) {
            Some(identifier) => Ok(identifier.to_string()),
            None => Err(Error::UnresolvedPath {
                path: path.clone(),
                origin: node.origin.clone(),
                known: self.names.len(),
                nearest: self.names.nearest_resolved(path),
            }),
        }
    }
}
