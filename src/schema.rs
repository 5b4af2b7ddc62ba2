//! In-memory schema model.
//!
//! Built once from a parsed OpenAPI v3 / JSON-Schema document (the shape used by
//! Kubernetes `openAPIV3Schema` blocks) and never mutated afterwards. Everything
//! downstream (path resolution, rule derivation) reads this tree only.
//!
//! Accepted source features:
//! - `type` as a string or an array of strings (`"null"` marks the node optional)
//! - `properties` + `required`, `items`, `nullable`
//! - `oneOf` / `anyOf` over typed alternatives
//! - `x-kubernetes-int-or-string: true` (number-or-string union)
//! - value constraints, see [`constraints`]
pub mod constraints;
pub mod kind;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

pub use constraints::{Bound, Constraints};
pub use kind::{Kind, ScalarKind};

#[derive(Clone, Debug, PartialEq)]
pub struct SchemaNode {
    pub shape: Shape,
    pub optional: bool,
    /// JSON pointer of this node inside the raw schema (`""` is the root).
    pub origin: String,
    pub constraints: Constraints,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Scalar(ScalarKind),
    /// Fields in declaration order.
    Object(IndexMap<String, SchemaNode>),
    Sequence(Box<SchemaNode>),
    /// Scalar or Object alternatives with pairwise distinct kinds.
    OneOf(Vec<SchemaNode>),
}

impl SchemaNode {
    /// Build the model from a parsed schema document.
    pub fn build(raw: &Value) -> Result<SchemaNode> {
        build_node(raw, "", false)
    }

    pub fn kind(&self) -> Kind {
        match &self.shape {
            Shape::Scalar(k) => (*k).into(),
            Shape::Object(_) => Kind::Object,
            Shape::Sequence(_) => Kind::Sequence,
            Shape::OneOf(_) => Kind::OneOf,
        }
    }

    /// Total number of nodes in this subtree, alternatives included.
    pub fn node_count(&self) -> usize {
        1 + match &self.shape {
            Shape::Scalar(_) => 0,
            Shape::Object(fields) => fields.values().map(SchemaNode::node_count).sum(),
            Shape::Sequence(item) => item.node_count(),
            Shape::OneOf(alts) => alts.iter().map(SchemaNode::node_count).sum(),
        }
    }
}

// ------------------------------- Builder --------------------------------- //

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TypeName {
    Object,
    Array,
    Scalar(ScalarKind),
}

impl TypeName {
    fn kind(self) -> Kind {
        match self {
            TypeName::Scalar(k) => k.into(),
            TypeName::Object => Kind::Object,
            TypeName::Array => Kind::Sequence,
        }
    }
}

struct Declared {
    types: Vec<TypeName>,
    null: bool,
}

fn build_node(raw: &Value, at: &str, optional_in_parent: bool) -> Result<SchemaNode> {
    let Value::Object(map) = raw else {
        return Err(Error::schema(at, "schema node must be an object"));
    };
    if map.contains_key("$ref") {
        return Err(Error::schema(at, "`$ref` must be dereferenced before building"));
    }

    let constraints = Constraints::parse(map, at)?;
    let declared = declared_types(map, at)?;
    let optional = optional_in_parent
        || declared.null
        || map.get("nullable").and_then(Value::as_bool).unwrap_or(false);

    if map.get("x-kubernetes-int-or-string").and_then(Value::as_bool).unwrap_or(false) {
        constraints.check_union(&[Kind::Number, Kind::String], optional, at)?;
        let alternatives = [ScalarKind::Number, ScalarKind::String]
            .into_iter()
            .map(|k| typed_alternative(TypeName::Scalar(k), map, at, &constraints))
            .collect::<Result<Vec<_>>>()?;
        return Ok(one_of(alternatives, optional, at));
    }

    if let Some((keyword, entries)) = combinator(map, at)? {
        let structural_only = !declared.types.is_empty() && !entries.iter().any(declares_shape);
        if structural_only {
            tracing::debug!(at, keyword, "ignoring structural-only combinator");
        } else {
            return build_one_of(keyword, entries, at, &constraints, optional);
        }
    }

    match declared.types.as_slice() {
        [] => {
            if map.contains_key("properties") {
                build_typed(TypeName::Object, map, at, constraints, optional)
            } else if map.contains_key("items") {
                build_typed(TypeName::Array, map, at, constraints, optional)
            } else {
                Err(Error::schema(at, "missing `type` and no `properties`, `items` or combinator to infer it from"))
            }
        }
        [single] => build_typed(*single, map, at, constraints, optional),
        many => {
            let kinds: Vec<Kind> = many.iter().map(|t| t.kind()).collect();
            constraints.check_union(&kinds, optional, at)?;
            let alternatives = many
                .iter()
                .map(|t| typed_alternative(*t, map, at, &constraints))
                .collect::<Result<Vec<_>>>()?;
            check_alternatives(&alternatives, at)?;
            Ok(one_of(alternatives, optional, at))
        }
    }
}

fn build_typed(
    ty: TypeName,
    map: &Map<String, Value>,
    at: &str,
    constraints: Constraints,
    optional: bool,
) -> Result<SchemaNode> {
    let shape = match ty {
        TypeName::Scalar(k) => Shape::Scalar(k),
        TypeName::Object => Shape::Object(build_fields(map, at)?),
        TypeName::Array => {
            let item = match map.get("items") {
                None => return Err(Error::schema(at, "array without `items`")),
                Some(Value::Array(_)) => return Err(Error::schema(at, "tuple-form `items` is not supported")),
                Some(item) => build_node(item, &format!("{at}/items"), false)?,
            };
            Shape::Sequence(Box::new(item))
        }
    };
    let node = SchemaNode { shape, optional, origin: at.to_string(), constraints };
    node.constraints.check_applicable(node.kind(), node.optional, at)?;
    Ok(node)
}

fn build_fields(map: &Map<String, Value>, at: &str) -> Result<IndexMap<String, SchemaNode>> {
    let properties = match map.get("properties") {
        None => None,
        Some(Value::Object(props)) => Some(props),
        Some(_) => return Err(Error::schema(at, "`properties` must be an object")),
    };

    let mut required = Vec::<&str>::new();
    match map.get("required") {
        None => {}
        Some(Value::Array(names)) => {
            for name in names {
                let Some(name) = name.as_str() else {
                    return Err(Error::schema(at, "`required` entries must be strings"));
                };
                if !properties.is_some_and(|p| p.contains_key(name)) {
                    return Err(Error::schema(at, format!("`required` names undeclared property `{name}`")));
                }
                required.push(name);
            }
        }
        Some(_) => return Err(Error::schema(at, "`required` must be an array")),
    }

    let mut fields = IndexMap::new();
    for (name, sub) in properties.into_iter().flatten() {
        let child_at = format!("{at}/properties/{}", escape_pointer(name));
        let child = build_node(sub, &child_at, !required.contains(&name.as_str()))?;
        fields.insert(name.clone(), child);
    }
    Ok(fields)
}

fn build_one_of(
    keyword: &str,
    entries: &[Value],
    at: &str,
    shared: &Constraints,
    optional: bool,
) -> Result<SchemaNode> {
    let mut alternatives = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| build_node(entry, &format!("{at}/{keyword}/{i}"), false))
        .collect::<Result<Vec<_>>>()?;
    check_alternatives(&alternatives, at)?;
    let kinds: Vec<Kind> = alternatives.iter().map(SchemaNode::kind).collect();
    shared.check_union(&kinds, optional, at)?;
    for alt in &mut alternatives {
        let kind = alt.kind();
        let own = std::mem::take(&mut alt.constraints);
        alt.constraints = own.inherit(&shared.restricted_to(kind));
    }
    Ok(one_of(alternatives, optional, at))
}

// One alternative of a union declared on a single node (`type: [..]`, int-or-string).
fn typed_alternative(ty: TypeName, map: &Map<String, Value>, at: &str, shared: &Constraints) -> Result<SchemaNode> {
    build_typed(ty, map, at, shared.restricted_to(ty.kind()), false)
}

fn check_alternatives(alternatives: &[SchemaNode], at: &str) -> Result<()> {
    for (i, alt) in alternatives.iter().enumerate() {
        let kind = alt.kind();
        if !(kind.is_scalar() || kind == Kind::Object) {
            return Err(Error::schema(&alt.origin, format!("a {kind} cannot be a oneOf alternative")));
        }
        if alternatives[..i].iter().any(|prev| prev.kind() == kind) {
            return Err(Error::schema(at, format!("duplicate {kind} alternatives")));
        }
    }
    Ok(())
}

fn one_of(alternatives: Vec<SchemaNode>, optional: bool, at: &str) -> SchemaNode {
    SchemaNode {
        shape: Shape::OneOf(alternatives),
        optional,
        origin: at.to_string(),
        constraints: Constraints::default(),
    }
}

fn declared_types(map: &Map<String, Value>, at: &str) -> Result<Declared> {
    fn parse_name(name: &str, at: &str) -> Result<Option<TypeName>> {
        match name {
            "null" => Ok(None),
            "object" => Ok(Some(TypeName::Object)),
            "array" => Ok(Some(TypeName::Array)),
            other => ScalarKind::from_type_name(other)
                .map(|k| Some(TypeName::Scalar(k)))
                .ok_or_else(|| Error::schema(at, format!("unrecognized type `{other}`"))),
        }
    }

    let mut out = Declared { types: Vec::new(), null: false };
    let names: Vec<&str> = match map.get("type") {
        None => return Ok(out),
        Some(Value::String(name)) => vec![name.as_str()],
        Some(Value::Array(names)) => names
            .iter()
            .map(|n| n.as_str().ok_or_else(|| Error::schema(at, "`type` entries must be strings")))
            .collect::<Result<_>>()?,
        Some(_) => return Err(Error::schema(at, "`type` must be a string or an array of strings")),
    };
    for name in names {
        match parse_name(name, at)? {
            None => out.null = true,
            Some(t) if out.types.contains(&t) => {
                return Err(Error::schema(at, format!("`type` lists `{name}` twice")));
            }
            Some(t) => out.types.push(t),
        }
    }
    if out.types.is_empty() && out.null {
        return Err(Error::schema(at, "a node of type `null` carries no value to validate"));
    }
    Ok(out)
}

fn combinator<'a>(map: &'a Map<String, Value>, at: &str) -> Result<Option<(&'static str, &'a [Value])>> {
    let mut found = None;
    for keyword in ["oneOf", "anyOf"] {
        let Some(entries) = map.get(keyword) else { continue };
        let Value::Array(entries) = entries else {
            return Err(Error::schema(at, format!("`{keyword}` must be an array")));
        };
        if entries.is_empty() {
            return Err(Error::schema(at, format!("`{keyword}` must not be empty")));
        }
        if found.is_some() {
            return Err(Error::schema(at, "both `oneOf` and `anyOf` are declared"));
        }
        found = Some((keyword, entries.as_slice()));
    }
    Ok(found)
}

fn declares_shape(entry: &Value) -> bool {
    const SHAPE_KEYS: [&str; 6] = ["type", "properties", "items", "oneOf", "anyOf", "x-kubernetes-int-or-string"];
    entry.as_object().is_some_and(|m| SHAPE_KEYS.iter().any(|k| m.contains_key(*k)))
}

fn escape_pointer(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}
