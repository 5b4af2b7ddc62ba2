//! Field paths and identifier resolution.
//!
//! Every node of a [`SchemaNode`] tree gets a [`FieldPath`] (its position from the
//! root) and an identifier built from the path's rendered segments. Resolution
//! fails on the first pair of distinct paths that render to the same identifier.
use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};

use crate::error::{Error, Result};
use crate::naming::NamingConvention;
use crate::schema::{Kind, SchemaNode, Shape};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    /// Object field.
    Key(String),
    /// A sequence's item node.
    Element,
    /// One representation of a polymorphic field.
    Alternative(Kind),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath(Vec<Segment>);

impl FieldPath {
    pub fn root() -> Self {
        FieldPath(Vec::new())
    }

    pub fn child(&self, segment: Segment) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment);
        FieldPath(segments)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn parent(&self) -> Option<FieldPath> {
        let (_, init) = self.0.split_last()?;
        Some(FieldPath(init.to_vec()))
    }

    /// The alternative this path selects, if its last segment is one.
    pub fn alternative(&self) -> Option<Kind> {
        match self.0.last() {
            Some(Segment::Alternative(kind)) => Some(*kind),
            _ => None,
        }
    }

    pub fn starts_with(&self, prefix: &FieldPath) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl<S: Into<String>> FromIterator<S> for FieldPath {
    /// Build a path of object keys, e.g. `["spec", "replicas"]`.
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        FieldPath(iter.into_iter().map(|k| Segment::Key(k.into())).collect())
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for segment in &self.0 {
            match segment {
                Segment::Key(key) if is_plain_key(key) => write!(f, ".{key}")?,
                Segment::Key(key) => write!(f, "[{key:?}]")?,
                Segment::Element => f.write_str("[*]")?,
                Segment::Alternative(kind) => write!(f, "<{kind}>")?,
            }
        }
        Ok(())
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

fn is_plain_key(key: &str) -> bool {
    !key.is_empty() && !key.contains(['.', '[', ']', '<', '>', '"'])
}

// ------------------------------- Path map -------------------------------- //

/// `FieldPath → identifier`, in depth-first declaration order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PathMap {
    entries: IndexMap<FieldPath, String>,
}

impl PathMap {
    pub fn get(&self, path: &FieldPath) -> Option<&str> {
        self.entries.get(path).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldPath, &str)> {
        self.entries.iter().map(|(p, i)| (p, i.as_str()))
    }

    /// Drop an entry, keeping the order of the rest.
    pub fn remove(&mut self, path: &FieldPath) -> Option<String> {
        self.entries.shift_remove(path)
    }

    /// Closest proper ancestor of `path` that has an entry.
    pub fn nearest_resolved(&self, path: &FieldPath) -> Option<FieldPath> {
        let mut cursor = path.parent();
        while let Some(candidate) = cursor {
            if self.entries.contains_key(&candidate) {
                return Some(candidate);
            }
            cursor = candidate.parent();
        }
        None
    }
}

// ------------------------------- Resolver -------------------------------- //

/// Assign a canonical identifier to every node reachable from `root`.
pub fn resolve(root: &SchemaNode, naming: &NamingConvention) -> Result<PathMap> {
    naming.validate()?;
    let mut resolver = Resolver {
        naming,
        map: PathMap::default(),
        owners: HashMap::new(),
    };
    resolver.visit(root, FieldPath::root(), naming.root_identifier())?;
    tracing::debug!(root = %naming.root_name, entries = resolver.map.len(), "resolved identifiers");
    Ok(resolver.map)
}

struct Resolver<'a> {
    naming: &'a NamingConvention,
    map: PathMap,
    owners: HashMap<String, FieldPath>,
}

impl Resolver<'_> {
    fn visit(&mut self, node: &SchemaNode, path: FieldPath, identifier: String) -> Result<()> {
        self.claim(&path, &identifier)?;
        match &node.shape {
            Shape::Scalar(_) => {}
            Shape::Object(fields) => {
                for (name, child) in fields {
                    let child_path = path.child(Segment::Key(name.clone()));
                    let rendered = self.naming.render_key(name);
                    if rendered.is_empty() {
                        return Err(Error::InvalidName { path: child_path, name: name.clone() });
                    }
                    self.visit(child, child_path, format!("{identifier}{rendered}"))?;
                }
            }
            Shape::Sequence(item) => {
                let suffix = self.naming.render_element();
                self.visit(item, path.child(Segment::Element), format!("{identifier}{suffix}"))?;
            }
            Shape::OneOf(alternatives) => {
                for alt in alternatives {
                    let kind = alt.kind();
                    let suffix = self.naming.render_alternative(kind);
                    self.visit(alt, path.child(Segment::Alternative(kind)), format!("{identifier}{suffix}"))?;
                }
            }
        }
        Ok(())
    }

    fn claim(&mut self, path: &FieldPath, identifier: &str) -> Result<()> {
        if let Some(first) = self.owners.get(identifier) {
            return Err(Error::NameCollision {
                identifier: identifier.to_string(),
                first: first.clone(),
                second: path.clone(),
            });
        }
        self.owners.insert(identifier.to_string(), path.clone());
        self.map.entries.insert(path.clone(), identifier.to_string());
        Ok(())
    }
}
