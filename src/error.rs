use thiserror::Error;

use crate::path::FieldPath;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or unsupported schema shape. `at` is a JSON pointer into the raw schema.
    #[error("invalid schema at {}: {reason}", display_pointer(.at))]
    Schema { at: String, reason: String },

    /// Two distinct paths render to the same identifier.
    #[error("identifier `{identifier}` is produced by both `{first}` and `{second}`")]
    NameCollision {
        identifier: String,
        first: FieldPath,
        second: FieldPath,
    },

    /// The path map and the schema tree disagree. Always an internal fault.
    #[error(
        "no identifier resolved for `{path}` (schema node {}); path map holds {known} entries, nearest resolved ancestor: {}",
        display_pointer(.origin),
        .nearest.as_ref().map(ToString::to_string).unwrap_or_else(|| "<none>".to_string())
    )]
    UnresolvedPath {
        path: FieldPath,
        origin: String,
        known: usize,
        nearest: Option<FieldPath>,
    },

    /// A field name that renders to an empty identifier segment.
    #[error("field `{name}` at `{path}` has no characters usable in an identifier")]
    InvalidName { path: FieldPath, name: String },

    #[error("invalid configuration{}: {message}", .key.as_ref().map(|k| format!(" at `{k}`")).unwrap_or_default())]
    Config { key: Option<String>, message: String },
}

impl Error {
    pub(crate) fn schema(at: &str, reason: impl Into<String>) -> Self {
        Error::Schema { at: at.to_string(), reason: reason.into() }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Error::Config { key: None, message: message.into() }
    }

    /// Short label used when reporting failures per schema.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Schema { .. } => "schema",
            Error::NameCollision { .. } => "name-collision",
            Error::UnresolvedPath { .. } => "unresolved-path",
            Error::InvalidName { .. } => "invalid-name",
            Error::Config { .. } => "config",
        }
    }
}

fn display_pointer(at: &str) -> String {
    if at.is_empty() { "#".to_string() } else { format!("#{at}") }
}
