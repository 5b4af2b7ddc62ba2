//! Schema-driven validator planning.
//!
//! Turns a configuration schema (Kubernetes `openAPIV3Schema` style) into the
//! ordered rule sets a code generator needs to emit runtime parameter checks:
//!
//! ```text
//! serde_json::Value ─> SchemaNode ─> PathMap ─> Vec<ValidatorUnit>
//!                      (schema)      (path)     (rules)
//! ```
//!
//! ```
//! use schema_checks::{Config, generate, rules::ValidationRule};
//!
//! let schema = serde_json::json!({
//!     "type": "object",
//!     "properties": { "port": { "x-kubernetes-int-or-string": true } }
//! });
//! let units = generate(&schema, &Config::default()).unwrap();
//! assert_eq!(units[0].identifier, "RootPort_FromNumberParameters");
//! assert_eq!(units[1].identifier, "RootPort_FromStringParameters");
//! assert_eq!(units[1].rules, [ValidationRule::NonNull]);
//! ```
pub mod cli;
pub mod config;
pub mod error;
pub mod jq_exec;
pub mod naming;
pub mod path;
pub mod plan;
pub mod rules;
pub mod schema;

pub use config::Config;
pub use error::{Error, Result};
pub use naming::{CaseStyle, NamingConvention};
pub use path::{FieldPath, PathMap, Segment, resolve};
pub use plan::{NamedSchema, Plan, generate, generate_batch};
pub use rules::{DeriveOptions, ValidationRule, ValidatorUnit, derive};
pub use schema::{Kind, ScalarKind, SchemaNode, Shape};
