//! End-to-end planning: schema → model → names → validator units.
use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;

use crate::config::Config;
use crate::error::Result;
use crate::path::{self, PathMap};
use crate::rules::{self, ValidatorUnit};
use crate::schema::SchemaNode;

/// One schema to plan, labelled for error reporting.
#[derive(Clone, Debug)]
pub struct NamedSchema {
    pub source: String,
    /// Overrides `config.naming.root_name` when set.
    pub root_name: Option<String>,
    pub schema: Value,
}

/// Validator units for one schema. Never partial: a failing schema has no plan.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub source: String,
    pub root_name: String,
    pub units: Vec<ValidatorUnit>,
}

/// Build, resolve and derive in one pass.
pub fn generate(raw: &Value, config: &Config) -> Result<Vec<ValidatorUnit>> {
    let root = SchemaNode::build(raw)?;
    let names = path::resolve(&root, &config.naming)?;
    rules::derive(&root, &names, &config.rules)
}

pub fn resolve_names(raw: &Value, config: &Config) -> Result<PathMap> {
    let root = SchemaNode::build(raw)?;
    path::resolve(&root, &config.naming)
}

impl NamedSchema {
    /// The effective config for this schema.
    pub fn config(&self, base: &Config) -> Config {
        match &self.root_name {
            None => base.clone(),
            Some(root_name) => Config {
                naming: base.naming.clone().with_root_name(root_name.clone()),
                rules: base.rules.clone(),
                root_name_declared: true,
            },
        }
    }

    pub fn plan(&self, base: &Config) -> Result<Plan> {
        let config = self.config(base);
        let units = generate(&self.schema, &config)?;
        tracing::debug!(source = %self.source, units = units.len(), "planned schema");
        Ok(Plan {
            source: self.source.clone(),
            root_name: config.naming.root_name,
            units,
        })
    }
}

/// Plan independent schemas in parallel. Results keep input order.
pub fn generate_batch(inputs: &[NamedSchema], config: &Config) -> Vec<Result<Plan>> {
    inputs.par_iter().map(|input| input.plan(config)).collect()
}
