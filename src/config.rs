//! Run configuration: naming convention plus rule toggles.
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::naming::NamingConvention;
use crate::rules::DeriveOptions;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub naming: NamingConvention,
    pub rules: DeriveOptions,
    /// Whether the source document set `naming.rootName` itself rather than
    /// leaving it to the default.
    #[serde(skip)]
    pub root_name_declared: bool,
}

impl Config {
    /// Parse a JSON config. Errors name the offending key path.
    pub fn from_json_str(src: &str) -> Result<Self> {
        let raw: serde_json::Value =
            serde_json::from_str(src).map_err(|e| Error::config(format!("not valid JSON: {e}")))?;
        let root_name_declared = raw.pointer("/naming/rootName").is_some();
        let mut config: Config = serde_path_to_error::deserialize(raw).map_err(|err| {
            let key = err.path().to_string();
            Error::Config {
                key: (key != ".").then_some(key),
                message: err.into_inner().to_string(),
            }
        })?;
        config.naming.validate()?;
        config.root_name_declared = root_name_declared;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let src = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_json_str(&src)
    }
}
