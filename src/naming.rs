//! Identifier naming convention.
//!
//! Passed explicitly into the resolver so several runs with different
//! conventions can coexist in one process.
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::schema::Kind;

static NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9]+").expect("static regex"));

/// Placeholder replaced by the alternative's kind name in `alternative_template`.
pub const KIND_PLACEHOLDER: &str = "{kind}";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CaseStyle {
    /// Split on non-alphanumerics and capitalize each word: `httpGet` → `HttpGet`.
    #[default]
    Pascal,
    /// Strip non-alphanumerics and lowercase: `foo_Bar` → `foobar`.
    Lower,
    /// Strip non-alphanumerics only.
    Preserve,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct NamingConvention {
    /// Prefix of every identifier; the name of the root type.
    pub root_name: String,
    pub case: CaseStyle,
    /// Inserted between a union's identifier and an alternative's suffix.
    pub alternative_separator: String,
    /// Alternative suffix; `{kind}` expands to e.g. `Number`.
    pub alternative_template: String,
    /// Segment appended for a sequence's item node.
    pub element_segment: String,
}

impl Default for NamingConvention {
    fn default() -> Self {
        NamingConvention {
            root_name: "Root".to_string(),
            case: CaseStyle::Pascal,
            alternative_separator: "_".to_string(),
            alternative_template: "From{kind}Parameters".to_string(),
            element_segment: "Items".to_string(),
        }
    }
}

impl NamingConvention {
    pub fn with_root_name(mut self, root_name: impl Into<String>) -> Self {
        self.root_name = root_name.into();
        self
    }

    pub fn with_case(mut self, case: CaseStyle) -> Self {
        self.case = case;
        self
    }

    /// Reject conventions that cannot produce valid identifiers.
    pub fn validate(&self) -> Result<()> {
        let root = self.root_identifier();
        if !root.starts_with(|c: char| c.is_ascii_alphabetic()) {
            return Err(Error::Config {
                key: Some("naming.rootName".to_string()),
                message: format!("`{}` does not start an identifier", self.root_name),
            });
        }
        if !self.alternative_template.contains(KIND_PLACEHOLDER) {
            return Err(Error::Config {
                key: Some("naming.alternativeTemplate".to_string()),
                message: format!("must contain `{KIND_PLACEHOLDER}` so alternatives stay distinct"),
            });
        }
        if self.render_key(&self.element_segment).is_empty() {
            return Err(Error::Config {
                key: Some("naming.elementSegment".to_string()),
                message: "must contain at least one alphanumeric character".to_string(),
            });
        }
        Ok(())
    }

    pub fn root_identifier(&self) -> String {
        self.render_key(&self.root_name)
    }

    /// Render one object key as an identifier segment. May return an empty string.
    pub fn render_key(&self, key: &str) -> String {
        match self.case {
            CaseStyle::Pascal => NON_ALNUM
                .split(key)
                .filter(|word| !word.is_empty())
                .map(capitalize)
                .collect(),
            CaseStyle::Lower => NON_ALNUM.replace_all(key, "").to_ascii_lowercase(),
            CaseStyle::Preserve => NON_ALNUM.replace_all(key, "").into_owned(),
        }
    }

    pub fn render_element(&self) -> String {
        self.render_key(&self.element_segment)
    }

    pub fn render_alternative(&self, kind: Kind) -> String {
        format!(
            "{}{}",
            self.alternative_separator,
            self.alternative_template.replace(KIND_PLACEHOLDER, kind.type_name())
        )
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pascal_splits_and_capitalizes() {
        let n = NamingConvention::default();
        assert_eq!(n.render_key("httpGet"), "HttpGet");
        assert_eq!(n.render_key("liveness_probe"), "LivenessProbe");
        assert_eq!(n.render_key("x-kubernetes-id"), "XKubernetesId");
        assert_eq!(n.render_key("__"), "");
    }

    #[test]
    fn lower_strips_and_lowercases() {
        let n = NamingConvention::default().with_case(CaseStyle::Lower);
        assert_eq!(n.render_key("fooBar"), "foobar");
        assert_eq!(n.render_key("foo_bar"), "foobar");
    }

    #[test]
    fn alternative_suffix_uses_template() {
        let n = NamingConvention::default();
        assert_eq!(n.render_alternative(Kind::Number), "_FromNumberParameters");
        assert_eq!(n.render_alternative(Kind::String), "_FromStringParameters");
    }

    #[test]
    fn validation_catches_unusable_conventions() {
        assert!(NamingConvention::default().validate().is_ok());
        assert!(NamingConvention::default().with_root_name("9lives").validate().is_err());
        let mut n = NamingConvention::default();
        n.alternative_template = "Alt".to_string();
        assert!(n.validate().is_err());
    }

    #[test]
    fn deserializes_partial_camel_case() {
        let n: NamingConvention = serde_json::from_str(r#"{ "rootName": "ClusterInstallation", "case": "lower" }"#).unwrap();
        assert_eq!(n.root_name, "ClusterInstallation");
        assert_eq!(n.case, CaseStyle::Lower);
        assert_eq!(n.element_segment, "Items");
        assert!(serde_json::from_str::<NamingConvention>(r#"{ "bogus": 1 }"#).is_err());
    }
}
