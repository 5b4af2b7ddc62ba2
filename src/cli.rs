//! Minimal CLI: load schemas → (names | plan)
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;

use crate::config::Config;
use crate::naming::{CaseStyle, NamingConvention};
use crate::plan::{self, NamedSchema};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// derive validator identifiers and rule sets from configuration schemas
#[derive(Parser, Debug)]
#[command(name = "schema-checks", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// print the field-path → identifier table of each schema
    Names(NamesOut),
    /// print the ordered validator units of each schema as JSON
    Plan(PlanOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// JSON Pointer to select the schema in each document (e.g. /spec/versions/0/schema/openAPIV3Schema)
    #[arg(long)]
    json_pointer: Option<String>,

    /// jq filter applied to each document; every output is planned as its own schema
    #[arg(long)]
    jq_expr: Option<String>,

    /// one or more inputs: literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(Args, Debug, Clone)]
struct NamingSettings {
    /// JSON config file (`naming` and `rules` sections)
    #[arg(long)]
    config: Option<PathBuf>,

    /// root type name; defaults to the input file stem
    #[arg(long)]
    root_name: Option<String>,

    /// identifier case style
    #[arg(long, value_enum)]
    case: Option<CaseArg>,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy)]
enum CaseArg {
    Pascal,
    Lower,
    Preserve,
}

#[derive(clap::Parser, Debug)]
struct NamesOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    naming: NamingSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct PlanOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    naming: NamingSettings,

    /// also emit type-match units for every object and sequence
    #[arg(long, default_value_t = false)]
    shape_checks: bool,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NamesReport<'a> {
    source: &'a str,
    names: crate::path::PathMap,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load(&self, root_name: Option<&str>) -> Result<Vec<NamedSchema>> {
        let source_paths = resolve_file_path_patterns(&self.input)?;
        let mut out = Vec::new();
        for source_path in source_paths {
            let label = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file {label}"))?;
            let document: serde_json::Value = serde_json::from_str(&source)
                .with_context(|| format!("failed to parse JSON source file ({label})"))?;
            let document = match self.json_pointer.as_deref() {
                None => document,
                Some(pointer) => match document.pointer(pointer) {
                    Some(node) => node.clone(),
                    None => bail!("JSON pointer {pointer} selects nothing in {label}"),
                },
            };
            let documents = match self.jq_expr.as_deref() {
                None => vec![document],
                Some(jq_expr) => crate::jq_exec::run_filter(jq_expr, &document)
                    .with_context(|| format!("failed to apply jq expression to {label}"))?,
            };
            let root_name = root_name
                .map(str::to_string)
                .or_else(|| file_stem(&source_path));
            let many = documents.len() > 1;
            for (index, schema) in documents.into_iter().enumerate() {
                let source = if many { format!("{label}#{index}") } else { label.clone() };
                out.push(NamedSchema { source, root_name: root_name.clone(), schema });
            }
        }
        Ok(out)
    }
}

impl NamingSettings {
    fn config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_path(path)?,
            None => Config::default(),
        };
        if let Some(case) = self.case {
            config.naming.case = match case {
                CaseArg::Pascal => CaseStyle::Pascal,
                CaseArg::Lower => CaseStyle::Lower,
                CaseArg::Preserve => CaseStyle::Preserve,
            };
        }
        Ok(config)
    }

    // An explicit flag wins; then a root name the config file sets; then the file stem.
    fn root_name_override(&self, config: &Config) -> Option<String> {
        match &self.root_name {
            Some(name) => Some(name.clone()),
            None if config.root_name_declared => Some(config.naming.root_name.clone()),
            None => None,
        }
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Names(target) => {
                let config = target.naming.config()?;
                let override_name = target.naming.root_name_override(&config);
                let inputs = target.input_settings.load(override_name.as_deref())?;
                let mut reports = Vec::new();
                let mut failed = 0usize;
                for input in &inputs {
                    match plan::resolve_names(&input.schema, &input.config(&config)) {
                        Ok(names) => reports.push(NamesReport { source: &input.source, names }),
                        Err(error) => {
                            failed += 1;
                            report_failure(&input.source, &error);
                        }
                    }
                }
                write_output(target.out.as_deref(), &reports)?;
                finish(failed, inputs.len())
            }
            Command::Plan(target) => {
                let mut config = target.naming.config()?;
                config.rules.shape_checks |= target.shape_checks;
                let override_name = target.naming.root_name_override(&config);
                let inputs = target.input_settings.load(override_name.as_deref())?;

                let mut plans = Vec::new();
                let mut failed = 0usize;
                for (input, result) in inputs.iter().zip(plan::generate_batch(&inputs, &config)) {
                    match result {
                        Ok(plan) => plans.push(plan),
                        Err(error) => {
                            failed += 1;
                            report_failure(&input.source, &error);
                        }
                    }
                }
                write_output(target.out.as_deref(), &plans)?;
                finish(failed, inputs.len())
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn report_failure(source: &str, error: &crate::Error) {
    tracing::debug!(source, kind = error.kind(), "schema rejected");
    eprintln!("{} {}: {error}", format!("error[{}]", error.kind()).red().bold(), source.bold());
}

fn finish(failed: usize, total: usize) -> Result<()> {
    if failed > 0 {
        bail!("{failed} of {total} schema(s) failed; no output was produced for them");
    }
    Ok(())
}

fn write_output<T: Serialize>(out: Option<&Path>, value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value)?;
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(out, &rendered).with_context(|| format!("failed to write {}", out.display()))?;
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

fn file_stem(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_string_lossy();
    let stem = stem.split('.').next().unwrap_or_default();
    let name = NamingConvention::default().render_key(stem);
    name.starts_with(|c: char| c.is_ascii_alphabetic()).then_some(name)
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();
    for raw in patterns {
        let pattern = raw.as_ref();
        if has_glob_chars(pattern) {
            let before = out.len();
            for entry in glob::glob(pattern)? {
                out.push(entry?);
            }
            if out.len() == before {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_stems_become_root_names() {
        assert_eq!(file_stem(Path::new("schemas/cluster-installation.schema.json")).as_deref(), Some("ClusterInstallation"));
        assert_eq!(file_stem(Path::new("42.json")), None);
    }

    #[test]
    fn cli_parses_plan_flags() {
        let cli = CommandLineInterface::try_parse_from([
            "schema-checks", "plan", "-i", "a.json", "b.json", "--root-name", "Probe", "--shape-checks", "--case", "lower",
        ])
        .unwrap();
        let Command::Plan(plan) = cli.cmd else { panic!("expected plan") };
        assert_eq!(plan.input_settings.input, ["a.json", "b.json"]);
        assert!(plan.shape_checks);
        let config = plan.naming.config().unwrap();
        assert_eq!(config.naming.case, CaseStyle::Lower);
        assert_eq!(plan.naming.root_name_override(&config).as_deref(), Some("Probe"));
    }

    #[test]
    fn config_without_root_name_keeps_file_stem() {
        let cli = CommandLineInterface::try_parse_from(["schema-checks", "names", "-i", "mattermost.json"]).unwrap();
        let Command::Names(names) = cli.cmd else { panic!("expected names") };

        let silent = Config::from_json_str(r#"{ "naming": { "case": "lower" } }"#).unwrap();
        assert_eq!(names.naming.root_name_override(&silent), None);

        let declared = Config::from_json_str(r#"{ "naming": { "rootName": "Mattermost" } }"#).unwrap();
        assert_eq!(names.naming.root_name_override(&declared).as_deref(), Some("Mattermost"));
    }
}
