//! Runs every `fixtures/*.json` case through the planner and compares the
//! resulting identifiers, rule lists or error kind with the expectation in
//! the fixture.
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use colored::Colorize;
use schema_checks::{Config, NamedSchema};
use serde::Deserialize;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct Fixture {
    description: String,
    root_name: String,
    #[serde(default)]
    config: Config,
    schema: serde_json::Value,
    expect: Expect,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
enum Expect {
    /// identifiers of the derived units, in order
    Identifiers(Vec<String>),
    /// identifiers plus the serialized rule list of every unit, in order
    Units(Vec<ExpectedUnit>),
    /// `Error::kind()` of the expected failure
    Error(String),
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct ExpectedUnit {
    identifier: String,
    rules: serde_json::Value,
}

fn load(path: &Path) -> Result<Fixture, String> {
    let src = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    let de = &mut serde_json::Deserializer::from_str(&src);
    serde_path_to_error::deserialize(de).map_err(|err| {
        let at = err.path().to_string();
        format!("at JSON path {at} → {}", err.into_inner())
    })
}

fn check(fixture: &Fixture) -> Result<(), String> {
    let input = NamedSchema {
        source: fixture.description.clone(),
        root_name: Some(fixture.root_name.clone()),
        schema: fixture.schema.clone(),
    };
    match (input.plan(&fixture.config), &fixture.expect) {
        (Ok(plan), Expect::Identifiers(expected)) => {
            let got: Vec<&str> = plan.units.iter().map(|u| u.identifier.as_str()).collect();
            if got == *expected {
                Ok(())
            } else {
                Err(format!("expected {expected:?}, got {got:?}"))
            }
        }
        (Ok(plan), Expect::Units(expected)) => {
            if plan.units.len() != expected.len() {
                return Err(format!("expected {} unit(s), got {}", expected.len(), plan.units.len()));
            }
            for (unit, want) in plan.units.iter().zip(expected) {
                if unit.identifier != want.identifier {
                    return Err(format!("expected {}, got {}", want.identifier, unit.identifier));
                }
                let rules = serde_json::to_value(&unit.rules).map_err(|e| e.to_string())?;
                if rules != want.rules {
                    return Err(format!("{}: expected rules {}, got {rules}", unit.identifier, want.rules));
                }
            }
            Ok(())
        }
        (Err(error), Expect::Error(kind)) if error.kind() == kind.as_str() => Ok(()),
        (Err(error), _) => Err(format!("unexpected error: {error}")),
        (Ok(plan), Expect::Error(kind)) => Err(format!("expected {kind} error, got {} unit(s)", plan.units.len())),
    }
}

fn fixture_paths(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();
    Ok(paths)
}

fn main() -> ExitCode {
    let dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| Path::new(env!("CARGO_MANIFEST_DIR")).join("../fixtures"));
    let paths = match fixture_paths(&dir) {
        Ok(paths) => paths,
        Err(error) => {
            eprintln!("cannot list {}: {error}", dir.display());
            return ExitCode::FAILURE;
        }
    };

    let mut failures = 0;
    for path in &paths {
        let name = path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
        match load(path).and_then(|fixture| check(&fixture)) {
            Ok(()) => eprintln!("{} {name}", "✅".green()),
            Err(reason) => {
                failures += 1;
                eprintln!("{} {name}: {reason}", "❌".red());
            }
        }
    }
    eprintln!("{} fixture(s), {failures} failed", paths.len());
    if failures == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}
