//! Runs the JSON conformance fixtures under `fixtures/`.
//!
//! Each fixture file holds a list of cases:
//!
//! ```json
//! [{ "name": "...", "shape": { ... },
//!    "expression": "optional printed form",
//!    "accept": [ ... ], "reject": [ ... ] },
//!  { "name": "...", "shape": { ... }, "compile_error": "substring of the error" }]
//! ```
//!
//! usage: dev-test-runner [FIXTURE_DIR] [--filter REGEX]
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;

use shape_guard::descriptor::Descriptor;
use shape_guard::entry::Validator;
use shape_guard::printer::print_expr;
use shape_guard::Compiler;

#[derive(Debug, Deserialize)]
struct Case {
    name: String,
    /// kept raw: some cases exist to prove decoding fails
    shape: serde_json::Value,
    #[serde(default)]
    expression: Option<String>,
    #[serde(default)]
    accept: Vec<serde_json::Value>,
    #[serde(default)]
    reject: Vec<serde_json::Value>,
    #[serde(default)]
    compile_error: Option<String>,
}

fn main() {
    match run() {
        Ok(0) => {}
        Ok(_) => std::process::exit(1),
        Err(error) => {
            eprintln!("error: {error:#}");
            std::process::exit(2);
        }
    }
}

/// Returns the number of failed cases.
fn run() -> Result<usize> {
    let mut dir = PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures"));
    let mut filter = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--filter" {
            let pattern = args.next().context("--filter needs a pattern")?;
            filter = Some(Regex::new(&pattern).context("invalid --filter pattern")?);
        } else {
            dir = PathBuf::from(arg);
        }
    }

    let mut failures = Vec::new();
    let mut total = 0usize;
    for path in fixture_files(&dir)? {
        let source = std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
        let cases: Vec<Case> = shape_guard::path_de::from_slice_with_path(&source)
            .map_err(|e| anyhow::anyhow!("{}: {e}", path.display()))?;
        for case in cases {
            if filter.as_ref().is_some_and(|rx| !rx.is_match(&case.name)) {
                continue;
            }
            total += 1;
            if let Err(reason) = run_case(&case) {
                failures.push(format!("{} :: {}: {reason}", path.display(), case.name));
            }
        }
    }

    for failure in &failures {
        eprintln!("❌ {failure}");
    }
    eprintln!("{} of {total} cases passed", total - failures.len());
    Ok(failures.len())
}

fn fixture_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut out: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("reading fixture dir {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    out.sort();
    Ok(out)
}

fn run_case(case: &Case) -> Result<(), String> {
    let compiled = Descriptor::from_json(&case.shape)
        .map_err(shape_guard::CompileError::from)
        .and_then(|d| Validator::from_descriptor(&d, &Compiler::default()));

    let validator = match (compiled, &case.compile_error) {
        (Err(err), Some(expected)) => {
            let msg = err.to_string();
            return if msg.contains(expected.as_str()) {
                Ok(())
            } else {
                Err(format!("expected error containing `{expected}`, got `{msg}`"))
            };
        }
        (Err(err), None) => return Err(format!("unexpected compile error: {err}")),
        (Ok(_), Some(expected)) => return Err(format!("expected compile error `{expected}`")),
        (Ok(v), None) => v,
    };

    if let Some(expected) = &case.expression {
        let printed = print_expr(validator.expression());
        if &printed != expected {
            return Err(format!("expression mismatch:\n  expected {expected}\n  printed  {printed}"));
        }
    }
    for (i, input) in case.accept.iter().enumerate() {
        if validator.validate_json(input.clone()).as_ref() != Ok(input) {
            return Err(format!("accept[{i}] was rejected: {input}"));
        }
    }
    for (i, input) in case.reject.iter().enumerate() {
        if validator.validate_json(input.clone()).is_ok() {
            return Err(format!("reject[{i}] was accepted: {input}"));
        }
    }
    Ok(())
}
