//! CLI: manifest → (generated module | report), or validate documents against a declaration
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use rayon::prelude::*;

use shape_guard::compile::{Compiler, DEFAULT_MAX_DEPTH};
use shape_guard::descriptor::Descriptor;
use shape_guard::manifest::{DeclarationReport, Manifest};
use shape_guard::printer;
use shape_guard::value::Value;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// compile declared type shapes into runtime validators, or run them against JSON documents
#[derive(Parser, Debug)]
#[command(name = "shape-guard", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// compile every declaration in a manifest and emit a validator module
    Compile(CompileOut),
    /// validate JSON documents against one declaration
    Check(CheckIn),
    /// print the validator expression for a single descriptor file
    Print(PrintOut),
}

#[derive(Args, Debug, Clone)]
struct CompilerSettings {
    /// maximum shape nesting depth
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// importable module with one validation function per declaration
    Module,
    /// JSON report: name, expression and combinators per declaration
    Json,
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /data/items/0/payload)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document.
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct CompileOut {
    /// declaration manifest (.json)
    #[arg(short, long)]
    manifest: PathBuf,

    #[arg(long, value_enum, default_value_t = OutputFormat::Module)]
    format: OutputFormat,

    /// output file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    #[command(flatten)]
    compiler: CompilerSettings,
}

#[derive(clap::Parser, Debug)]
struct CheckIn {
    /// declaration manifest (.json)
    #[arg(short, long)]
    manifest: PathBuf,

    /// name of the declaration to validate against
    #[arg(short, long)]
    declaration: String,

    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    compiler: CompilerSettings,

    /// only print failures
    #[arg(long)]
    quiet: bool,
}

#[derive(clap::Parser, Debug)]
struct PrintOut {
    /// descriptor file (.json)
    #[arg(short, long)]
    shape: PathBuf,

    #[command(flatten)]
    compiler: CompilerSettings,
}

/// One document pulled from the inputs, labelled for reporting.
struct Document {
    label: String,
    value: serde_json::Value,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl CompilerSettings {
    fn compiler(&self) -> Compiler {
        Compiler::with_max_depth(self.max_depth)
    }
}

impl InputSettings {
    fn load_documents(&self) -> Result<Vec<Document>> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .map_err(|e| anyhow::anyhow!("failed to resolve input file paths: {e}"))?;
        let mut out = Vec::new();
        for source_path in source_paths {
            let source_path_str = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file {source_path_str}"))?;
            let raw = if self.ndjson {
                source
                    .lines()
                    .enumerate()
                    .filter(|(_, line)| !line.trim().is_empty())
                    .map(|(i, line)| {
                        let label = format!("{source_path_str}:{}", i + 1);
                        serde_json::from_str::<serde_json::Value>(line)
                            .with_context(|| format!("failed to parse JSON ({label})"))
                            .map(|value| Document { label, value })
                    })
                    .collect::<Result<Vec<_>>>()?
            } else {
                let value = serde_json::from_str::<serde_json::Value>(&source)
                    .with_context(|| format!("failed to parse JSON source file ({source_path_str})"))?;
                vec![Document { label: source_path_str.clone(), value }]
            };
            for doc in raw {
                self.select(doc, &mut out)?;
            }
        }
        tracing::debug!(documents = out.len(), "loaded inputs");
        Ok(out)
    }

    /// Apply `--json-pointer` then `--jq-expr` to one document.
    fn select(&self, doc: Document, out: &mut Vec<Document>) -> Result<()> {
        let Document { label, value } = doc;
        let value = match self.json_pointer.as_deref() {
            None => value,
            Some(ptr) => value
                .pointer(ptr)
                .cloned()
                .with_context(|| format!("JSON pointer {ptr} selects nothing in {label}"))?,
        };
        match self.jq_expr.as_ref() {
            None => out.push(Document { label, value }),
            Some(jq_expr) => {
                let results = shape_guard::jq_exec::run_jaq(jq_expr, &value).with_context(|| {
                    format!("failed to apply jq expression to source file ({label})")
                })?;
                for (i, value) in results.into_iter().enumerate() {
                    out.push(Document { label: format!("{label}#{i}"), value });
                }
            }
        }
        Ok(())
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    /// Returns the process exit code.
    pub fn run(&self) -> Result<i32> {
        match &self.cmd {
            Command::Compile(target) => {
                let manifest = Manifest::load(&target.manifest)?;
                let compiler = target.compiler.compiler();
                let output = match target.format {
                    OutputFormat::Module => manifest.render_module(&compiler)?,
                    OutputFormat::Json => {
                        let reports: Vec<DeclarationReport> = manifest
                            .compile(&compiler)?
                            .iter()
                            .map(|d| d.report())
                            .collect();
                        serde_json::to_string_pretty(&reports)?
                    }
                };
                write_output(target.out.as_deref(), &output)?;
                Ok(0)
            }
            Command::Check(target) => {
                let manifest = Manifest::load(&target.manifest)?;
                let validator = manifest.validator(&target.declaration, &target.compiler.compiler())?;
                let documents = target.input_settings.load_documents()?;
                if documents.is_empty() {
                    bail!("no input documents");
                }

                // the bound predicate is immutable; every worker reads it directly
                let outcomes: Vec<(String, bool)> = documents
                    .into_par_iter()
                    .map(|doc| {
                        let ok = validator.is_valid(&Value::from(doc.value));
                        (doc.label, ok)
                    })
                    .collect();

                let failed = outcomes.iter().filter(|(_, ok)| !ok).count();
                for (label, ok) in &outcomes {
                    if *ok {
                        if !target.quiet {
                            println!("{} {label}", "ok ".green());
                        }
                    } else {
                        println!("{} {label}", "err".red());
                    }
                }
                tracing::info!(
                    declaration = %target.declaration,
                    total = outcomes.len(),
                    failed,
                    "checked documents"
                );
                Ok(if failed == 0 { 0 } else { 1 })
            }
            Command::Print(target) => {
                let source = std::fs::read(&target.shape)
                    .with_context(|| format!("failed to read {}", target.shape.display()))?;
                let shape: Descriptor = shape_guard::path_de::from_slice_with_path(&source)
                    .map_err(|e| anyhow::anyhow!("{}: {e}", target.shape.display()))?;
                let expr = target.compiler.compiler().compile(&shape)?;
                println!("{}", printer::print_expr(&expr));
                Ok(0)
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn write_output(out: Option<&Path>, contents: &str) -> Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(out, contents)
                .with_context(|| format!("failed to write {}", out.display()))?;
            tracing::info!(path = %out.display(), "wrote output");
        }
        None => println!("{contents}"),
    }
    Ok(())
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>, Box<dyn std::error::Error + Send + Sync>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{' ))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            // Treat as a glob pattern
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                match entry {
                    Ok(p) => {
                        matched_any = true;
                        out.push(p);
                    }
                    Err(e) => return Err(Box::new(e)),
                }
            }
            if !matched_any {
                // Pattern was explicitly a glob but matched nothing -> surface as an error
                return Err(format!("glob pattern matched no files: {pattern}").into());
            }
        } else {
            // Treat as a literal path
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
