//! Declaration manifests: the hand-off from the host build pipeline.
//!
//! The pipeline finds validator-initialization sites, resolves each one's
//! type argument to a descriptor and writes them here:
//!
//! ```json
//! { "runtime": "shape-guard/runtime",
//!   "declarations": [ { "name": "User", "shape": { "kind": "object", "fields": [] } } ] }
//! ```
//!
//! A declaration whose site had no type argument omits `shape`; compiling it
//! fails the build.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::compile::Compiler;
use crate::descriptor::Descriptor;
use crate::entry::Validator;
use crate::error::{BuildError, CompileError};
use crate::expr::{Combinator, Expr};
use crate::printer;

pub const DEFAULT_RUNTIME_IMPORT: &str = "shape-guard/runtime";

#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    #[serde(default = "default_runtime")]
    pub runtime: String,
    pub declarations: Vec<Declaration>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Declaration {
    pub name: String,
    #[serde(default)]
    pub shape: Option<Descriptor>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledDeclaration {
    pub name: String,
    pub expr: Expr,
}

/// Machine-readable summary of one compiled declaration.
#[derive(Debug, Clone, Serialize)]
pub struct DeclarationReport {
    pub name: String,
    pub expression: String,
    pub combinators: Vec<&'static str>,
}

fn default_runtime() -> String {
    DEFAULT_RUNTIME_IMPORT.to_string()
}

impl Manifest {
    pub fn from_json_str(src: &str) -> Result<Self, BuildError> {
        crate::path_de::from_str_with_path(src).map_err(BuildError::Load)
    }

    pub fn load(path: &Path) -> Result<Self, BuildError> {
        let bytes = std::fs::read(path)
            .map_err(|e| BuildError::Load(format!("{}: {e}", path.display())))?;
        crate::path_de::from_slice_with_path(&bytes)
            .map_err(|e| BuildError::Load(format!("{}: {e}", path.display())))
    }

    /// Compile every declaration in order. The first failure aborts the
    /// whole build and names its declaration.
    ///
    /// Every declaration contributes two module-level bindings; neither may
    /// shadow a runtime import or another declaration's binding.
    pub fn compile(&self, compiler: &Compiler) -> Result<Vec<CompiledDeclaration>, BuildError> {
        let mut seen = HashSet::with_capacity(self.declarations.len());
        let mut bindings: HashMap<String, String> = Combinator::ALL
            .iter()
            .map(|c| (c.name().to_string(), "the runtime import".to_string()))
            .collect();
        let mut out = Vec::with_capacity(self.declarations.len());
        for decl in &self.declarations {
            if !seen.insert(decl.name.as_str()) {
                return Err(BuildError::DuplicateDeclaration { name: decl.name.clone() });
            }
            let compiled = decl.compile(compiler)?;
            for binding in [printer::function_name(&decl.name), printer::schema_name(&decl.name)] {
                if let Some(owner) = bindings.get(&binding) {
                    return Err(BuildError::NameCollision {
                        name: decl.name.clone(),
                        other: owner.clone(),
                        binding,
                    });
                }
                bindings.insert(binding, format!("declaration `{}`", decl.name));
            }
            out.push(compiled);
        }
        tracing::info!(declarations = out.len(), "compiled manifest");
        Ok(out)
    }

    pub fn declaration(&self, name: &str) -> Result<&Declaration, BuildError> {
        self.declarations
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| BuildError::UnknownDeclaration { name: name.to_string() })
    }

    /// Compile one declaration into a ready-to-run validator.
    pub fn validator(&self, name: &str, compiler: &Compiler) -> Result<Validator, BuildError> {
        let decl = self.declaration(name)?;
        let compiled = decl.compile(compiler)?;
        Ok(Validator::from_expr(compiled.expr).named(compiled.name))
    }

    pub fn render_module(&self, compiler: &Compiler) -> Result<String, BuildError> {
        let compiled = self.compile(compiler)?;
        Ok(printer::render_module(&compiled, &self.runtime))
    }
}

impl Declaration {
    pub fn compile(&self, compiler: &Compiler) -> Result<CompiledDeclaration, BuildError> {
        if !printer::is_identifier(&self.name) {
            return Err(BuildError::InvalidName { name: self.name.clone() });
        }
        let fail = |source: CompileError| BuildError::Declaration { name: self.name.clone(), source };
        let shape = self.shape.as_ref().ok_or_else(|| fail(CompileError::MissingTypeArgument))?;
        let expr = compiler.compile(shape).map_err(fail)?;
        tracing::debug!(declaration = %self.name, depth = expr.depth(), "compiled declaration");
        Ok(CompiledDeclaration { name: self.name.clone(), expr })
    }
}

impl CompiledDeclaration {
    pub fn report(&self) -> DeclarationReport {
        DeclarationReport {
            name: self.name.clone(),
            expression: printer::print_expr(&self.expr),
            combinators: self.expr.combinators().into_iter().map(|c| c.name()).collect(),
        }
    }
}
