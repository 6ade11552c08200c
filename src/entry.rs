//! Validation entry point: compiled predicate -> two-state result.

use crate::combinators::Predicate;
use crate::compile::Compiler;
use crate::descriptor::Descriptor;
use crate::error::{CompileError, ValidationError};
use crate::expr::Expr;
use crate::value::Value;

/// `Ok` hands back the input untouched; `Err` carries the fixed message.
pub type ValidationResult<T = Value> = Result<T, ValidationError>;

/// A compiled, bound validator. Cheap to clone and safe to share.
#[derive(Debug, Clone)]
pub struct Validator {
    name: Option<String>,
    expr: Expr,
    predicate: Predicate,
}

pub fn create_validator(d: &Descriptor) -> Result<Validator, CompileError> {
    Validator::from_descriptor(d, &Compiler::default())
}

impl Validator {
    pub fn from_descriptor(d: &Descriptor, compiler: &Compiler) -> Result<Self, CompileError> {
        Ok(Self::from_expr(compiler.compile(d)?))
    }

    pub fn from_expr(expr: Expr) -> Self {
        let predicate = expr.bind();
        Self { name: None, expr, predicate }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn expression(&self) -> &Expr {
        &self.expr
    }

    pub fn is_valid(&self, v: &Value) -> bool {
        self.predicate.test(v)
    }

    pub fn validate(&self, v: Value) -> ValidationResult {
        if self.predicate.test(&v) { Ok(v) } else { Err(ValidationError) }
    }

    /// Same as [`Validator::validate`], handing back the caller's JSON.
    pub fn validate_json(&self, v: serde_json::Value) -> ValidationResult<serde_json::Value> {
        if self.predicate.test(&Value::from(&v)) { Ok(v) } else { Err(ValidationError) }
    }
}
