//! Descriptor -> validator expression.
//!
//! A total, structurally recursive translation over the closed descriptor
//! set. Member, element and field order is carried over unchanged so the
//! generated output is as stable as the descriptor it came from.

use std::collections::HashSet;

use crate::descriptor::{Descriptor, Field, PrimitiveKind};
use crate::error::CompileError;
use crate::expr::Expr;

/// Default nesting ceiling; compiled predicates recurse at most this deep.
pub const DEFAULT_MAX_DEPTH: usize = 128;

#[derive(Debug, Clone, Copy)]
pub struct Compiler {
    max_depth: usize,
}

impl Default for Compiler {
    fn default() -> Self {
        Self { max_depth: DEFAULT_MAX_DEPTH }
    }
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn compile(&self, d: &Descriptor) -> Result<Expr, CompileError> {
        let mut path = String::new();
        let expr = self.lower(d, 1, &mut path)?;
        tracing::trace!(depth = expr.depth(), "compiled shape");
        Ok(expr)
    }

    fn lower(&self, d: &Descriptor, depth: usize, path: &mut String) -> Result<Expr, CompileError> {
        if depth > self.max_depth {
            return Err(CompileError::DepthExceeded { limit: self.max_depth, path: path.clone() });
        }
        let expr = match d {
            Descriptor::Literal(lit) => Expr::Const(lit.clone()),
            Descriptor::Any => Expr::Noop,
            Descriptor::Primitive(PrimitiveKind::Text) => Expr::Text,
            Descriptor::Primitive(PrimitiveKind::Number) => Expr::Number,
            Descriptor::Primitive(PrimitiveKind::Boolean) => Expr::Boolean,
            Descriptor::Union(members) => {
                if members.is_empty() {
                    return Err(CompileError::EmptyUnion { path: path.clone() });
                }
                Expr::Union(self.lower_all(members, "members", depth, path)?)
            }
            Descriptor::Intersection(members) => {
                Expr::Intersection(self.lower_all(members, "members", depth, path)?)
            }
            Descriptor::Tuple(elements) => {
                Expr::Tuple(self.lower_all(elements, "elements", depth, path)?)
            }
            Descriptor::Array(element) => {
                Expr::Array(Box::new(self.nested(element, "/element", depth, path)?))
            }
            Descriptor::Object(fields) => Expr::Object(self.lower_fields(fields, depth, path)?),
        };
        Ok(expr)
    }

    fn lower_all(
        &self,
        ds: &[Descriptor],
        key: &str,
        depth: usize,
        path: &mut String,
    ) -> Result<Vec<Expr>, CompileError> {
        ds.iter()
            .enumerate()
            .map(|(i, d)| self.nested(d, &format!("/{key}/{i}"), depth, path))
            .collect()
    }

    /// Optional fields are wrapped, never dropped from the schema.
    fn lower_fields(
        &self,
        fields: &[Field],
        depth: usize,
        path: &mut String,
    ) -> Result<Vec<(String, Expr)>, CompileError> {
        let mut seen = HashSet::with_capacity(fields.len());
        let mut out = Vec::with_capacity(fields.len());
        for (i, field) in fields.iter().enumerate() {
            if !seen.insert(field.name.as_str()) {
                return Err(CompileError::DuplicateField {
                    path: path.clone(),
                    name: field.name.clone(),
                });
            }
            let inner = self.nested(&field.shape, &format!("/fields/{i}/shape"), depth, path)?;
            let expr = if field.optional { Expr::Optional(Box::new(inner)) } else { inner };
            out.push((field.name.clone(), expr));
        }
        Ok(out)
    }

    fn nested(
        &self,
        d: &Descriptor,
        segment: &str,
        depth: usize,
        path: &mut String,
    ) -> Result<Expr, CompileError> {
        let len = path.len();
        path.push_str(segment);
        let out = self.lower(d, depth + 1, path);
        path.truncate(len);
        out
    }
}

/// Compile with the default depth ceiling.
pub fn compile(d: &Descriptor) -> Result<Expr, CompileError> {
    Compiler::default().compile(d)
}
