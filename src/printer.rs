//! Textual rendering of validator expressions.
//!
//! Output targets the runtime combinator module's call syntax, e.g.
//! `validateObject({ s: validateText, "x-y": validateOptional(noop) })`.
//! Keys that are not plain identifiers and all text constants are emitted
//! as escaped string literals.

use std::collections::BTreeSet;
use std::fmt::Write;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::descriptor::Literal;
use crate::error::VALIDATION_FAILED;
use crate::expr::{Combinator, Expr};
use crate::manifest::CompiledDeclaration;

static IDENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("identifier regex is valid")
});

pub fn is_identifier(s: &str) -> bool {
    IDENT.is_match(s)
}

pub fn print_expr(e: &Expr) -> String {
    let mut out = String::new();
    write_expr(&mut out, e);
    out
}

pub fn print_literal(lit: &Literal) -> String {
    match lit {
        Literal::Text(s) => quote(s),
        Literal::Number(n) => print_number(*n),
        Literal::Boolean(b) => b.to_string(),
        Literal::Null => "null".into(),
        Literal::Undefined => "undefined".into(),
    }
}

fn write_expr(out: &mut String, e: &Expr) {
    let name = e.combinator().name();
    match e {
        Expr::Noop | Expr::Text | Expr::Number | Expr::Boolean => out.push_str(name),
        Expr::Const(lit) => {
            let _ = write!(out, "{name}({})", print_literal(lit));
        }
        Expr::Optional(inner) | Expr::Array(inner) => {
            out.push_str(name);
            out.push('(');
            write_expr(out, inner);
            out.push(')');
        }
        Expr::Union(xs) | Expr::Intersection(xs) | Expr::Tuple(xs) => {
            out.push_str(name);
            out.push_str("([");
            for (i, x) in xs.iter().enumerate() {
                if i > 0 { out.push_str(", "); }
                write_expr(out, x);
            }
            out.push_str("])");
        }
        Expr::Object(fields) => {
            out.push_str(name);
            if fields.is_empty() {
                out.push_str("({})");
                return;
            }
            out.push_str("({ ");
            for (i, (key, x)) in fields.iter().enumerate() {
                if i > 0 { out.push_str(", "); }
                if key == "__proto__" {
                    // bare or quoted, this key sets the prototype instead
                    let _ = write!(out, "[{}]", quote(key));
                } else if is_identifier(key) {
                    out.push_str(key);
                } else {
                    out.push_str(&quote(key));
                }
                out.push_str(": ");
                write_expr(out, x);
            }
            out.push_str(" })");
        }
    }
}

fn quote(s: &str) -> String {
    // JSON string syntax is a subset of the target's string literal syntax
    serde_json::Value::from(s).to_string()
}

fn print_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".into()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity".into() } else { "-Infinity".into() }
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

// ————————————————————————————————————————————————————————————————————————————
// MODULE EMISSION
// ————————————————————————————————————————————————————————————————————————————

/// Render an importable module: one import of exactly the combinators the
/// declarations use, then one exported validation function each.
///
/// Binding names are not checked here; [`crate::manifest::Manifest::compile`]
/// rejects declarations whose names collide.
pub fn render_module(decls: &[CompiledDeclaration], runtime_import: &str) -> String {
    let used: BTreeSet<Combinator> = decls
        .iter()
        .flat_map(|d| d.expr.combinators())
        .collect();
    let mut names: Vec<&str> = used.into_iter().map(Combinator::name).collect();
    names.sort_unstable();

    let mut out = String::new();
    out.push_str("// @generated by shape-guard. Do not edit.\n");
    if !names.is_empty() {
        let _ = writeln!(out, "import {{ {} }} from {};", names.join(", "), quote(runtime_import));
    }
    for d in decls {
        let schema = schema_name(&d.name);
        let _ = write!(
            out,
            "\nconst {schema} = {expr};\n\
             export function {function}(value) {{\n\
             \x20 return {schema}(value)\n\
             \x20   ? {{ ok: true, value }}\n\
             \x20   : {{ ok: false, error: new Error({message}) }};\n\
             }}\n",
            expr = print_expr(&d.expr),
            function = function_name(&d.name),
            message = quote(VALIDATION_FAILED),
        );
    }
    out
}

/// Exported validation function for a declaration: `User` -> `validateUser`.
pub fn function_name(declaration: &str) -> String {
    format!("validate{}", upper_first(declaration))
}

/// Module-private schema binding for a declaration: `User` -> `userSchema`.
pub fn schema_name(declaration: &str) -> String {
    format!("{}Schema", lower_first(declaration))
}

fn upper_first(s: &str) -> String {
    let mut cs = s.chars();
    match cs.next() {
        Some(c) => c.to_uppercase().chain(cs).collect(),
        None => String::new(),
    }
}

fn lower_first(s: &str) -> String {
    let mut cs = s.chars();
    match cs.next() {
        Some(c) => c.to_lowercase().chain(cs).collect(),
        None => String::new(),
    }
}
