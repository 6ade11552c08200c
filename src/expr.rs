//! Validator expressions: the compiler's output.
//!
//! A tree isomorphic to the source descriptor whose nodes name combinators
//! instead of shapes. Pure data until [`Expr::bind`] links it to the
//! runtime library, or the printer renders it as text.

use std::collections::BTreeSet;

use crate::combinators::{self, Predicate};
use crate::descriptor::Literal;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Const(Literal),
    Noop,
    Text,
    Number,
    Boolean,
    Optional(Box<Expr>),
    Union(Vec<Expr>),
    Intersection(Vec<Expr>),
    Tuple(Vec<Expr>),
    Array(Box<Expr>),
    Object(Vec<(String, Expr)>), // descriptor field order
}

/// The fixed combinator vocabulary an embedded expression may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Combinator {
    Const,
    Text,
    Number,
    Boolean,
    Optional,
    Union,
    Intersection,
    Tuple,
    Array,
    Object,
    Noop,
}

impl Combinator {
    pub const ALL: [Combinator; 11] = [
        Combinator::Const,
        Combinator::Text,
        Combinator::Number,
        Combinator::Boolean,
        Combinator::Optional,
        Combinator::Union,
        Combinator::Intersection,
        Combinator::Tuple,
        Combinator::Array,
        Combinator::Object,
        Combinator::Noop,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Combinator::Const => "validateConst",
            Combinator::Text => "validateText",
            Combinator::Number => "validateNumber",
            Combinator::Boolean => "validateBoolean",
            Combinator::Optional => "validateOptional",
            Combinator::Union => "validateUnion",
            Combinator::Intersection => "validateIntersection",
            Combinator::Tuple => "validateTuple",
            Combinator::Array => "validateArray",
            Combinator::Object => "validateObject",
            Combinator::Noop => "noop",
        }
    }
}

impl Expr {
    pub fn combinator(&self) -> Combinator {
        match self {
            Expr::Const(_) => Combinator::Const,
            Expr::Noop => Combinator::Noop,
            Expr::Text => Combinator::Text,
            Expr::Number => Combinator::Number,
            Expr::Boolean => Combinator::Boolean,
            Expr::Optional(_) => Combinator::Optional,
            Expr::Union(_) => Combinator::Union,
            Expr::Intersection(_) => Combinator::Intersection,
            Expr::Tuple(_) => Combinator::Tuple,
            Expr::Array(_) => Combinator::Array,
            Expr::Object(_) => Combinator::Object,
        }
    }

    /// Direct sub-expressions, in order.
    pub fn children(&self) -> Box<dyn Iterator<Item = &Expr> + '_> {
        match self {
            Expr::Const(_) | Expr::Noop | Expr::Text | Expr::Number | Expr::Boolean => {
                Box::new(std::iter::empty())
            }
            Expr::Optional(inner) | Expr::Array(inner) => Box::new(std::iter::once(&**inner)),
            Expr::Union(xs) | Expr::Intersection(xs) | Expr::Tuple(xs) => Box::new(xs.iter()),
            Expr::Object(fields) => Box::new(fields.iter().map(|(_, e)| e)),
        }
    }

    /// Every combinator this expression references.
    pub fn combinators(&self) -> BTreeSet<Combinator> {
        let mut out = BTreeSet::new();
        let mut stack = vec![self];
        while let Some(e) = stack.pop() {
            out.insert(e.combinator());
            stack.extend(e.children());
        }
        out
    }

    pub fn depth(&self) -> usize {
        1 + self.children().map(Expr::depth).max().unwrap_or(0)
    }

    /// Link the tree to the runtime combinator library.
    pub fn bind(&self) -> Predicate {
        match self {
            Expr::Const(lit) => combinators::validate_const(lit.clone()),
            Expr::Noop => Predicate::new(combinators::noop),
            Expr::Text => Predicate::new(combinators::validate_text),
            Expr::Number => Predicate::new(combinators::validate_number),
            Expr::Boolean => Predicate::new(combinators::validate_boolean),
            Expr::Optional(inner) => combinators::validate_optional(inner.bind()),
            Expr::Union(xs) => combinators::validate_union(xs.iter().map(Expr::bind).collect()),
            Expr::Intersection(xs) => {
                combinators::validate_intersection(xs.iter().map(Expr::bind).collect())
            }
            Expr::Tuple(xs) => combinators::validate_tuple(xs.iter().map(Expr::bind).collect()),
            Expr::Array(inner) => combinators::validate_array(inner.bind()),
            Expr::Object(fields) => combinators::validate_object(
                fields.iter().map(|(name, e)| (name.clone(), e.bind())).collect()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use serde_json::json;

    fn sample() -> Expr {
        Expr::Object(vec![
            ("s".into(), Expr::Text),
            ("e".into(), Expr::Optional(Box::new(Expr::Union(vec![
                Expr::Const(Literal::from("a")),
                Expr::Const(Literal::from("b")),
            ])))),
            ("a".into(), Expr::Array(Box::new(Expr::Union(vec![Expr::Text, Expr::Number])))),
        ])
    }

    #[test]
    fn combinators_are_collected_without_duplicates() {
        let used = sample().combinators();
        assert_eq!(used.into_iter().map(Combinator::name).collect::<Vec<_>>(), vec![
            "validateConst",
            "validateText",
            "validateNumber",
            "validateOptional",
            "validateUnion",
            "validateArray",
            "validateObject",
        ]);
        assert_eq!(Expr::Noop.combinators().len(), 1);
    }

    #[test]
    fn all_names_are_distinct() {
        let names: BTreeSet<_> = Combinator::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(names.len(), Combinator::ALL.len());
    }

    #[test]
    fn depth_counts_nodes_on_longest_path() {
        assert_eq!(Expr::Text.depth(), 1);
        assert_eq!(sample().depth(), 4);
    }

    #[test]
    fn bound_expression_validates() {
        let p = sample().bind();
        assert!(p.test(&Value::from(json!({"s": "x", "a": ["a", 1]}))));
        assert!(p.test(&Value::from(json!({"s": "x", "e": "b", "a": []}))));
        assert!(!p.test(&Value::from(json!({"s": "x", "e": "c", "a": []}))));
        assert!(!p.test(&Value::from(json!({"s": "x", "a": [true]}))));
    }
}
