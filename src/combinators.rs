//! Runtime combinator library.
//!
//! Every combinator is a pure, total predicate over [`Value`], or builds one
//! from sub-predicates. Nothing here allocates per call or panics; the
//! compiled graph is immutable and shared freely across threads.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::descriptor::Literal;
use crate::value::{Value, UNDEFINED};

/// A bound, executable validation predicate.
#[derive(Clone)]
pub struct Predicate(Arc<dyn Fn(&Value) -> bool + Send + Sync>);

impl Predicate {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Predicate(Arc::new(f))
    }

    #[inline]
    pub fn test(&self, v: &Value) -> bool {
        (self.0)(v)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(..)")
    }
}

// ————————————————————————————————————————————————————————————————————————————
// LEAVES
// ————————————————————————————————————————————————————————————————————————————

pub fn validate_text(v: &Value) -> bool {
    matches!(v, Value::String(_))
}

/// NaN and infinities count: kind check only.
pub fn validate_number(v: &Value) -> bool {
    matches!(v, Value::Number(_))
}

pub fn validate_boolean(v: &Value) -> bool {
    matches!(v, Value::Bool(_))
}

pub fn noop(_: &Value) -> bool {
    true
}

pub fn validate_const(expected: Literal) -> Predicate {
    Predicate::new(move |v| expected.matches(v))
}

// ————————————————————————————————————————————————————————————————————————————
// COMBINATORS
// ————————————————————————————————————————————————————————————————————————————

pub fn validate_optional(inner: Predicate) -> Predicate {
    Predicate::new(move |v| v.is_undefined() || inner.test(v))
}

pub fn validate_union(members: Vec<Predicate>) -> Predicate {
    Predicate::new(move |v| members.iter().any(|p| p.test(v)))
}

pub fn validate_intersection(members: Vec<Predicate>) -> Predicate {
    Predicate::new(move |v| members.iter().all(|p| p.test(v)))
}

pub fn validate_tuple(members: Vec<Predicate>) -> Predicate {
    Predicate::new(move |v| match v {
        Value::Array(xs) => {
            xs.len() == members.len()
                && members.iter().zip(xs).all(|(p, x)| p.test(x))
        }
        _ => false,
    })
}

pub fn validate_array(element: Predicate) -> Predicate {
    Predicate::new(move |v| match v {
        Value::Array(xs) => xs.iter().all(|x| element.test(x)),
        _ => false,
    })
}

/// Closed objects: unknown keys are rejected, missing keys are checked as
/// the absence marker.
pub fn validate_object(schema: IndexMap<String, Predicate>) -> Predicate {
    Predicate::new(move |v| match v {
        Value::Object(map) => {
            map.keys().all(|k| schema.contains_key(k))
                && schema.iter().all(|(k, p)| p.test(map.get(k).unwrap_or(&UNDEFINED)))
        }
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text() -> Predicate { Predicate::new(validate_text) }
    fn number() -> Predicate { Predicate::new(validate_number) }
    fn boolean() -> Predicate { Predicate::new(validate_boolean) }
    fn any() -> Predicate { Predicate::new(noop) }
    fn lit(l: impl Into<Literal>) -> Predicate { validate_const(l.into()) }
    fn v(j: serde_json::Value) -> Value { Value::from(j) }

    fn object<const N: usize>(entries: [(&str, Predicate); N]) -> Predicate {
        validate_object(entries.into_iter().map(|(k, p)| (k.to_string(), p)).collect())
    }

    #[test]
    fn numbers() {
        for n in [1.0, -1.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(validate_number(&Value::Number(n)), "{n}");
        }
        for x in [v(json!("1")), v(json!("a")), v(json!(true)), v(json!(false)), Value::Null, Value::Undefined] {
            assert!(!validate_number(&x), "{x:?}");
        }
    }

    #[test]
    fn texts() {
        assert!(validate_text(&v(json!("a"))));
        assert!(validate_text(&v(json!(""))));
        for x in [v(json!(1)), v(json!(true)), v(json!(false)), Value::Null, Value::Undefined] {
            assert!(!validate_text(&x), "{x:?}");
        }
    }

    #[test]
    fn booleans() {
        assert!(validate_boolean(&v(json!(true))));
        assert!(validate_boolean(&v(json!(false))));
        assert!(!validate_boolean(&v(json!("true"))));
        assert!(!validate_boolean(&Value::Null));
        assert!(!validate_boolean(&v(json!(1))));
    }

    #[test]
    fn consts_are_strict() {
        assert!(lit("a").test(&v(json!("a"))));
        assert!(lit(3.0).test(&v(json!(3))));
        assert!(lit(true).test(&v(json!(true))));
        assert!(validate_const(Literal::Null).test(&Value::Null));
        assert!(validate_const(Literal::Undefined).test(&Value::Undefined));

        assert!(!lit(3.0).test(&v(json!(2))));
        assert!(!lit(3.0).test(&v(json!("3"))));
        assert!(!lit(true).test(&v(json!(false))));
        assert!(!lit(true).test(&v(json!("true"))));
        assert!(!validate_const(Literal::Null).test(&Value::Undefined));
        assert!(!validate_const(Literal::Null).test(&v(json!("null"))));
        assert!(!validate_const(Literal::Undefined).test(&v(json!("undefined"))));
        for x in [Value::Null, v(json!(1)), v(json!("")), v(json!(true)), v(json!(false))] {
            assert!(!validate_const(Literal::Undefined).test(&x), "{x:?}");
        }
    }

    #[test]
    fn optional_accepts_absence_then_delegates() {
        let p = validate_optional(text());
        assert!(p.test(&Value::Undefined));
        assert!(p.test(&v(json!("x"))));
        assert!(!p.test(&Value::Null));
        assert!(!p.test(&v(json!(1))));

        // absence passes even when the inner predicate never would
        let never = validate_union(vec![]);
        assert!(validate_optional(never).test(&Value::Undefined));
    }

    #[test]
    fn unions() {
        let ab = validate_union(vec![lit("a"), lit("b")]);
        assert!(ab.test(&v(json!("a"))));
        assert!(ab.test(&v(json!("b"))));
        for x in [v(json!(3)), v(json!("c")), Value::Null] {
            assert!(!ab.test(&x));
        }

        let sn = validate_union(vec![text(), number()]);
        assert!(sn.test(&v(json!("3"))));
        assert!(sn.test(&v(json!(3))));
        for x in [v(json!(true)), Value::Null, Value::Undefined] {
            assert!(!sn.test(&x));
        }

        assert!(!validate_union(vec![]).test(&Value::Null));
    }

    #[test]
    fn union_stops_at_first_accepting_member() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let calls = Arc::new(AtomicUsize::new(0));
        let counted = {
            let calls = Arc::clone(&calls);
            Predicate::new(move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                true
            })
        };
        let union = validate_union(vec![text(), counted]);

        assert!(union.test(&v(json!("a"))));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(union.test(&v(json!(1))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn intersections() {
        assert!(validate_intersection(vec![]).test(&Value::Undefined));
        let branded = validate_intersection(vec![
            object([("a", text())]),
            validate_union(vec![object([("a", lit("x"))]), object([("a", lit("y"))])]),
        ]);
        assert!(branded.test(&v(json!({"a": "x"}))));
        assert!(!branded.test(&v(json!({"a": "z"}))));
        assert!(!validate_intersection(vec![text(), number()]).test(&v(json!("1"))));
    }

    #[test]
    fn tuples_require_exact_length() {
        assert!(validate_tuple(vec![lit("a"), lit("b")]).test(&v(json!(["a", "b"]))));
        let mixed = validate_tuple(vec![
            text(),
            number(),
            lit(true),
            validate_union(vec![text(), number()]),
        ]);
        assert!(mixed.test(&v(json!(["3", 3, true, "3"]))));
        assert!(validate_tuple(vec![]).test(&v(json!([]))));

        assert!(!validate_tuple(vec![boolean()]).test(&v(json!(["true"]))));
        assert!(!validate_tuple(vec![]).test(&v(json!(["x"]))));
        assert!(!validate_tuple(vec![any()]).test(&v(json!([]))));
        assert!(!validate_tuple(vec![any()]).test(&v(json!([1, 2]))));
        assert!(!validate_tuple(vec![]).test(&v(json!({}))));
    }

    #[test]
    fn arrays() {
        assert!(validate_array(text()).test(&v(json!(["a", "b", "c"]))));
        assert!(validate_array(number()).test(&v(json!([1, 2, 3]))));
        assert!(validate_array(number()).test(&v(json!([]))));
        assert!(validate_array(validate_union(vec![text(), number()])).test(&v(json!(["a", 1, 3]))));

        assert!(!validate_array(text()).test(&v(json!([1, 2, 3]))));
        assert!(!validate_array(number()).test(&v(json!(["1", "2"]))));
        assert!(!validate_array(boolean()).test(&Value::Array(vec![v(json!("true")), Value::Undefined])));
        assert!(!validate_array(any()).test(&v(json!("[]"))));
    }

    #[test]
    fn objects_accept() {
        assert!(object([("a", text()), ("b", number())]).test(&v(json!({"a": "a", "b": 1}))));
        assert!(object([("a", validate_optional(text())), ("b", number())]).test(&v(json!({"b": 1}))));
        let nested = object([
            ("a", object([
                ("aa", text()),
                ("bb", boolean()),
                ("cc", validate_tuple(vec![text(), number(), lit(3.0)])),
            ])),
            ("b", number()),
        ]);
        assert!(nested.test(&v(json!({"a": {"aa": "2", "bb": false, "cc": ["1", 2, 3]}, "b": 1}))));
        assert!(object([]).test(&v(json!({}))));
    }

    #[test]
    fn objects_reject() {
        assert!(!object([("a", text()), ("b", number())]).test(&v(json!({"a": 2, "b": "1"}))));
        assert!(!object([("a", validate_optional(text())), ("b", number())]).test(&v(json!({}))));
        // extra key, even though every declared key is satisfied
        assert!(!object([("a", validate_optional(text()))]).test(&v(json!({"a": "a", "b": 1}))));
        assert!(!object([]).test(&v(json!({"a": 1}))));
        assert!(!object([]).test(&Value::Null));
        assert!(!object([]).test(&v(json!([]))));
    }

    #[test]
    fn explicit_undefined_field_counts_as_absent() {
        let p = object([("a", validate_optional(text()))]);
        let mut map = IndexMap::new();
        map.insert("a".to_string(), Value::Undefined);
        assert!(p.test(&Value::Object(map)));
    }
}
