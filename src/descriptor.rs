//! Type descriptors: the closed set of structural shapes the compiler accepts.
//!
//! Descriptors arrive already resolved from the host build pipeline, either
//! built directly or decoded from their JSON encoding:
//!
//! ```text
//! {"kind":"literal","value":"a"}     {"kind":"literal"}   (absence marker)
//! {"kind":"primitive","type":"string"|"number"|"boolean"}
//! {"kind":"any"}
//! {"kind":"union","members":[..]}    {"kind":"intersection","members":[..]}
//! {"kind":"tuple","elements":[..]}   {"kind":"array","element":{..}}
//! {"kind":"object","fields":[{"name":"s","shape":{..},"optional":false}]}
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Deserializer};
use serde_json::Value as Json;

use crate::error::ShapeError;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Descriptor {
    Literal(Literal),
    Primitive(PrimitiveKind),
    Any,
    Union(Vec<Descriptor>),         // non-empty
    Intersection(Vec<Descriptor>),
    Tuple(Vec<Descriptor>),         // exact arity, may be empty
    Array(Box<Descriptor>),
    Object(Vec<Field>),             // insertion order, names unique
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub shape: Descriptor,
    pub optional: bool,
}

/// An exact scalar constant.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Text(String),
    Number(f64),
    Boolean(bool),
    Null,
    Undefined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Text,
    Number,
    Boolean,
}

// ————————————————————————————————————————————————————————————————————————————
// CONSTRUCTORS
// ————————————————————————————————————————————————————————————————————————————

impl Descriptor {
    pub fn text() -> Self { Descriptor::Primitive(PrimitiveKind::Text) }
    pub fn number() -> Self { Descriptor::Primitive(PrimitiveKind::Number) }
    pub fn boolean() -> Self { Descriptor::Primitive(PrimitiveKind::Boolean) }
    pub fn literal(lit: impl Into<Literal>) -> Self { Descriptor::Literal(lit.into()) }
    pub fn array(element: Descriptor) -> Self { Descriptor::Array(Box::new(element)) }

    pub fn object<I>(fields: I) -> Self
    where
        I: IntoIterator<Item = Field>,
    {
        Descriptor::Object(fields.into_iter().collect())
    }
}

impl Field {
    pub fn required(name: impl Into<String>, shape: Descriptor) -> Self {
        Field { name: name.into(), shape, optional: false }
    }

    pub fn optional(name: impl Into<String>, shape: Descriptor) -> Self {
        Field { name: name.into(), shape, optional: true }
    }
}

impl Literal {
    /// Strict equality against a runtime value: no coercion, NaN never
    /// matches, absence matches only absence.
    pub fn matches(&self, v: &Value) -> bool {
        match (self, v) {
            (Literal::Text(a), Value::String(b)) => a == b,
            (Literal::Number(a), Value::Number(b)) => a == b,
            (Literal::Boolean(a), Value::Bool(b)) => a == b,
            (Literal::Null, Value::Null) => true,
            (Literal::Undefined, Value::Undefined) => true,
            _ => false,
        }
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self { Literal::Text(s.to_owned()) }
}

impl From<String> for Literal {
    fn from(s: String) -> Self { Literal::Text(s) }
}

impl From<f64> for Literal {
    fn from(n: f64) -> Self { Literal::Number(n) }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self { Literal::Boolean(b) }
}

// ————————————————————————————————————————————————————————————————————————————
// JSON DECODING
// ————————————————————————————————————————————————————————————————————————————

/// One level of the JSON encoding. Children stay raw so the conversion step
/// can track the pointer into the document as it recurses.
#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum RawShape {
    Literal {
        #[serde(default, deserialize_with = "present")]
        value: Option<Json>,
    },
    Primitive {
        #[serde(rename = "type")]
        ty: String,
    },
    Any,
    Union { members: Vec<Json> },
    Intersection { members: Vec<Json> },
    Tuple { elements: Vec<Json> },
    Array { element: Json },
    Object { fields: Vec<RawField> },
    #[serde(other)]
    Unsupported,
}

#[derive(Deserialize)]
struct RawField {
    name: String,
    shape: Json,
    #[serde(default)]
    optional: bool,
}

/// `Some` whenever the key is present, `null` included; the absence marker
/// is the only literal without a `value` key.
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Json>, D::Error> {
    Json::deserialize(deserializer).map(Some)
}

impl Descriptor {
    /// Decode the JSON encoding. Unknown kinds are rejected, never widened.
    pub fn from_json(v: &Json) -> Result<Self, ShapeError> {
        decode(v, &mut String::new())
    }
}

impl<'de> Deserialize<'de> for Descriptor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Json::deserialize(deserializer)?;
        Descriptor::from_json(&raw).map_err(serde::de::Error::custom)
    }
}

fn decode(v: &Json, path: &mut String) -> Result<Descriptor, ShapeError> {
    // integer tags would otherwise select a variant by index
    match v.get("kind") {
        Some(Json::String(_)) => {}
        Some(other) => return Err(malformed(path, format!("`kind` must be a string, found {other}"))),
        None if v.is_object() => return Err(unsupported(path, "missing `kind`".into())),
        None => {}
    }
    let raw = RawShape::deserialize(v).map_err(|e| malformed(path, e.to_string()))?;
    match raw {
        RawShape::Literal { value } => decode_literal(value, path).map(Descriptor::Literal),
        RawShape::Primitive { ty } => match ty.as_str() {
            "string" => Ok(Descriptor::text()),
            "number" => Ok(Descriptor::number()),
            "boolean" => Ok(Descriptor::boolean()),
            other => Err(unsupported(path, format!("primitive type `{other}`"))),
        },
        RawShape::Any => Ok(Descriptor::Any),
        RawShape::Union { members } => {
            if members.is_empty() {
                return Err(ShapeError::EmptyUnion { path: path.clone() });
            }
            decode_list(&members, "members", path).map(Descriptor::Union)
        }
        RawShape::Intersection { members } => {
            decode_list(&members, "members", path).map(Descriptor::Intersection)
        }
        RawShape::Tuple { elements } => decode_list(&elements, "elements", path).map(Descriptor::Tuple),
        RawShape::Array { element } => {
            let element = nested(path, "/element", |p| decode(&element, p))?;
            Ok(Descriptor::Array(Box::new(element)))
        }
        RawShape::Object { fields } => decode_object(fields, path),
        RawShape::Unsupported => {
            let kind = v.get("kind").and_then(Json::as_str).unwrap_or_default();
            Err(unsupported(path, format!("kind `{kind}`")))
        }
    }
}

fn decode_literal(value: Option<Json>, path: &str) -> Result<Literal, ShapeError> {
    match value {
        None => Ok(Literal::Undefined),
        Some(Json::Null) => Ok(Literal::Null),
        Some(Json::Bool(b)) => Ok(Literal::Boolean(b)),
        Some(Json::Number(n)) => Ok(Literal::Number(n.as_f64().unwrap_or(f64::NAN))),
        Some(Json::String(s)) => Ok(Literal::Text(s)),
        Some(Json::Array(_)) => Err(unsupported(&format!("{path}/value"), "array literal".into())),
        Some(Json::Object(_)) => Err(unsupported(&format!("{path}/value"), "object literal".into())),
    }
}

fn decode_list(xs: &[Json], key: &str, path: &mut String) -> Result<Vec<Descriptor>, ShapeError> {
    xs.iter()
        .enumerate()
        .map(|(i, x)| nested(path, &format!("/{key}/{i}"), |p| decode(x, p)))
        .collect()
}

fn decode_object(raw: Vec<RawField>, path: &mut String) -> Result<Descriptor, ShapeError> {
    let mut seen = HashSet::with_capacity(raw.len());
    let mut fields = Vec::with_capacity(raw.len());
    for (i, RawField { name, shape, optional }) in raw.into_iter().enumerate() {
        let shape = nested(path, &format!("/fields/{i}/shape"), |p| decode(&shape, p))?;
        if !seen.insert(name.clone()) {
            return Err(ShapeError::DuplicateField { path: path.clone(), name });
        }
        fields.push(Field { name, shape, optional });
    }
    Ok(Descriptor::Object(fields))
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

/// Run `f` with `segment` pushed onto the pointer, popping it afterwards.
fn nested<T>(
    path: &mut String,
    segment: &str,
    f: impl FnOnce(&mut String) -> Result<T, ShapeError>,
) -> Result<T, ShapeError> {
    let len = path.len();
    path.push_str(segment);
    let out = f(path);
    path.truncate(len);
    out
}

fn malformed(path: &str, reason: String) -> ShapeError {
    ShapeError::Malformed { path: path.to_owned(), reason }
}

fn unsupported(path: &str, found: String) -> ShapeError {
    ShapeError::UnsupportedShape { path: path.to_owned(), found }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_every_kind() {
        let d = Descriptor::from_json(&json!({
            "kind": "object",
            "fields": [
                {"name": "s", "shape": {"kind": "primitive", "type": "string"}},
                {"name": "e", "optional": true, "shape": {"kind": "union", "members": [
                    {"kind": "literal", "value": "a"},
                    {"kind": "literal", "value": "b"}
                ]}},
                {"name": "t", "shape": {"kind": "tuple", "elements": [
                    {"kind": "literal", "value": null},
                    {"kind": "literal"},
                    {"kind": "any"}
                ]}},
                {"name": "a", "shape": {"kind": "array", "element": {"kind": "primitive", "type": "number"}}},
                {"name": "i", "shape": {"kind": "intersection", "members": []}}
            ]
        }))
        .unwrap();

        let expected = Descriptor::object([
            Field::required("s", Descriptor::text()),
            Field::optional("e", Descriptor::Union(vec![
                Descriptor::literal("a"),
                Descriptor::literal("b"),
            ])),
            Field::required("t", Descriptor::Tuple(vec![
                Descriptor::Literal(Literal::Null),
                Descriptor::Literal(Literal::Undefined),
                Descriptor::Any,
            ])),
            Field::required("a", Descriptor::array(Descriptor::number())),
            Field::required("i", Descriptor::Intersection(vec![])),
        ]);
        assert_eq!(d, expected);
    }

    #[test]
    fn unknown_kind_is_unsupported_with_pointer() {
        let err = Descriptor::from_json(&json!({
            "kind": "tuple",
            "elements": [{"kind": "any"}, {"kind": "bigint"}]
        }))
        .unwrap_err();
        assert_eq!(err, ShapeError::UnsupportedShape {
            path: "/elements/1".into(),
            found: "kind `bigint`".into(),
        });
    }

    #[test]
    fn missing_kind_and_structured_literals_are_unsupported() {
        assert!(matches!(
            Descriptor::from_json(&json!({"type": "string"})),
            Err(ShapeError::UnsupportedShape { .. })
        ));
        let err = Descriptor::from_json(&json!({"kind": "literal", "value": [1]})).unwrap_err();
        assert_eq!(err, ShapeError::UnsupportedShape {
            path: "/value".into(),
            found: "array literal".into(),
        });
    }

    #[test]
    fn structural_invariants_are_enforced() {
        let err = Descriptor::from_json(&json!({"kind": "union", "members": []})).unwrap_err();
        assert_eq!(err, ShapeError::EmptyUnion { path: "".into() });

        let err = Descriptor::from_json(&json!({
            "kind": "array",
            "element": {"kind": "object", "fields": [
                {"name": "a", "shape": {"kind": "any"}},
                {"name": "a", "shape": {"kind": "any"}}
            ]}
        }))
        .unwrap_err();
        assert_eq!(err, ShapeError::DuplicateField { path: "/element".into(), name: "a".into() });

        let err = Descriptor::from_json(&json!({
            "kind": "array",
            "element": {"kind": "object", "fields": [{"name": "a"}]}
        }))
        .unwrap_err();
        assert!(
            matches!(&err, ShapeError::Malformed { path, reason } if path == "/element" && reason.contains("shape")),
            "{err:?}"
        );

        let err = Descriptor::from_json(&json!({
            "kind": "object",
            "fields": [{"name": "a", "shape": {"kind": "primitive", "type": "bigint"}}]
        }))
        .unwrap_err();
        assert_eq!(err, ShapeError::UnsupportedShape {
            path: "/fields/0/shape".into(),
            found: "primitive type `bigint`".into(),
        });
    }

    #[test]
    fn ill_typed_members_are_malformed() {
        for bad in [
            json!("string"),
            json!({"kind": "union", "members": {}}),
            json!({"kind": "array"}),
            json!({"kind": "object", "fields": [{"name": "a", "shape": {"kind": "any"}, "optional": "yes"}]}),
            json!({"kind": 7}),
            json!({"kind": 2}),
        ] {
            assert!(
                matches!(Descriptor::from_json(&bad), Err(ShapeError::Malformed { ref path, .. }) if path.is_empty()),
                "{bad}"
            );
        }
    }

    #[test]
    fn null_literal_is_not_the_absence_marker() {
        assert_eq!(
            Descriptor::from_json(&json!({"kind": "literal", "value": null})).unwrap(),
            Descriptor::Literal(Literal::Null)
        );
        assert_eq!(
            Descriptor::from_json(&json!({"kind": "literal", "extra": 1})).unwrap(),
            Descriptor::Literal(Literal::Undefined)
        );
    }

    #[test]
    fn deserializes_through_serde() {
        let d: Descriptor = serde_json::from_value(json!({"kind": "array", "element": {"kind": "any"}})).unwrap();
        assert_eq!(d, Descriptor::array(Descriptor::Any));

        let err = serde_json::from_value::<Descriptor>(json!({"kind": "symbol"})).unwrap_err();
        assert!(err.to_string().contains("unsupported shape"));
    }

    #[test]
    fn literal_matching_is_strict() {
        assert!(Literal::from(3.0).matches(&Value::Number(3.0)));
        assert!(!Literal::from(3.0).matches(&Value::from("3")));
        assert!(!Literal::Number(f64::NAN).matches(&Value::Number(f64::NAN)));
        assert!(!Literal::Null.matches(&Value::Undefined));
        assert!(!Literal::Undefined.matches(&Value::Null));
        assert!(Literal::Undefined.matches(&Value::Undefined));
    }
}
