//! Error hierarchy.
//!
//! Two disjoint classes:
//! - build time (`ShapeError`, `CompileError`, `BuildError`) is fatal for the
//!   affected declaration and never downgraded to an always-pass validator;
//! - run time (`ValidationError`) is the ordinary `Err` branch of a
//!   validation result and carries a fixed message.
//!
//! Paths are JSON pointers into the descriptor encoding (`/members/0`,
//! `/fields/2/shape`, ...), empty for the root.

use thiserror::Error;

/// Descriptor decoding failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShapeError {
    /// Unknown `kind`, or a literal that is not a scalar.
    #[error("unsupported shape at `{path}`: {found}")]
    UnsupportedShape { path: String, found: String },

    /// A required member is missing or has the wrong JSON type.
    #[error("malformed shape at `{path}`: {reason}")]
    Malformed { path: String, reason: String },

    #[error("empty union at `{path}`")]
    EmptyUnion { path: String },

    #[error("duplicate field `{name}` at `{path}`")]
    DuplicateField { path: String, name: String },
}

/// Descriptor -> expression compilation failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error(transparent)]
    Shape(#[from] ShapeError),

    /// Nesting exceeded the compiler's depth ceiling.
    #[error("shape nesting exceeds depth limit {limit} at `{path}`")]
    DepthExceeded { limit: usize, path: String },

    #[error("empty union at `{path}`")]
    EmptyUnion { path: String },

    #[error("duplicate field `{name}` at `{path}`")]
    DuplicateField { path: String, name: String },

    /// The declaration site carried no type argument.
    #[error("missing type argument")]
    MissingTypeArgument,
}

/// Manifest-level failure; always names the offending declaration.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("declaration `{name}`: {source}")]
    Declaration {
        name: String,
        #[source]
        source: CompileError,
    },

    #[error("declaration `{name}` is declared more than once")]
    DuplicateDeclaration { name: String },

    /// A generated binding (`validateX` / `xSchema`) would be defined twice
    /// in the rendered module.
    #[error("declaration `{name}` generates `{binding}`, which clashes with {other}")]
    NameCollision { name: String, binding: String, other: String },

    #[error("declaration name `{name}` is not a valid identifier")]
    InvalidName { name: String },

    #[error("no declaration named `{name}`")]
    UnknownDeclaration { name: String },

    #[error("failed to load manifest: {0}")]
    Load(String),
}

/// The message every failed validation carries.
pub const VALIDATION_FAILED: &str = "validation failed";

/// A value did not conform to the compiled shape.
///
/// Deliberately carries no path or sub-shape information.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[error("validation failed")]
pub struct ValidationError;

impl ValidationError {
    pub fn message(&self) -> &'static str {
        VALIDATION_FAILED
    }
}
