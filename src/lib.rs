//! Compile declared structural type shapes into runtime validators.
//!
//! ```
//! use shape_guard::descriptor::{Descriptor, Field};
//! use shape_guard::entry::create_validator;
//! use serde_json::json;
//!
//! let shape = Descriptor::object([
//!     Field::required("id", Descriptor::number()),
//!     Field::optional("tags", Descriptor::array(Descriptor::text())),
//! ]);
//! let validator = create_validator(&shape).unwrap();
//! assert!(validator.validate_json(json!({"id": 1})).is_ok());
//! assert!(validator.validate_json(json!({"id": "1"})).is_err());
//! ```
pub mod value;
pub mod descriptor;
pub mod combinators;
pub mod expr;
pub mod compile;
pub mod printer;
pub mod entry;
pub mod manifest;
pub mod error;
pub mod path_de;
pub mod jq_exec;

pub use compile::{compile, Compiler};
pub use descriptor::{Descriptor, Field, Literal, PrimitiveKind};
pub use entry::{create_validator, ValidationResult, Validator};
pub use error::{BuildError, CompileError, ShapeError, ValidationError};
pub use expr::{Combinator, Expr};
pub use value::Value;
