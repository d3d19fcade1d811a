//! Schema matching for nested data.
//!
//! This crate checks dynamic values (typically deserialized from JSON, YAML
//! or TOML) against a declarative [`Schema`], optionally transforming them on
//! the way, and reports failures as a single structured [`SchemaError`].
//!
//! # Schema Nodes
//!
//! ```text
//! Literal / Type / Predicate / Validator     leaves
//! Use                                        conversion
//! And / Or / Not / Const                     logical combinators
//! Sequence (list, tuple, set)                containers
//! Mapping (Key -> Schema)                    mappings with key behaviours
//! ```
//!
//! # Example
//!
//! ```rust
//! use shapecheck_core::{Key, MapSchema, Schema, Value, ValueType};
//!
//! let schema: Schema = MapSchema::new()
//!     .entry("name", ValueType::Str)
//!     .entry(Key::optional("port").with_default(8080).unwrap(), ValueType::Int)
//!     .into();
//!
//! let data: Value = serde_json::from_str(r#"{"name": "api"}"#).unwrap();
//! let out = schema.validate(&data).unwrap();
//! assert_eq!(out.as_map().unwrap().len(), 2);
//! ```

pub mod combinators;
pub mod container;
pub mod context;
pub mod error;
pub mod mapping;
pub mod matchers;
pub mod pattern;
pub mod schema;
pub mod value;

pub use combinators::OrSchema;
pub use container::{ContainerKind, SeqSchema};
pub use context::{ConfigError, SchemaOptions, ValidationContext, ENV_PREFIX};
pub use error::{BuildError, ErrorKind, PathSegment, SchemaError, SchemaResult};
pub use mapping::{CatchDecision, DefaultValue, Hook, HookDecision, Key, KeyBehavior, MapSchema};
pub use matchers::{Converter, Predicate, Validate};
pub use pattern::{RegexFlags, RegexSchema};
pub use schema::{Priority, Schema, SchemaKind};
pub use value::{Map, Value, ValueType};

/// Validate `data` against `schema` with default options
pub fn validate(schema: &Schema, data: &Value) -> SchemaResult<Value> {
    schema.validate(data)
}

/// Whether `data` matches `schema`
pub fn is_valid(schema: &Schema, data: &Value) -> bool {
    schema.is_valid(data)
}
