//! JSON-Schema export for shapecheck schemas.
//!
//! Walks a finished [`shapecheck_core::Schema`] tree read-only and produces a
//! draft-07 JSON-Schema or an OpenAPI schema object. Nodes that cannot be
//! described (predicates, conversions, validators without a fragment of
//! their own) are left out; a user override set with
//! [`Schema::with_json_schema`](shapecheck_core::Schema::with_json_schema)
//! always wins.
//!
//! # Example
//!
//! ```rust
//! use shapecheck_core::{Key, MapSchema, Schema, ValueType};
//! use shapecheck_export::{JsonSchemaExporter, Target};
//!
//! let schema: Schema = MapSchema::new()
//!     .entry("name", ValueType::Str)
//!     .entry(Key::optional("port"), ValueType::Int)
//!     .into();
//!
//! let doc = JsonSchemaExporter::new(Target::JsonSchema)
//!     .export_document(&schema, "service.json")
//!     .unwrap();
//! assert_eq!(doc["required"], serde_json::json!(["name"]));
//! ```

pub mod error;
pub mod exporter;
pub mod merge;

pub use error::{ExportError, Result};
pub use exporter::{JsonSchemaExporter, Target, DRAFT_07};
