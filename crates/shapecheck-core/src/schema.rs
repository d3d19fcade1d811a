//! Schema nodes and the validation façade
//!
//! A [`Schema`] is an immutable tree. [`Schema::validate`] dispatches on the
//! node's [`SchemaKind`]; containers, mappings and combinators call back into
//! [`Schema::validate_in`] for their children.

use crate::combinators::{self, OrSchema};
use crate::container::SeqSchema;
use crate::context::{SchemaOptions, ValidationContext};
use crate::error::{ErrorKind, SchemaError, SchemaResult};
use crate::mapping::MapSchema;
use crate::matchers::{self, Converter, Predicate, Validate};
use crate::value::{Value, ValueType};
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Relative order in which mapping keys are tried, lowest first.
///
/// The weights are stable and can be used with [`Key::with_priority`](crate::Key::with_priority)
/// to slot a key between two kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    /// 10: literal keys
    Comparable = 10,
    /// 20: predicates and conversions
    Callable = 20,
    /// 30: validators, regexes and the And/Or/Not/Const combinators
    Validator = 30,
    /// 40: type keys
    Type = 40,
    /// 50: mapping schemas
    Dict = 50,
    /// 60: list, tuple and set schemas
    Iterable = 60,
}

impl Priority {
    pub fn weight(self) -> i32 {
        self as i32
    }
}

/// The validation strategy of a node
#[derive(Clone)]
pub enum SchemaKind {
    /// Exact value
    Literal(Value),
    /// Runtime type
    Type(ValueType),
    /// Named boolean check
    Predicate(Predicate),
    /// User object implementing [`Validate`]
    Validator(Arc<dyn Validate>),
    /// List, tuple or set of elements
    Sequence(SeqSchema),
    /// Map of key-schemas to value-schemas
    Mapping(MapSchema),
    /// Every schema in turn, threading the value
    And(Vec<Schema>),
    /// First matching branch
    Or(OrSchema),
    /// Inverse of the inner schema
    Not(Box<Schema>),
    /// Conversion
    Use(Converter),
    /// Validate with the inner schema, return the original value
    Const(Box<Schema>),
}

impl SchemaKind {
    /// Short label used in trace events
    pub fn label(&self) -> &'static str {
        match self {
            SchemaKind::Literal(_) => "literal",
            SchemaKind::Type(_) => "type",
            SchemaKind::Predicate(_) => "predicate",
            SchemaKind::Validator(_) => "validator",
            SchemaKind::Sequence(_) => "sequence",
            SchemaKind::Mapping(_) => "mapping",
            SchemaKind::And(_) => "and",
            SchemaKind::Or(_) => "or",
            SchemaKind::Not(_) => "not",
            SchemaKind::Use(_) => "use",
            SchemaKind::Const(_) => "const",
        }
    }
}

/// A node of a schema tree
#[derive(Clone)]
pub struct Schema {
    kind: SchemaKind,
    error: Option<String>,
    name: Option<String>,
    description: Option<String>,
    json_schema: Option<serde_json::Value>,
    options: Option<SchemaOptions>,
}

impl Schema {
    pub fn new(kind: SchemaKind) -> Self {
        Self {
            kind,
            error: None,
            name: None,
            description: None,
            json_schema: None,
            options: None,
        }
    }

    /// Matches exactly `value`
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::new(SchemaKind::Literal(value.into()))
    }

    /// Matches any instance of `ty`
    pub fn of_type(ty: ValueType) -> Self {
        Self::new(SchemaKind::Type(ty))
    }

    /// Matches every value
    pub fn any() -> Self {
        Self::of_type(ValueType::Any)
    }

    /// Matches values for which `check` returns true
    pub fn predicate<F>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self::new(SchemaKind::Predicate(Predicate::new(name, move |value| Ok(check(value)))))
    }

    /// Like [`Schema::predicate`] for checks that can fail
    pub fn try_predicate<F>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Value) -> anyhow::Result<bool> + Send + Sync + 'static,
    {
        Self::new(SchemaKind::Predicate(Predicate::new(name, check)))
    }

    /// Replaces the value with the result of `convert`
    pub fn convert<F>(name: impl Into<String>, convert: F) -> Self
    where
        F: Fn(&Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self::new(SchemaKind::Use(Converter::new(name, convert)))
    }

    /// Delegates to a [`Validate`] implementation
    pub fn validator(validator: impl Validate + 'static) -> Self {
        Self::new(SchemaKind::Validator(Arc::new(validator)))
    }

    pub fn shared_validator(validator: Arc<dyn Validate>) -> Self {
        Self::new(SchemaKind::Validator(validator))
    }

    /// A list whose elements each match one of `elements`
    pub fn list(elements: impl IntoIterator<Item = impl Into<Schema>>) -> Self {
        SeqSchema::list(elements).into()
    }

    /// A tuple whose elements each match one of `elements`
    pub fn tuple(elements: impl IntoIterator<Item = impl Into<Schema>>) -> Self {
        SeqSchema::tuple(elements).into()
    }

    /// A set whose elements each match one of `elements`
    pub fn set(elements: impl IntoIterator<Item = impl Into<Schema>>) -> Self {
        SeqSchema::set(elements).into()
    }

    pub fn and(schemas: impl IntoIterator<Item = impl Into<Schema>>) -> Self {
        Self::new(SchemaKind::And(schemas.into_iter().map(Into::into).collect()))
    }

    pub fn or(schemas: impl IntoIterator<Item = impl Into<Schema>>) -> Self {
        Self::new(SchemaKind::Or(OrSchema::new(schemas)))
    }

    /// An `Or` that, used as a mapping key, allows at most one matching key
    pub fn or_only_one(schemas: impl IntoIterator<Item = impl Into<Schema>>) -> Self {
        Self::new(SchemaKind::Or(OrSchema::new(schemas).only_one()))
    }

    pub fn not(schema: impl Into<Schema>) -> Self {
        Self::new(SchemaKind::Not(Box::new(schema.into())))
    }

    pub fn constant(schema: impl Into<Schema>) -> Self {
        Self::new(SchemaKind::Const(Box::new(schema.into())))
    }

    /// Set the user message. Every `{}` is replaced with the failing input.
    pub fn with_error(mut self, template: impl Into<String>) -> Self {
        self.error = Some(template.into());
        self
    }

    /// Prefix messages produced by this node with `'<name>' `
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Replace what exporters generate for this node
    pub fn with_json_schema(mut self, json_schema: serde_json::Value) -> Self {
        self.json_schema = Some(json_schema);
        self
    }

    /// Options in effect for this node and everything below it
    pub fn with_options(mut self, options: SchemaOptions) -> Self {
        self.options = Some(options);
        self
    }

    pub fn ignore_extra_keys(self, ignore: bool) -> Self {
        let options = self.options.clone().unwrap_or_default().with_ignore_extra_keys(ignore);
        self.with_options(options)
    }

    pub fn kind(&self) -> &SchemaKind {
        &self.kind
    }

    pub fn error_template(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn json_schema_override(&self) -> Option<&serde_json::Value> {
        self.json_schema.as_ref()
    }

    pub fn options(&self) -> Option<&SchemaOptions> {
        self.options.as_ref()
    }

    /// Order in which this schema is tried as a mapping key
    pub fn priority(&self) -> Priority {
        match &self.kind {
            SchemaKind::Literal(_) => Priority::Comparable,
            SchemaKind::Predicate(_) | SchemaKind::Use(_) => Priority::Callable,
            SchemaKind::Validator(_)
            | SchemaKind::And(_)
            | SchemaKind::Or(_)
            | SchemaKind::Not(_)
            | SchemaKind::Const(_) => Priority::Validator,
            SchemaKind::Type(_) => Priority::Type,
            SchemaKind::Mapping(_) => Priority::Dict,
            SchemaKind::Sequence(_) => Priority::Iterable,
        }
    }

    /// Validate `data` with default options
    pub fn validate(&self, data: &Value) -> SchemaResult<Value> {
        self.validate_in(data, &mut ValidationContext::default())
    }

    /// Validate `data` with `options` as the top-level options
    pub fn validate_with(&self, data: &Value, options: &SchemaOptions) -> SchemaResult<Value> {
        self.validate_in(data, &mut ValidationContext::new(options.clone()))
    }

    pub fn is_valid(&self, data: &Value) -> bool {
        self.validate(data).is_ok()
    }

    pub(crate) fn validate_in(&self, data: &Value, ctx: &mut ValidationContext) -> SchemaResult<Value> {
        match &self.options {
            Some(options) => ctx.scoped_options(options, |ctx| self.dispatch(data, ctx)),
            None => self.dispatch(data, ctx),
        }
    }

    fn dispatch(&self, data: &Value, ctx: &mut ValidationContext) -> SchemaResult<Value> {
        trace!(kind = self.kind.label(), path = %ctx.path_string(), depth = ctx.depth(), "validating node");
        let result = match &self.kind {
            SchemaKind::Literal(expected) => matchers::literal(self, expected, data),
            SchemaKind::Type(ty) => matchers::instance_of(self, *ty, data),
            SchemaKind::Predicate(check) => matchers::predicate(self, check, data),
            SchemaKind::Validator(validator) => validator.validate(data),
            SchemaKind::Use(converter) => matchers::convert(self, converter, data),
            SchemaKind::Sequence(seq) => seq.validate_in(self, data, ctx),
            SchemaKind::Mapping(map) => map.validate_in(self, data, ctx),
            SchemaKind::And(schemas) => combinators::all_of(schemas, data, ctx),
            SchemaKind::Or(or) => combinators::any_of(self, or, data, ctx),
            SchemaKind::Not(inner) => combinators::none_of(self, inner, data, ctx),
            SchemaKind::Const(inner) => combinators::constant(inner, data, ctx),
        };
        result.map_err(|err| err.prepend(None, self.render_error(data)))
    }

    /// Build an error whose message is produced by this node
    pub(crate) fn fail(&self, kind: ErrorKind, message: impl Into<String>) -> SchemaError {
        SchemaError::new(kind, self.with_name(message.into()))
    }

    pub(crate) fn with_name(&self, message: String) -> String {
        match &self.name {
            Some(name) => format!("'{}' {}", name, message),
            None => message,
        }
    }

    fn render_error(&self, data: &Value) -> Option<String> {
        self.error
            .as_ref()
            .map(|template| template.replace("{}", &data.to_string()))
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            SchemaKind::Literal(value) => write!(f, "{}", value.repr()),
            SchemaKind::Type(ty) => write!(f, "{}", ty),
            SchemaKind::Predicate(check) => f.write_str(check.name()),
            SchemaKind::Validator(validator) => f.write_str(&validator.describe()),
            SchemaKind::Sequence(seq) => write!(f, "{}", seq),
            SchemaKind::Mapping(map) => write!(f, "{}", map),
            SchemaKind::And(schemas) => write!(f, "And({})", join(schemas)),
            SchemaKind::Or(or) => write!(f, "Or({})", join(or.branches())),
            SchemaKind::Not(inner) => write!(f, "Not({})", inner),
            SchemaKind::Use(converter) => write!(f, "Use({})", converter.name()),
            SchemaKind::Const(inner) => write!(f, "Const({})", inner),
        }
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Schema({})", self)
    }
}

pub(crate) fn join(schemas: &[Schema]) -> String {
    schemas
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<Value> for Schema {
    fn from(value: Value) -> Self {
        Schema::literal(value)
    }
}

impl From<&str> for Schema {
    fn from(value: &str) -> Self {
        Schema::literal(value)
    }
}

impl From<String> for Schema {
    fn from(value: String) -> Self {
        Schema::literal(value)
    }
}

impl From<i64> for Schema {
    fn from(value: i64) -> Self {
        Schema::literal(value)
    }
}

impl From<i32> for Schema {
    fn from(value: i32) -> Self {
        Schema::literal(value)
    }
}

impl From<bool> for Schema {
    fn from(value: bool) -> Self {
        Schema::literal(value)
    }
}

impl From<f64> for Schema {
    fn from(value: f64) -> Self {
        Schema::literal(value)
    }
}

impl From<ValueType> for Schema {
    fn from(ty: ValueType) -> Self {
        Schema::of_type(ty)
    }
}

impl From<SeqSchema> for Schema {
    fn from(seq: SeqSchema) -> Self {
        Schema::new(SchemaKind::Sequence(seq))
    }
}

impl From<MapSchema> for Schema {
    fn from(map: MapSchema) -> Self {
        Schema::new(SchemaKind::Mapping(map))
    }
}

impl From<OrSchema> for Schema {
    fn from(or: OrSchema) -> Self {
        Schema::new(SchemaKind::Or(or))
    }
}
