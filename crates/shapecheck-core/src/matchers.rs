//! Leaf matchers and the conversion node
//!
//! Literal, type, predicate and validatable nodes check a value without
//! descending into it. [`Converter`] is the only leaf that replaces the
//! value it was given.

use crate::error::{ErrorKind, SchemaError, SchemaResult};
use crate::schema::Schema;
use crate::value::{Value, ValueType};
use std::fmt;
use std::sync::Arc;

/// Signature of a predicate closure
pub type PredicateFn = dyn Fn(&Value) -> anyhow::Result<bool> + Send + Sync;

/// Signature of a conversion closure
pub type ConvertFn = dyn Fn(&Value) -> anyhow::Result<Value> + Send + Sync;

/// An object that validates values on its own.
///
/// Any type implementing this trait can be embedded in a schema tree as a
/// leaf. Its errors are propagated unchanged, so implementations should
/// build fully descriptive [`SchemaError`]s themselves.
pub trait Validate: Send + Sync {
    /// Validate `value`, returning the (possibly transformed) result
    fn validate(&self, value: &Value) -> SchemaResult<Value>;

    /// Short description used when rendering the enclosing schema
    fn describe(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }

    /// JSON-Schema fragment describing accepted values, when one exists
    fn json_schema(&self) -> Option<serde_json::Value> {
        None
    }
}

/// A named boolean check
#[derive(Clone)]
pub struct Predicate {
    name: String,
    func: Arc<PredicateFn>,
}

impl Predicate {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Value) -> anyhow::Result<bool> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, value: &Value) -> anyhow::Result<bool> {
        (self.func)(value)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate").field("name", &self.name).finish()
    }
}

/// A named conversion applied by `Use` nodes
#[derive(Clone)]
pub struct Converter {
    name: String,
    func: Arc<ConvertFn>,
}

impl Converter {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, value: &Value) -> anyhow::Result<Value> {
        (self.func)(value)
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converter").field("name", &self.name).finish()
    }
}

pub(crate) fn literal(schema: &Schema, expected: &Value, data: &Value) -> SchemaResult<Value> {
    if expected == data {
        return Ok(data.clone());
    }
    Err(schema.fail(
        ErrorKind::ValueMismatch,
        format!("{} does not match {}", expected.repr(), data.repr()),
    ))
}

pub(crate) fn instance_of(schema: &Schema, expected: ValueType, data: &Value) -> SchemaResult<Value> {
    if expected.matches(data) {
        return Ok(data.clone());
    }
    Err(schema.fail(
        ErrorKind::UnexpectedType,
        format!("{} should be instance of '{}'", data.repr(), expected),
    ))
}

/// Predicates validate, they never transform: success returns `data` as is.
pub(crate) fn predicate(schema: &Schema, check: &Predicate, data: &Value) -> SchemaResult<Value> {
    match check.call(data) {
        Ok(true) => Ok(data.clone()),
        Ok(false) => Err(schema.fail(
            ErrorKind::PredicateFalse,
            format!("{}({}) should evaluate to true", check.name(), data.repr()),
        )),
        Err(fault) => Err(raised(schema, ErrorKind::PredicateRaised, check.name(), data, fault)),
    }
}

pub(crate) fn convert(schema: &Schema, converter: &Converter, data: &Value) -> SchemaResult<Value> {
    converter
        .call(data)
        .map_err(|fault| raised(schema, ErrorKind::ConversionRaised, converter.name(), data, fault))
}

/// A fault that already is a [`SchemaError`] is passed through untouched.
fn raised(schema: &Schema, kind: ErrorKind, name: &str, data: &Value, fault: anyhow::Error) -> SchemaError {
    match fault.downcast::<SchemaError>() {
        Ok(inner) => inner,
        Err(fault) => schema
            .fail(kind, format!("{}({}) raised {}", name, data.repr(), fault))
            .with_fault(fault),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueType;

    #[test]
    fn test_literal_match_and_mismatch() {
        let schema = Schema::literal("on");
        assert_eq!(schema.validate(&Value::from("on")).unwrap(), Value::from("on"));

        let err = schema.validate(&Value::from("off")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueMismatch);
        assert_eq!(err.message(), "'on' does not match 'off'");
    }

    #[test]
    fn test_type_mismatch_names_type_and_value() {
        let err = Schema::of_type(ValueType::Int).validate(&Value::from("7")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedType);
        assert_eq!(err.message(), "'7' should be instance of 'int'");
    }

    #[test]
    fn test_bool_is_not_int() {
        assert!(!Schema::of_type(ValueType::Int).is_valid(&Value::Bool(true)));
    }

    #[test]
    fn test_predicate_false() {
        let schema = Schema::predicate("is_positive", |v| v.as_i64().is_some_and(|n| n > 0));
        assert!(schema.is_valid(&Value::Int(3)));

        let err = schema.validate(&Value::Int(-3)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PredicateFalse);
        assert_eq!(err.message(), "is_positive(-3) should evaluate to true");
    }

    #[test]
    fn test_predicate_raised_keeps_fault() {
        let schema = Schema::try_predicate("parse", |v| {
            let text = v.as_str().ok_or_else(|| anyhow::anyhow!("not text"))?;
            Ok(text.parse::<i64>().is_ok())
        });
        let err = schema.validate(&Value::Int(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PredicateRaised);
        assert_eq!(err.message(), "parse(1) raised not text");
        assert_eq!(err.fault().unwrap().to_string(), "not text");
    }

    #[test]
    fn test_predicate_returns_input_unchanged() {
        let schema = Schema::predicate("anything", |_| true);
        let data = Value::List(vec![Value::Int(1)]);
        assert_eq!(schema.validate(&data).unwrap(), data);
    }

    #[test]
    fn test_convert_transforms() {
        let schema = Schema::convert("to_int", |v| {
            let text = v.as_str().ok_or_else(|| anyhow::anyhow!("expected text"))?;
            Ok(Value::Int(text.trim().parse()?))
        });
        assert_eq!(schema.validate(&Value::from(" 42 ")).unwrap(), Value::Int(42));

        let err = schema.validate(&Value::from("x")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConversionRaised);
        assert!(err.message().starts_with("to_int('x') raised"));
    }

    #[test]
    fn test_convert_override_hides_auto_message() {
        let schema = Schema::convert("to_int", |_| Err(anyhow::anyhow!("boom")))
            .with_error("{} is not a number");
        let err = schema.validate(&Value::from("abc")).unwrap_err();
        assert_eq!(err.message(), "abc is not a number");
        assert_eq!(err.kind(), ErrorKind::ConversionRaised);
        assert_eq!(err.autos(), ["to_int('abc') raised boom"]);
    }

    #[test]
    fn test_schema_error_fault_passes_through() {
        let schema = Schema::try_predicate("nested", |_| {
            Err(SchemaError::new(ErrorKind::MissingKey, "inner failure").into())
        });
        let err = schema.validate(&Value::Null).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingKey);
        assert_eq!(err.message(), "inner failure");
    }

    struct EvenOnly;

    impl Validate for EvenOnly {
        fn validate(&self, value: &Value) -> SchemaResult<Value> {
            match value.as_i64() {
                Some(n) if n % 2 == 0 => Ok(Value::Int(n / 2)),
                _ => Err(SchemaError::new(ErrorKind::ValueMismatch, format!("{} is odd", value.repr()))),
            }
        }

        fn describe(&self) -> String {
            "EvenOnly".to_string()
        }
    }

    #[test]
    fn test_validator_may_transform_and_errors_propagate() {
        let schema = Schema::validator(EvenOnly);
        assert_eq!(schema.validate(&Value::Int(8)).unwrap(), Value::Int(4));

        let err = schema.validate(&Value::Int(3)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueMismatch);
        assert_eq!(err.message(), "3 is odd");
    }

    #[test]
    fn test_named_schema_prefixes_own_messages() {
        let schema = Schema::of_type(ValueType::Str).named("hostname");
        let err = schema.validate(&Value::Int(1)).unwrap_err();
        assert_eq!(err.message(), "'hostname' 1 should be instance of 'str'");
    }

    #[test]
    fn test_float_literal_accepts_negative_zero() {
        let out = Schema::literal(0.0).validate(&Value::Float(-0.0)).unwrap();
        assert_eq!(out, Value::Float(-0.0));
        assert!(!Schema::literal(0.0).is_valid(&Value::Int(0)));
    }
}
