//! Key-schemas of a mapping

use super::hook::{CatchDecision, Hook, HookDecision};
use crate::error::{BuildError, SchemaError, SchemaResult};
use crate::schema::{Schema, SchemaKind};
use crate::value::{Map, Value, ValueType};
use std::fmt;
use std::sync::Arc;

/// How a key reacts when it matches an entry
#[derive(Clone)]
pub enum KeyBehavior {
    /// Required; matched entries are kept
    Plain,
    /// Not required; matched entries are kept
    Optional,
    /// Matched entries are dropped from the output
    Clean,
    /// A matching key fails the mapping
    Forbidden,
    /// Custom behaviour
    Hook(Arc<dyn Hook>),
}

/// Value inserted for an absent optional key
#[derive(Clone)]
pub enum DefaultValue {
    Value(Value),
    Producer(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl DefaultValue {
    pub fn produce(&self) -> Value {
        match self {
            DefaultValue::Value(value) => value.clone(),
            DefaultValue::Producer(producer) => producer(),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Value(value) => write!(f, "Value({})", value.repr()),
            DefaultValue::Producer(_) => f.write_str("Producer"),
        }
    }
}

/// A key-schema: a matcher for keys plus behaviour
#[derive(Clone)]
pub struct Key {
    schema: Schema,
    behavior: KeyBehavior,
    required: bool,
    default: Option<DefaultValue>,
    priority: Option<i32>,
}

impl Key {
    /// A required key
    pub fn new(schema: impl Into<Schema>) -> Self {
        Self::with_behavior(schema.into(), KeyBehavior::Plain)
    }

    pub fn optional(schema: impl Into<Schema>) -> Self {
        Self::with_behavior(schema.into(), KeyBehavior::Optional)
    }

    /// Matching entries are validated, then left out of the output
    pub fn clean(schema: impl Into<Schema>) -> Self {
        Self::with_behavior(schema.into(), KeyBehavior::Clean)
    }

    pub fn forbidden(schema: impl Into<Schema>) -> Self {
        Self::with_behavior(schema.into(), KeyBehavior::Forbidden)
    }

    pub fn hook(schema: impl Into<Schema>, hook: impl Hook + 'static) -> Self {
        Self::shared_hook(schema, Arc::new(hook))
    }

    pub fn shared_hook(schema: impl Into<Schema>, hook: Arc<dyn Hook>) -> Self {
        Self::with_behavior(schema.into(), KeyBehavior::Hook(hook))
    }

    fn with_behavior(schema: Schema, behavior: KeyBehavior) -> Self {
        let required = matches!(behavior, KeyBehavior::Plain);
        Self {
            schema,
            behavior,
            required,
            default: None,
            priority: None,
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Override the order in which this key is tried
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Insert `value` when no entry matches this key
    pub fn with_default(self, value: impl Into<Value>) -> Result<Self, BuildError> {
        self.set_default(DefaultValue::Value(value.into()))
    }

    /// Insert the result of `producer` when no entry matches this key
    pub fn with_default_fn<F>(self, producer: F) -> Result<Self, BuildError>
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.set_default(DefaultValue::Producer(Arc::new(producer)))
    }

    fn set_default(mut self, default: DefaultValue) -> Result<Self, BuildError> {
        if self.literal().is_none() {
            return Err(BuildError::ComplexDefault(self.schema.to_string()));
        }
        self.default = Some(default);
        Ok(self)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn behavior(&self) -> &KeyBehavior {
        &self.behavior
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self.behavior, KeyBehavior::Forbidden)
    }

    pub fn default_value(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }

    /// The exact key matched, for literal matchers
    pub fn literal(&self) -> Option<&Value> {
        match self.schema.kind() {
            SchemaKind::Literal(value) => Some(value),
            _ => None,
        }
    }

    /// Whether this key is an exclusive `Or` group
    pub fn is_exclusive(&self) -> bool {
        matches!(self.schema.kind(), SchemaKind::Or(or) if or.is_only_one())
    }

    /// Explicit priority, else the matcher's
    pub fn priority(&self) -> i32 {
        self.priority.unwrap_or_else(|| self.schema.priority().weight())
    }

    pub(crate) fn on_match(&self, key: &Value, value: &Value, new: &mut Map, data: &Map) -> SchemaResult<HookDecision> {
        match &self.behavior {
            KeyBehavior::Plain | KeyBehavior::Optional | KeyBehavior::Forbidden => Ok(HookDecision::Accept),
            KeyBehavior::Clean => Ok(HookDecision::Discard),
            KeyBehavior::Hook(hook) => hook.handle(key, value, new, data),
        }
    }

    pub(crate) fn on_mismatch(&self, key: &Value, error: &SchemaError, new: &mut Map, data: &Map) -> CatchDecision {
        match &self.behavior {
            KeyBehavior::Plain | KeyBehavior::Optional | KeyBehavior::Forbidden => CatchDecision::Raise,
            KeyBehavior::Clean => CatchDecision::Defer,
            KeyBehavior::Hook(hook) => hook.catch(key, error, new, data),
        }
    }

    pub(crate) fn reset(&self) -> SchemaResult<()> {
        match &self.behavior {
            KeyBehavior::Hook(hook) => hook.reset(),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.behavior {
            KeyBehavior::Plain => write!(f, "{}", self.schema),
            KeyBehavior::Optional => write!(f, "Optional({})", self.schema),
            KeyBehavior::Clean => write!(f, "Clean({})", self.schema),
            KeyBehavior::Forbidden => write!(f, "Forbidden({})", self.schema),
            KeyBehavior::Hook(hook) => write!(f, "{}({})", hook.describe(), self.schema),
        }
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("key", &self.to_string())
            .field("required", &self.required)
            .field("default", &self.default)
            .field("priority", &self.priority())
            .finish()
    }
}

impl From<Schema> for Key {
    fn from(schema: Schema) -> Self {
        Key::new(schema)
    }
}

impl From<&str> for Key {
    fn from(key: &str) -> Self {
        Key::new(key)
    }
}

impl From<String> for Key {
    fn from(key: String) -> Self {
        Key::new(key)
    }
}

impl From<i64> for Key {
    fn from(key: i64) -> Self {
        Key::new(key)
    }
}

impl From<i32> for Key {
    fn from(key: i32) -> Self {
        Key::new(key)
    }
}

impl From<Value> for Key {
    fn from(key: Value) -> Self {
        Key::new(key)
    }
}

impl From<ValueType> for Key {
    fn from(ty: ValueType) -> Self {
        Key::new(ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_by_behavior() {
        assert!(Key::new("a").is_required());
        assert!(!Key::optional("a").is_required());
        assert!(!Key::clean("a").is_required());
        assert!(!Key::forbidden("a").is_required());
        assert!(Key::optional("a").required(true).is_required());
    }

    #[test]
    fn test_default_requires_literal() {
        let key = Key::optional("color").with_default("blue").unwrap();
        assert_eq!(key.default_value().unwrap().produce(), Value::from("blue"));

        let err = Key::optional(ValueType::Str).with_default("blue").unwrap_err();
        assert!(matches!(err, BuildError::ComplexDefault(ref schema) if schema == "str"));
    }

    #[test]
    fn test_default_producer() {
        let key = Key::optional("items").with_default_fn(|| Value::List(Vec::new())).unwrap();
        assert_eq!(key.default_value().unwrap().produce(), Value::List(Vec::new()));
    }

    #[test]
    fn test_priority() {
        assert_eq!(Key::new("a").priority(), 10);
        assert_eq!(Key::new(ValueType::Str).priority(), 40);
        assert_eq!(Key::new(ValueType::Str).with_priority(5).priority(), 5);
    }

    #[test]
    fn test_exclusive() {
        assert!(Key::optional(Schema::or_only_one(["a", "b"])).is_exclusive());
        assert!(!Key::optional(Schema::or(["a", "b"])).is_exclusive());
        assert!(!Key::new("a").is_exclusive());
    }

    #[test]
    fn test_display() {
        assert_eq!(Key::new("a").to_string(), "'a'");
        assert_eq!(Key::optional("a").to_string(), "Optional('a')");
        assert_eq!(Key::forbidden(ValueType::Int).to_string(), "Forbidden(int)");
    }

    #[test]
    fn test_builtin_decisions() {
        let mut new = Map::new();
        let data = Map::new();
        let key = Value::from("a");
        let err = SchemaError::new(crate::error::ErrorKind::ValueMismatch, "x");

        let optional = Key::optional("a");
        assert_eq!(optional.on_match(&key, &key, &mut new, &data).unwrap(), HookDecision::Accept);
        assert_eq!(optional.on_mismatch(&key, &err, &mut new, &data), CatchDecision::Raise);

        let clean = Key::clean("a");
        assert_eq!(clean.on_match(&key, &key, &mut new, &data).unwrap(), HookDecision::Discard);
        assert_eq!(clean.on_mismatch(&key, &err, &mut new, &data), CatchDecision::Defer);
    }
}
