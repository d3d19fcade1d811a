//! Sequence containers: lists, tuples and sets

use crate::context::ValidationContext;
use crate::error::{BuildError, ErrorKind, PathSegment, SchemaError, SchemaResult};
use crate::schema::{join, Schema};
use crate::value::Value;
use std::fmt;

/// Kind of sequence container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    List,
    Tuple,
    Set,
}

impl ContainerKind {
    pub fn name(&self) -> &'static str {
        match self {
            ContainerKind::List => "list",
            ContainerKind::Tuple => "tuple",
            ContainerKind::Set => "set",
        }
    }
}

/// Schema for a sequence container.
///
/// Every element must match at least one declared element schema. With no
/// element schemas declared, any element is accepted.
#[derive(Clone, Debug)]
pub struct SeqSchema {
    kind: Option<ContainerKind>,
    elements: Vec<Schema>,
    matcher: Box<Schema>,
    min_length: usize,
    max_length: Option<usize>,
}

impl SeqSchema {
    /// `kind` of `None` accepts lists, tuples and sets alike
    pub fn new(kind: Option<ContainerKind>, elements: impl IntoIterator<Item = impl Into<Schema>>) -> Self {
        let elements: Vec<Schema> = elements.into_iter().map(Into::into).collect();
        let matcher = match elements.as_slice() {
            [] => Schema::any(),
            [single] => single.clone(),
            many => Schema::or(many.iter().cloned()),
        };
        Self {
            kind,
            elements,
            matcher: Box::new(matcher),
            min_length: 0,
            max_length: None,
        }
    }

    pub fn list(elements: impl IntoIterator<Item = impl Into<Schema>>) -> Self {
        Self::new(Some(ContainerKind::List), elements)
    }

    pub fn tuple(elements: impl IntoIterator<Item = impl Into<Schema>>) -> Self {
        Self::new(Some(ContainerKind::Tuple), elements)
    }

    pub fn set(elements: impl IntoIterator<Item = impl Into<Schema>>) -> Self {
        Self::new(Some(ContainerKind::Set), elements)
    }

    pub fn any_kind(elements: impl IntoIterator<Item = impl Into<Schema>>) -> Self {
        Self::new(None, elements)
    }

    /// Require between `min` and `max` (inclusive) elements
    pub fn with_length_bounds(mut self, min: usize, max: Option<usize>) -> Result<Self, BuildError> {
        if let Some(max) = max {
            if min > max {
                return Err(BuildError::InvalidLengthBounds { min, max });
            }
        }
        self.min_length = min;
        self.max_length = max;
        Ok(self)
    }

    /// Require exactly `len` elements
    pub fn with_length(mut self, len: usize) -> Self {
        self.min_length = len;
        self.max_length = Some(len);
        self
    }

    pub fn kind(&self) -> Option<ContainerKind> {
        self.kind
    }

    pub fn elements(&self) -> &[Schema] {
        &self.elements
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    pub fn max_length(&self) -> Option<usize> {
        self.max_length
    }

    pub(crate) fn validate_in(
        &self,
        schema: &Schema,
        data: &Value,
        ctx: &mut ValidationContext,
    ) -> SchemaResult<Value> {
        let (actual, items): (ContainerKind, Vec<&Value>) = match data {
            Value::List(items) => (ContainerKind::List, items.iter().collect()),
            Value::Tuple(items) => (ContainerKind::Tuple, items.iter().collect()),
            Value::Set(items) => (ContainerKind::Set, items.iter().collect()),
            _ => return Err(self.wrong_kind(schema, data)),
        };
        if self.kind.is_some_and(|expected| expected != actual) {
            return Err(self.wrong_kind(schema, data));
        }
        self.check_length(schema, data, items.len())?;

        let mut validated = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            let value = ctx
                .descend(PathSegment::Index(index), |ctx| self.matcher.validate_in(item, ctx))
                .map_err(|err| {
                    let message = schema.with_name(format!(
                        "element {} at index {} did not match {}",
                        item.repr(),
                        index,
                        self.matcher
                    ));
                    SchemaError::wrapping(ErrorKind::NoMatch, message, err).within_index(index)
                })?;
            validated.push(value);
        }

        Ok(match actual {
            ContainerKind::List => Value::List(validated),
            ContainerKind::Tuple => Value::Tuple(validated),
            ContainerKind::Set => Value::Set(validated.into_iter().collect()),
        })
    }

    fn wrong_kind(&self, schema: &Schema, data: &Value) -> SchemaError {
        let expected = self.kind.map_or("sequence", |kind| kind.name());
        schema.fail(
            ErrorKind::UnexpectedType,
            format!("{} should be instance of '{}'", data.repr(), expected),
        )
    }

    fn check_length(&self, schema: &Schema, data: &Value, len: usize) -> SchemaResult<()> {
        if len >= self.min_length && self.max_length.map_or(true, |max| len <= max) {
            return Ok(());
        }
        Err(schema.fail(
            ErrorKind::WrongLength,
            format!(
                "{} should have between {} and {} elements (has {})",
                data.repr(),
                self.min_length,
                bound(self.max_length),
                len
            ),
        ))
    }
}

pub(crate) fn bound(max: Option<usize>) -> String {
    max.map_or_else(|| "inf".to_string(), |max| max.to_string())
}

impl fmt::Display for SeqSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let elements = join(&self.elements);
        match self.kind {
            Some(ContainerKind::List) => write!(f, "[{}]", elements),
            Some(ContainerKind::Tuple) => write!(f, "({})", elements),
            Some(ContainerKind::Set) => write!(f, "{{{}}}", elements),
            None => write!(f, "Sequence({})", elements),
        }
    }
}
