//! Logical combinators: And, Or, Not and Const

use crate::context::ValidationContext;
use crate::error::{ErrorKind, SchemaError, SchemaResult};
use crate::schema::Schema;
use crate::value::Value;

/// Branches of an `Or` node
#[derive(Clone, Debug)]
pub struct OrSchema {
    branches: Vec<Schema>,
    only_one: bool,
}

impl OrSchema {
    pub fn new(branches: impl IntoIterator<Item = impl Into<Schema>>) -> Self {
        Self {
            branches: branches.into_iter().map(Into::into).collect(),
            only_one: false,
        }
    }

    /// Mark the branches as an exclusive group of mapping keys
    pub fn only_one(mut self) -> Self {
        self.only_one = true;
        self
    }

    pub fn branches(&self) -> &[Schema] {
        &self.branches
    }

    pub fn is_only_one(&self) -> bool {
        self.only_one
    }
}

/// Thread `data` through every schema, stopping at the first failure
pub(crate) fn all_of(schemas: &[Schema], data: &Value, ctx: &mut ValidationContext) -> SchemaResult<Value> {
    let mut current = data.clone();
    for schema in schemas {
        current = schema.validate_in(&current, ctx)?;
    }
    Ok(current)
}

/// First branch that accepts the original `data` wins
pub(crate) fn any_of(
    schema: &Schema,
    or: &OrSchema,
    data: &Value,
    ctx: &mut ValidationContext,
) -> SchemaResult<Value> {
    let mut failures = Vec::with_capacity(or.branches.len());
    for branch in &or.branches {
        match branch.validate_in(data, ctx) {
            Ok(value) => return Ok(value),
            Err(err) => failures.push(err),
        }
    }
    let message = schema.with_name(format!("{} did not validate {}", schema, data.repr()));
    Err(SchemaError::aggregate(ErrorKind::Aggregate, message, failures))
}

pub(crate) fn none_of(
    schema: &Schema,
    inner: &Schema,
    data: &Value,
    ctx: &mut ValidationContext,
) -> SchemaResult<Value> {
    match inner.validate_in(data, ctx) {
        Err(_) => Ok(data.clone()),
        Ok(_) => Err(schema.fail(
            ErrorKind::ForbiddenValue,
            format!("{} matches forbidden value {}", data.repr(), inner),
        )),
    }
}

pub(crate) fn constant(inner: &Schema, data: &Value, ctx: &mut ValidationContext) -> SchemaResult<Value> {
    inner.validate_in(data, ctx)?;
    Ok(data.clone())
}
