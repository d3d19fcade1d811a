//! Mapping validation
//!
//! Key-schemas are tried in priority order (lowest weight first, forbidden
//! keys before others of equal weight, then declaration order). Each
//! key-schema is offered every input entry that is still unclaimed; its
//! [`KeyBehavior`] decides whether a matching entry is kept, dropped or
//! left for the key-schemas that follow.
//!
//! Failures are reported in a fixed order: forbidden keys and value errors
//! as they are met during the pass, then exclusive groups matched more than
//! once, then missing keys, then unexpected keys.

pub mod hook;
pub mod key;

pub use hook::{CatchDecision, Hook, HookDecision};
pub use key::{DefaultValue, Key, KeyBehavior};

use crate::container::bound;
use crate::context::ValidationContext;
use crate::error::{BuildError, ErrorKind, PathSegment, SchemaError, SchemaResult};
use crate::schema::Schema;
use crate::value::{Map, Value};
use std::fmt;
use tracing::debug;

/// Schema for a mapping
#[derive(Clone, Debug, Default)]
pub struct MapSchema {
    entries: Vec<(Key, Schema)>,
    order: Vec<usize>,
    ignore_extra_keys: Option<bool>,
    min_length: usize,
    max_length: Option<usize>,
}

/// Input entries still unclaimed after a pass, with per key-schema tallies
struct Pass<'a> {
    new: Map,
    remaining: Vec<(&'a Value, &'a Value)>,
    satisfied: Vec<bool>,
    matched: Vec<usize>,
}

impl MapSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(key, value)` pairs of uniform types
    pub fn from_entries<I, K, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, S)>,
        K: Into<Key>,
        S: Into<Schema>,
    {
        entries
            .into_iter()
            .fold(Self::new(), |map, (key, value)| map.entry(key, value))
    }

    /// Declare a key-schema and the schema of its values
    pub fn entry(mut self, key: impl Into<Key>, value: impl Into<Schema>) -> Self {
        self.entries.push((key.into(), value.into()));
        self.order = sort_order(&self.entries);
        self
    }

    /// Override the inherited extra-key policy for this mapping only
    pub fn ignore_extra_keys(mut self, ignore: bool) -> Self {
        self.ignore_extra_keys = Some(ignore);
        self
    }

    /// Require between `min` and `max` (inclusive) entries
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

    /// Declared key-schemas in declaration order
    pub fn entries(&self) -> &[(Key, Schema)] {
        &self.entries
    }

    /// Key-schemas in the order they are tried
    pub fn ordered_entries(&self) -> impl Iterator<Item = &(Key, Schema)> {
        self.order.iter().map(|&index| &self.entries[index])
    }

    pub fn extra_keys_policy(&self) -> Option<bool> {
        self.ignore_extra_keys
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
        let Value::Map(map) = data else {
            return Err(schema.fail(
                ErrorKind::UnexpectedType,
                format!("{} should be instance of 'map'", data.repr()),
            ));
        };
        self.check_length(schema, data, map.len())?;

        let pass = self.match_entries(schema, data, map, ctx);
        let reset = self.reset_hooks();
        let mut pass = pass?;
        reset?;

        self.check_exclusive(schema, &pass)?;
        let defaults = self.check_missing(schema, data, &pass)?;

        let ignore_extra = self
            .ignore_extra_keys
            .unwrap_or(ctx.options().ignore_extra_keys);
        if !pass.remaining.is_empty() {
            if ignore_extra {
                debug!(count = pass.remaining.len(), "ignoring extra keys");
            } else {
                return Err(unexpected_keys(schema, data, &pass.remaining));
            }
        }

        for (key, default) in defaults {
            pass.new.entry(key).or_insert_with(|| default.produce());
        }
        Ok(Value::Map(pass.new))
    }

    fn match_entries<'a>(
        &self,
        schema: &Schema,
        data: &Value,
        map: &'a Map,
        ctx: &mut ValidationContext,
    ) -> SchemaResult<Pass<'a>> {
        let mut remaining: Vec<(&Value, &Value)> = map.iter().collect();
        remaining.sort_by_key(|(_, value)| value.is_container());

        let mut pass = Pass {
            new: Map::new(),
            remaining,
            satisfied: vec![false; self.entries.len()],
            matched: vec![0; self.entries.len()],
        };

        for &index in &self.order {
            let (key, value_schema) = &self.entries[index];
            let mut position = 0;
            while position < pass.remaining.len() {
                let (actual_key, actual_value) = pass.remaining[position];
                let Ok(new_key) = key.schema().validate_in(actual_key, ctx) else {
                    position += 1;
                    continue;
                };
                pass.matched[index] += 1;

                if key.is_forbidden() {
                    debug!(key = %actual_key.repr(), "forbidden key encountered");
                    return Err(schema
                        .fail(
                            ErrorKind::ForbiddenKey,
                            format!("Forbidden key encountered: {} in {}", actual_key.repr(), data.repr()),
                        )
                        .within_key(actual_key.clone()));
                }

                let validated = ctx.descend(PathSegment::Key(actual_key.clone()), |ctx| {
                    value_schema.validate_in(actual_value, ctx)
                });
                match validated {
                    Ok(new_value) => {
                        pass.satisfied[index] = true;
                        let decision = key
                            .on_match(&new_key, &new_value, &mut pass.new, map)
                            .map_err(|err| err.within_key(actual_key.clone()))?;
                        debug!(key = %new_key.repr(), ?decision, "key matched");
                        match decision {
                            HookDecision::Accept => {
                                pass.new.insert(new_key, new_value);
                                pass.remaining.remove(position);
                            }
                            HookDecision::Discard => {
                                pass.remaining.remove(position);
                            }
                            HookDecision::Defer => position += 1,
                        }
                    }
                    Err(err) => {
                        let decision = key.on_mismatch(&new_key, &err, &mut pass.new, map);
                        debug!(key = %new_key.repr(), ?decision, "value did not validate");
                        match decision {
                            CatchDecision::Raise => {
                                let context = schema.with_name(format!("Key '{}' error:", new_key));
                                return Err(err.prepend(Some(context), None).within_key(actual_key.clone()));
                            }
                            CatchDecision::Discard => {
                                pass.remaining.remove(position);
                            }
                            CatchDecision::Defer => position += 1,
                        }
                    }
                }
            }
        }
        Ok(pass)
    }

    /// Every hook is reset, the first failure is reported
    fn reset_hooks(&self) -> SchemaResult<()> {
        let mut outcome = Ok(());
        for (key, _) in &self.entries {
            if let Err(err) = key.reset() {
                if outcome.is_ok() {
                    outcome = Err(err);
                }
            }
        }
        outcome
    }

    fn check_exclusive(&self, schema: &Schema, pass: &Pass<'_>) -> SchemaResult<()> {
        for (index, (key, _)) in self.entries.iter().enumerate() {
            if key.is_exclusive() && pass.matched[index] > 1 {
                debug!(key = %key, matched = pass.matched[index], "exclusive keys matched more than once");
                return Err(schema.fail(
                    ErrorKind::OnlyOneAllowed,
                    format!("There are multiple keys present from the {} condition", key.schema()),
                ));
            }
        }
        Ok(())
    }

    /// Returns the defaults to insert for unsatisfied keys
    fn check_missing<'s>(
        &'s self,
        schema: &Schema,
        data: &Value,
        pass: &Pass<'_>,
    ) -> SchemaResult<Vec<(Value, &'s DefaultValue)>> {
        let mut defaults = Vec::new();
        let mut missing = Vec::new();
        for (index, (key, _)) in self.entries.iter().enumerate() {
            if pass.satisfied[index] {
                continue;
            }
            match (key.literal(), key.default_value()) {
                (Some(literal), Some(default)) => defaults.push((literal.clone(), default)),
                _ if key.is_required() => missing.push(key),
                _ => {}
            }
        }
        if missing.is_empty() {
            return Ok(defaults);
        }

        let mut names: Vec<String> = missing.iter().map(|key| key.schema().to_string()).collect();
        names.sort();
        debug!(missing = %names.join(", "), "required keys missing");
        let children = missing
            .iter()
            .map(|key| {
                let err = SchemaError::new(
                    ErrorKind::MissingKey,
                    format!("Missing key: {} in {}", key.schema(), data.repr()),
                );
                match key.literal() {
                    Some(literal) => err.within_key(literal.clone()),
                    None => err,
                }
            })
            .collect();
        Err(schema
            .fail(
                ErrorKind::MissingKey,
                format!("Missing key{}: {}", plural(names.len()), names.join(", ")),
            )
            .with_children(children))
    }

    fn check_length(&self, schema: &Schema, data: &Value, len: usize) -> SchemaResult<()> {
        if len >= self.min_length && self.max_length.map_or(true, |max| len <= max) {
            return Ok(());
        }
        Err(schema.fail(
            ErrorKind::WrongLength,
            format!(
                "{} should have between {} and {} keys (has {})",
                data.repr(),
                self.min_length,
                bound(self.max_length),
                len
            ),
        ))
    }
}

fn unexpected_keys(schema: &Schema, data: &Value, remaining: &[(&Value, &Value)]) -> SchemaError {
    let mut names: Vec<String> = remaining.iter().map(|(key, _)| key.repr().to_string()).collect();
    names.sort();
    debug!(keys = %names.join(", "), "unexpected keys");
    let children = remaining
        .iter()
        .map(|(key, _)| {
            SchemaError::new(
                ErrorKind::UnexpectedKey,
                format!("Wrong key {} in {}", key.repr(), data.repr()),
            )
            .within_key((*key).clone())
        })
        .collect();
    schema
        .fail(
            ErrorKind::UnexpectedKey,
            format!("Wrong key{} {} in {}", plural(names.len()), names.join(", "), data.repr()),
        )
        .with_children(children)
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

fn sort_order(entries: &[(Key, Schema)]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..entries.len()).collect();
    order.sort_by_key(|&index| {
        let key = &entries[index].0;
        (key.priority(), !key.is_forbidden(), index)
    });
    order
}

impl fmt::Display for MapSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries: Vec<String> = self
            .entries
            .iter()
            .map(|(key, value)| format!("{}: {}", key, value))
            .collect();
        write!(f, "{{{}}}", entries.join(", "))
    }
}
