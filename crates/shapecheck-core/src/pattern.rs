//! Regular-expression leaf
//!
//! Strings are accepted when the pattern matches anywhere in them; anchor
//! the pattern with `^...$` to require a full match.

use crate::error::{BuildError, ErrorKind, SchemaError, SchemaResult};
use crate::matchers::Validate;
use crate::schema::Schema;
use crate::value::Value;
use regex::{Regex, RegexBuilder};
use std::fmt;

/// Compilation flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegexFlags {
    pub case_insensitive: bool,
    pub multi_line: bool,
    pub dot_matches_new_line: bool,
    pub ignore_whitespace: bool,
}

impl RegexFlags {
    pub fn case_insensitive() -> Self {
        Self {
            case_insensitive: true,
            ..Self::default()
        }
    }
}

/// Validates strings against a compiled pattern
#[derive(Debug, Clone)]
pub struct RegexSchema {
    pattern: String,
    flags: RegexFlags,
    regex: Regex,
}

impl RegexSchema {
    pub fn new(pattern: &str) -> Result<Self, BuildError> {
        Self::with_flags(pattern, RegexFlags::default())
    }

    pub fn with_flags(pattern: &str, flags: RegexFlags) -> Result<Self, BuildError> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(flags.case_insensitive)
            .multi_line(flags.multi_line)
            .dot_matches_new_line(flags.dot_matches_new_line)
            .ignore_whitespace(flags.ignore_whitespace)
            .build()
            .map_err(|e| BuildError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            pattern: pattern.to_string(),
            flags,
            regex,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn flags(&self) -> RegexFlags {
        self.flags
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl Validate for RegexSchema {
    fn validate(&self, value: &Value) -> SchemaResult<Value> {
        match value {
            Value::Str(text) if self.is_match(text) => Ok(value.clone()),
            Value::Str(_) => Err(SchemaError::new(
                ErrorKind::ValueMismatch,
                format!("{} does not match {}", self, value.repr()),
            )),
            _ => Err(SchemaError::new(
                ErrorKind::UnexpectedType,
                format!("{} is not a string", value.repr()),
            )),
        }
    }

    fn describe(&self) -> String {
        self.to_string()
    }

    fn json_schema(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({ "type": "string", "pattern": self.pattern }))
    }
}

impl fmt::Display for RegexSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Regex('{}')", self.pattern)
    }
}

impl From<RegexSchema> for Schema {
    fn from(regex: RegexSchema) -> Self {
        Schema::validator(regex)
    }
}
