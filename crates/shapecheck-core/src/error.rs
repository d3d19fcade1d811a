//! Error types for schema validation
//!
//! A failed validation produces exactly one [`SchemaError`]. It keeps the
//! chain of auto-generated messages (outermost context first), the
//! user-supplied override messages, the path to the failing value and, for
//! aggregated failures, every child error.

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Stable classification of a validation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Value is not an instance of the expected type or container kind
    UnexpectedType,
    /// Value differs from a literal, or a string does not match a pattern
    ValueMismatch,
    /// Predicate returned false
    PredicateFalse,
    /// Predicate failed with a fault
    PredicateRaised,
    /// Conversion function failed with a fault
    ConversionRaised,
    /// Value matched a `Not` schema
    ForbiddenValue,
    /// Mapping contains a forbidden key
    ForbiddenKey,
    /// Mapping lacks a required key
    MissingKey,
    /// Mapping contains keys no key-schema accepts
    UnexpectedKey,
    /// More than one key of an exclusive group is present
    OnlyOneAllowed,
    /// A container element matched none of the element schemas
    NoMatch,
    /// Every branch of an `Or` failed
    Aggregate,
    /// Container length outside the declared bounds
    WrongLength,
}

impl ErrorKind {
    /// Machine-readable code, identical to the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UnexpectedType => "unexpected_type",
            ErrorKind::ValueMismatch => "value_mismatch",
            ErrorKind::PredicateFalse => "predicate_false",
            ErrorKind::PredicateRaised => "predicate_raised",
            ErrorKind::ConversionRaised => "conversion_raised",
            ErrorKind::ForbiddenValue => "forbidden_value",
            ErrorKind::ForbiddenKey => "forbidden_key",
            ErrorKind::MissingKey => "missing_key",
            ErrorKind::UnexpectedKey => "unexpected_key",
            ErrorKind::OnlyOneAllowed => "only_one_allowed",
            ErrorKind::NoMatch => "no_match",
            ErrorKind::Aggregate => "aggregate",
            ErrorKind::WrongLength => "wrong_length",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step from a validated root towards the failing value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(Value),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(Value::Str(key)) => write!(f, ".{}", key),
            PathSegment::Key(key) => write!(f, "[{}]", key.repr()),
            PathSegment::Index(index) => write!(f, "[{}]", index),
        }
    }
}

/// A structured validation failure
#[derive(Debug, Clone)]
pub struct SchemaError {
    kind: ErrorKind,
    autos: Vec<String>,
    overrides: Vec<String>,
    path: Vec<PathSegment>,
    children: Vec<SchemaError>,
    fault: Option<Arc<anyhow::Error>>,
}

impl SchemaError {
    /// Create an error with a single auto-generated message
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            autos: vec![message.into()],
            overrides: Vec::new(),
            path: Vec::new(),
            children: Vec::new(),
            fault: None,
        }
    }

    /// Create an error of `kind` caused by `child`.
    ///
    /// The child's messages follow `message`, the child's path is kept and
    /// the child is recorded as the only child error.
    pub fn wrapping(kind: ErrorKind, message: impl Into<String>, child: SchemaError) -> Self {
        let mut autos = vec![message.into()];
        autos.extend(child.autos.iter().cloned());
        Self {
            kind,
            autos,
            overrides: child.overrides.clone(),
            path: child.path.clone(),
            children: vec![child],
            fault: None,
        }
    }

    /// Create an aggregated error over `children`.
    ///
    /// The displayed chain continues with the last child's messages.
    pub fn aggregate(kind: ErrorKind, message: impl Into<String>, children: Vec<SchemaError>) -> Self {
        let mut autos = vec![message.into()];
        let mut overrides = Vec::new();
        if let Some(last) = children.last() {
            autos.extend(last.autos.iter().cloned());
            overrides.extend(last.overrides.iter().cloned());
        }
        Self {
            kind,
            autos,
            overrides,
            path: Vec::new(),
            children,
            fault: None,
        }
    }

    /// Attach child errors
    pub fn with_children(mut self, children: Vec<SchemaError>) -> Self {
        self.children = children;
        self
    }

    /// Attach the fault raised by a user predicate or converter
    pub fn with_fault(mut self, fault: anyhow::Error) -> Self {
        self.fault = Some(Arc::new(fault));
        self
    }

    /// Add an outer context: an auto message and/or a user message
    pub fn prepend(mut self, auto: Option<String>, user: Option<String>) -> Self {
        if let Some(auto) = auto {
            self.autos.insert(0, auto);
        }
        if let Some(user) = user {
            self.overrides.insert(0, user);
        }
        self
    }

    /// Record that the failure happened under mapping key `key`
    pub fn within_key(mut self, key: Value) -> Self {
        self.path.insert(0, PathSegment::Key(key));
        self
    }

    /// Record that the failure happened at container position `index`
    pub fn within_index(mut self, index: usize) -> Self {
        self.path.insert(0, PathSegment::Index(index));
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Auto-generated messages, outermost context first
    pub fn autos(&self) -> &[String] {
        &self.autos
    }

    /// User-supplied messages, outermost context first
    pub fn overrides(&self) -> &[String] {
        &self.overrides
    }

    pub fn path(&self) -> &[PathSegment] {
        &self.path
    }

    pub fn children(&self) -> &[SchemaError] {
        &self.children
    }

    /// The fault raised by a user callable, if any
    pub fn fault(&self) -> Option<&anyhow::Error> {
        self.fault.as_deref()
    }

    /// Whether this error or any descendant has `kind`
    pub fn contains_kind(&self, kind: ErrorKind) -> bool {
        self.kind == kind || self.children.iter().any(|child| child.contains_kind(kind))
    }

    /// The displayed message.
    ///
    /// User messages win when present; otherwise the auto messages are used.
    /// Duplicates are removed, order is preserved, lines are joined with `\n`.
    pub fn message(&self) -> String {
        let overrides = uniq(&self.overrides);
        if !overrides.is_empty() {
            return overrides.join("\n");
        }
        uniq(&self.autos).join("\n")
    }

    /// Path rendered as `$`, `$.key`, `$.items[2]`
    pub fn path_string(&self) -> String {
        let mut out = String::from("$");
        for segment in &self.path {
            out.push_str(&segment.to_string());
        }
        out
    }
}

fn uniq(items: &[String]) -> Vec<&str> {
    let mut seen = HashSet::new();
    items
        .iter()
        .map(String::as_str)
        .filter(|item| seen.insert(*item))
        .collect()
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for SchemaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.fault
            .as_deref()
            .map(|fault| AsRef::<dyn std::error::Error>::as_ref(fault))
    }
}

/// Result type for validation operations
pub type SchemaResult<T> = std::result::Result<T, SchemaError>;

/// Errors raised while constructing a schema
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// A default was attached to a key that is not a literal
    #[error("Optional keys with defaults must have simple, predictable values, like literal strings or ints. {0} is too complex.")]
    ComplexDefault(String),

    /// A regular expression failed to compile
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Minimum length greater than maximum length
    #[error("Invalid length bounds: minimum {min} exceeds maximum {max}")]
    InvalidLengthBounds { min: usize, max: usize },
}
