//! Validation options and per-call context
//!
//! [`SchemaOptions`] is plain configuration: it can be built in code,
//! deserialized from TOML, or read from the environment. Environment
//! variables follow the `PREFIX__KEY` convention (default prefix
//! `SHAPECHECK`), e.g. `SHAPECHECK__IGNORE_EXTRA_KEYS=true`.
//!
//! [`ValidationContext`] is created once per validation call and discarded
//! afterwards; schemas are never written to.

use crate::error::PathSegment;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Default prefix for environment variables
pub const ENV_PREFIX: &str = "SHAPECHECK";

const ENV_SEPARATOR: &str = "__";

/// Errors raised while loading [`SchemaOptions`]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Options file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Options file is not valid TOML for [`SchemaOptions`]
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// An environment variable holds an unusable value
    #[error("Invalid environment variable {name}: {reason}")]
    Env { name: String, reason: String },
}

/// Options inherited by every schema node below the point they apply
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaOptions {
    /// Drop mapping keys that no key-schema accepts instead of failing
    pub ignore_extra_keys: bool,
}

impl SchemaOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the extra-key policy
    pub fn with_ignore_extra_keys(mut self, ignore: bool) -> Self {
        self.ignore_extra_keys = ignore;
        self
    }

    /// Parse options from a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load options from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Read options from `SHAPECHECK__*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with_prefix(ENV_PREFIX)
    }

    /// Read options from `<PREFIX>__*` environment variables.
    ///
    /// Unset variables keep their default.
    pub fn from_env_with_prefix(prefix: &str) -> Result<Self, ConfigError> {
        let mut options = Self::default();
        let name = env_name(prefix, "ignore_extra_keys");
        if let Ok(raw) = std::env::var(&name) {
            options.ignore_extra_keys = parse_bool(&name, &raw)?;
        }
        Ok(options)
    }
}

fn env_name(prefix: &str, key: &str) -> String {
    format!("{}{}{}", prefix, ENV_SEPARATOR, key).to_uppercase()
}

fn parse_bool(name: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::Env {
            name: name.to_string(),
            reason: format!("expected a boolean, got '{}'", other),
        }),
    }
}

/// State of one validation call
#[derive(Debug, Clone)]
pub struct ValidationContext {
    options: SchemaOptions,
    path: Vec<PathSegment>,
}

impl ValidationContext {
    pub fn new(options: SchemaOptions) -> Self {
        Self {
            options,
            path: Vec::new(),
        }
    }

    /// Options in effect for the node being validated
    pub fn options(&self) -> &SchemaOptions {
        &self.options
    }

    /// Keys and indices traversed from the root to the current value
    pub fn path(&self) -> &[PathSegment] {
        &self.path
    }

    /// The current path rendered like [`SchemaError::path_string`](crate::SchemaError::path_string)
    pub fn path_string(&self) -> String {
        self.path.iter().fold(String::from("$"), |mut out, segment| {
            out.push_str(&segment.to_string());
            out
        })
    }

    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Run `f` with `options` in effect, restoring the previous options after
    pub(crate) fn scoped_options<T>(
        &mut self,
        options: &SchemaOptions,
        f: impl FnOnce(&mut Self) -> T,
    ) -> T {
        let previous = std::mem::replace(&mut self.options, options.clone());
        let out = f(self);
        self.options = previous;
        out
    }

    /// Run `f` one path segment deeper
    pub(crate) fn descend<T>(&mut self, segment: PathSegment, f: impl FnOnce(&mut Self) -> T) -> T {
        self.path.push(segment);
        let out = f(self);
        self.path.pop();
        out
    }
}

impl Default for ValidationContext {
    fn default() -> Self {
        Self::new(SchemaOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let options = SchemaOptions::default();
        assert!(!options.ignore_extra_keys);
    }

    #[test]
    fn test_from_toml_str() {
        let options = SchemaOptions::from_toml_str("ignore_extra_keys = true").unwrap();
        assert!(options.ignore_extra_keys);

        let options = SchemaOptions::from_toml_str("").unwrap();
        assert_eq!(options, SchemaOptions::default());
    }

    #[test]
    fn test_from_toml_str_rejects_wrong_type() {
        let err = SchemaOptions::from_toml_str("ignore_extra_keys = 'maybe'").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "ignore_extra_keys = true").unwrap();
        let options = SchemaOptions::from_file(file.path()).unwrap();
        assert!(options.ignore_extra_keys);
    }

    #[test]
    fn test_from_missing_file() {
        let err = SchemaOptions::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_from_env_with_prefix() {
        std::env::set_var("SHAPECHECK_TEST_A__IGNORE_EXTRA_KEYS", "yes");
        let options = SchemaOptions::from_env_with_prefix("shapecheck_test_a").unwrap();
        assert!(options.ignore_extra_keys);

        std::env::set_var("SHAPECHECK_TEST_B__IGNORE_EXTRA_KEYS", "sometimes");
        let err = SchemaOptions::from_env_with_prefix("SHAPECHECK_TEST_B").unwrap_err();
        assert!(err.to_string().contains("SHAPECHECK_TEST_B__IGNORE_EXTRA_KEYS"));

        let options = SchemaOptions::from_env_with_prefix("SHAPECHECK_TEST_UNSET").unwrap();
        assert!(!options.ignore_extra_keys);
    }

    #[test]
    fn test_scoped_options_restore() {
        let mut ctx = ValidationContext::default();
        let inner = SchemaOptions::new().with_ignore_extra_keys(true);
        let seen = ctx.scoped_options(&inner, |ctx| ctx.options().ignore_extra_keys);
        assert!(seen);
        assert!(!ctx.options().ignore_extra_keys);
    }

    #[test]
    fn test_descend_tracks_path() {
        let mut ctx = ValidationContext::default();
        let depth = ctx.descend(PathSegment::Index(0), |ctx| ctx.depth());
        assert_eq!(depth, 1);
        assert_eq!(ctx.depth(), 0);

        let path = ctx.descend(PathSegment::Key(crate::Value::from("hosts")), |ctx| {
            ctx.descend(PathSegment::Index(2), |ctx| ctx.path_string())
        });
        assert_eq!(path, "$.hosts[2]");
        assert_eq!(ctx.path_string(), "$");
    }
}
