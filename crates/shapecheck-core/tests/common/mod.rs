//! Shared helpers for integration tests

#![allow(dead_code)]

use shapecheck_core::{Map, Value};

/// Install a test subscriber honouring `RUST_LOG`. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Build a string-keyed map value
pub fn map<const N: usize>(entries: [(&str, Value); N]) -> Value {
    Value::Map(
        entries
            .into_iter()
            .map(|(key, value)| (Value::from(key), value))
            .collect::<Map>(),
    )
}

pub fn json(text: &str) -> Value {
    serde_json::from_str(text).expect("test document is valid JSON")
}
