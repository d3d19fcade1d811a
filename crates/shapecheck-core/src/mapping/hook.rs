//! Custom key behaviour
//!
//! A [`Hook`] is consulted whenever its key matches an entry of the mapping
//! being validated: [`Hook::handle`] when the value validated, and
//! [`Hook::catch`] when it did not. Both see the output mapping built so far
//! and the original input.

use crate::error::{SchemaError, SchemaResult};
use crate::value::{Map, Value};

/// What to do with an entry whose value validated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookDecision {
    /// Insert the entry into the output and consume it
    Accept,
    /// Consume the entry without inserting it
    Discard,
    /// Leave the entry for lower-priority keys
    Defer,
}

/// What to do with an entry whose value failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatchDecision {
    /// Fail the mapping with the value error
    Raise,
    /// Drop the entry
    Discard,
    /// Leave the entry for lower-priority keys
    Defer,
}

/// Behaviour attached to a mapping key.
///
/// Implementations that keep state across entries must synchronise it
/// themselves; [`Hook::reset`] runs once after every mapping pass.
#[cfg_attr(test, mockall::automock)]
pub trait Hook: Send + Sync {
    fn handle(&self, _key: &Value, _value: &Value, _new: &mut Map, _data: &Map) -> SchemaResult<HookDecision> {
        Ok(HookDecision::Defer)
    }

    fn catch(&self, _key: &Value, _error: &SchemaError, _new: &mut Map, _data: &Map) -> CatchDecision {
        CatchDecision::Defer
    }

    fn reset(&self) -> SchemaResult<()> {
        Ok(())
    }

    /// Name shown when the key is displayed
    fn describe(&self) -> String {
        "Hook".to_string()
    }
}
