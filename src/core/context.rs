//! Shared key-value context read by guards and conditions.
//!
//! The context is the one piece of mutable data a machine owns besides its
//! current state. Hooks write to it, predicates read from it, and callers may
//! replace it wholesale.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Schema-less mapping from string keys to arbitrary JSON values.
///
/// Cloning a context produces a fully independent copy.
///
/// # Example
///
/// ```rust
/// use statewright::core::Context;
///
/// let mut ctx = Context::new();
/// ctx.set("should_move", false);
/// ctx.set("speed", 2.5);
///
/// assert_eq!(ctx.get_bool("should_move"), Some(false));
/// assert_eq!(ctx.get_f64("speed"), Some(2.5));
/// assert!(ctx.get("missing").is_none());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context {
    values: BTreeMap<String, Value>,
}

impl Context {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a value, returning the previous one.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.values.get_mut(key)
    }

    /// Read a boolean value. Non-boolean values read as `None`.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// True when `key` holds exactly `true`.
    ///
    /// Missing keys and non-boolean values are treated as false, which is the
    /// usual reading for flag-style conditions.
    pub fn is_true(&self, key: &str) -> bool {
        self.get_bool(key).unwrap_or(false)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl From<Map<String, Value>> for Context {
    fn from(map: Map<String, Value>) -> Self {
        map.into_iter().collect()
    }
}

impl From<Context> for Value {
    fn from(ctx: Context) -> Self {
        Value::Object(ctx.values.into_iter().collect())
    }
}
