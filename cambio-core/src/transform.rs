//! Declarative field transforms applied to request options and responses.
//!
//! A transform map pairs a field name with a rule: drop the field, rename
//! it, or derive a replacement value from the old one. Rules apply to an
//! object payload, or element-wise to an array of objects; any other
//! payload shape passes through untouched.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};

/// Derivation hook: receives the old value (if any), the field name, and
/// the whole object, and returns the replacement value.
pub type DeriveFn = Arc<dyn Fn(Option<&Value>, &str, &Map<String, Value>) -> Value + Send + Sync>;

/// One per-field transform rule.
#[derive(Clone)]
pub enum TransformRule {
    /// Remove the field.
    Drop,
    /// Move the field's value under a new name.
    Rename(String),
    /// Replace the field's value with the hook's result. The hook runs
    /// even when the field is absent, so it can synthesize new fields.
    Derive(DeriveFn),
}

impl TransformRule {
    /// Rename rule from anything string-like.
    pub fn rename(to: impl Into<String>) -> Self {
        Self::Rename(to.into())
    }

    /// Derive rule from a closure.
    pub fn derive<F>(f: F) -> Self
    where
        F: Fn(Option<&Value>, &str, &Map<String, Value>) -> Value + Send + Sync + 'static,
    {
        Self::Derive(Arc::new(f))
    }
}

impl std::fmt::Debug for TransformRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Drop => f.write_str("Drop"),
            Self::Rename(to) => write!(f, "Rename({to})"),
            Self::Derive(_) => f.write_str("Derive(..)"),
        }
    }
}

/// Ordered rule set, keyed by the source field name.
pub type TransformMap = BTreeMap<String, TransformRule>;

/// Apply `rules` to `data`.
///
/// Objects are transformed in place; arrays are transformed element-wise;
/// any other value is returned unchanged.
#[must_use]
pub fn apply(rules: &TransformMap, data: Value) -> Value {
    if rules.is_empty() {
        return data;
    }
    match data {
        Value::Object(obj) => Value::Object(apply_to_object(rules, obj)),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| apply(rules, item))
                .collect(),
        ),
        other => other,
    }
}

fn apply_to_object(rules: &TransformMap, mut obj: Map<String, Value>) -> Map<String, Value> {
    for (key, rule) in rules {
        match rule {
            TransformRule::Drop => {
                obj.remove(key);
            }
            TransformRule::Rename(to) => {
                if let Some(value) = obj.remove(key) {
                    obj.insert(to.clone(), value);
                }
            }
            TransformRule::Derive(f) => {
                let derived = f(obj.get(key), key, &obj);
                obj.insert(key.clone(), derived);
            }
        }
    }
    obj
}
