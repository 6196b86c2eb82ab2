//! Caller-supplied validation context.
//!
//! A read-only string-keyed map (e.g. `activity -> "excavation"`,
//! `depth_feet -> 12`). Matchers tolerate missing keys by falling back to a
//! documented default; a key that is present with the wrong shape is a
//! [`MatcherError`].

use crate::matchers::MatcherError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationContext {
    values: BTreeMap<String, Value>,
}

impl ValidationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Lookup key for context-keyed tables.
    ///
    /// Strings are used as-is; numbers are normalised so that `4` and `4.0`
    /// both select the row `"4"`. `null` counts as missing.
    pub fn lookup_key(&self, key: &str) -> Result<Option<String>, MatcherError> {
        match self.values.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
            Some(Value::Number(n)) => match n.as_f64() {
                Some(f) => Ok(Some(normalize_number(f))),
                None => Err(MatcherError::ContextType {
                    key: key.to_string(),
                    expected: "string or number",
                    found: n.to_string(),
                }),
            },
            Some(other) => Err(MatcherError::ContextType {
                key: key.to_string(),
                expected: "string or number",
                found: describe(other),
            }),
        }
    }
}

impl From<BTreeMap<String, Value>> for ValidationContext {
    fn from(values: BTreeMap<String, Value>) -> Self {
        Self { values }
    }
}

impl FromIterator<(String, Value)> for ValidationContext {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

fn normalize_number(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        format!("{}", f)
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".into(),
        Value::Bool(b) => format!("boolean {}", b),
        Value::Number(n) => format!("number {}", n),
        Value::String(s) => format!("string {:?}", s),
        Value::Array(_) => "array".into(),
        Value::Object(_) => "object".into(),
    }
}
