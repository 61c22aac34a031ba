//! Beacon payload model.
//!
//! A beacon is an ordered mapping from field name to value. Order is the
//! order the host inserted the fields in, and it is the order fields are
//! forwarded in.

use indexmap::IndexMap;
use serde::Deserialize;

/// A single beacon field value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum BeaconValue {
    /// `null` or a field the host left undefined. Forwarded as an empty string.
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
    /// Objects and arrays, forwarded through the host URL serializer.
    Structured(serde_json::Value),
}

impl BeaconValue {
    pub fn is_null(&self) -> bool {
        matches!(self, BeaconValue::Null)
    }
}

impl From<&str> for BeaconValue {
    fn from(value: &str) -> Self {
        BeaconValue::Text(value.to_string())
    }
}

impl From<String> for BeaconValue {
    fn from(value: String) -> Self {
        BeaconValue::Text(value)
    }
}

impl From<bool> for BeaconValue {
    fn from(value: bool) -> Self {
        BeaconValue::Bool(value)
    }
}

impl From<i64> for BeaconValue {
    fn from(value: i64) -> Self {
        BeaconValue::Number(value.into())
    }
}

impl From<u64> for BeaconValue {
    fn from(value: u64) -> Self {
        BeaconValue::Number(value.into())
    }
}

impl From<f64> for BeaconValue {
    fn from(value: f64) -> Self {
        match serde_json::Number::from_f64(value) {
            Some(n) => BeaconValue::Number(n),
            // NaN and infinities have no JSON number form
            None if value.is_nan() => BeaconValue::Text("NaN".to_string()),
            None if value > 0.0 => BeaconValue::Text("Infinity".to_string()),
            None => BeaconValue::Text("-Infinity".to_string()),
        }
    }
}

impl From<serde_json::Value> for BeaconValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => BeaconValue::Null,
            serde_json::Value::Bool(b) => BeaconValue::Bool(b),
            serde_json::Value::Number(n) => BeaconValue::Number(n),
            serde_json::Value::String(s) => BeaconValue::Text(s),
            other => BeaconValue::Structured(other),
        }
    }
}

impl<T: Into<BeaconValue>> From<Option<T>> for BeaconValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(BeaconValue::Null)
    }
}

/// Beacon data handed to subscribers of the `beacon` event.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct BeaconPayload {
    fields: IndexMap<String, BeaconValue>,
}

impl BeaconPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a payload from a JSON object, keeping field order.
    pub fn from_json_str(input: &str) -> serde_json::Result<Self> {
        serde_json::from_str(input)
    }

    /// Set a field. Re-setting an existing field keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<BeaconValue>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Builder-style [`BeaconPayload::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<BeaconValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&BeaconValue> {
        self.fields.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BeaconValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for BeaconPayload
where
    K: Into<String>,
    V: Into<BeaconValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut payload = BeaconPayload::new();
        for (key, value) in iter {
            payload.insert(key, value);
        }
        payload
    }
}
