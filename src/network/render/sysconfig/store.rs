//! Sysconfig-style key/value store
//!
//! Backs both the ifcfg and route files. Serialization is always ordered by
//! key, whatever order the keys were set in.

use crate::SysconfigError;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

const HEADER_TEXT: &str = "Created by cloud-init on instance boot automatically, do not edit.";

/// Two-line "do not edit" header using `comment` as the comment character
pub fn make_header(comment: char) -> String {
    format!("{} {}\n{}", comment, HEADER_TEXT, comment)
}

/// Double-quote values containing whitespace, unless already quoted
pub fn quote_value(value: &str) -> Cow<'_, str> {
    if !value.chars().any(char::is_whitespace) {
        return Cow::Borrowed(value);
    }
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        Cow::Borrowed(value)
    } else {
        Cow::Owned(format!("\"{}\"", value))
    }
}

/// Scalar value stored against a sysconfig key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Str(Cow<'static, str>),
    Bool(bool),
    Int(i64),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            Value::Bool(true) => f.write_str("yes"),
            Value::Bool(false) => f.write_str("no"),
            Value::Int(i) => write!(f, "{}", i),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(Cow::Owned(value.to_string()))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(Cow::Owned(value))
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Value::Str(Cow::Owned(value.clone()))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int(i64::from(value))
    }
}

/// Ordered key/value mapping with sysconfig serialization
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyValueStore {
    entries: BTreeMap<String, Value>,
}

impl KeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Result<&Value, SysconfigError> {
        self.entries
            .get(key)
            .ok_or_else(|| SysconfigError::KeyNotFound(key.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Remove `key`; absent keys are ignored
    pub fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Serialize with the default `#` comment header
    pub fn serialize(&self) -> String {
        self.serialize_with_comment('#')
    }

    pub fn serialize_with_comment(&self, comment: char) -> String {
        let mut out = make_header(comment);
        if !self.is_empty() {
            out.push('\n');
        }
        for (key, value) in &self.entries {
            let value = value.to_string();
            out.push_str(&format!("{}={}\n", key, quote_value(&value)));
        }
        out
    }
}
