/// TableView Records
///
/// A Record is one row's underlying data: a mapping from field name to
/// FieldValue. Records are opaque to the view; columns, filters and the key
/// function reach into them by field name or dotted path.
///
/// # Examples
///
/// ```
/// use tableview::{FieldValue, Record};
///
/// let provider = Record::new()
///     .with("id", 1)
///     .with("name", "Azure AD Production")
///     .with("stats", Record::new().with("totalLogins", 342));
///
/// assert_eq!(provider.get("name").and_then(|v| v.as_str()), Some("Azure AD Production"));
/// assert_eq!(provider.lookup("stats.totalLogins"), Some(&FieldValue::Int(342)));
/// assert_eq!(provider.lookup("stats.activeUsers"), None);
/// ```

use crate::value::FieldValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Caller-supplied record identity, unique within a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordKey {
    Int(i64),
    Text(String),
}

impl RecordKey {
    /// Derive a key from a field value.
    ///
    /// Integers, strings and integral floats make keys; anything else does not.
    pub fn from_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Int(v) => Some(RecordKey::Int(*v)),
            FieldValue::Float(v) if v.fract() == 0.0 && v.is_finite() => Some(RecordKey::Int(*v as i64)),
            FieldValue::String(v) => Some(RecordKey::Text(v.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKey::Int(v) => write!(f, "{}", v),
            RecordKey::Text(v) => write!(f, "'{}'", v),
        }
    }
}

impl From<i64> for RecordKey {
    fn from(v: i64) -> Self {
        RecordKey::Int(v)
    }
}

impl From<i32> for RecordKey {
    fn from(v: i32) -> Self {
        RecordKey::Int(v as i64)
    }
}

impl From<&str> for RecordKey {
    fn from(v: &str) -> Self {
        RecordKey::Text(v.to_string())
    }
}

impl From<String> for RecordKey {
    fn from(v: String) -> Self {
        RecordKey::Text(v)
    }
}

/// Key function: extracts a record's key, or `None` if the record has none.
pub type KeyFn = Rc<dyn Fn(&Record) -> Option<RecordKey>>;

/// Key function reading a single field (the usual `item => item.id`).
pub fn key_by_field(field: impl Into<String>) -> KeyFn {
    let field = field.into();
    Rc::new(move |record: &Record| record.lookup(&field).and_then(RecordKey::from_value))
}

/// One row of data.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Record {
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style insert.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Top-level field by exact name.
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Field by dotted path, descending into nested maps.
    ///
    /// An exact top-level match wins over path traversal, so a field literally
    /// named `a.b` is still reachable.
    pub fn lookup(&self, path: &str) -> Option<&FieldValue> {
        if let Some(value) = self.fields.get(path) {
            return Some(value);
        }

        let mut parts = path.split('.');
        let mut current = self.fields.get(parts.next()?)?;
        for part in parts {
            current = current.as_map()?.get(part)?;
        }
        Some(current)
    }

    /// Field by path, with `Null` folded into absence.
    pub fn present(&self, path: &str) -> Option<&FieldValue> {
        self.lookup(path).filter(|v| !v.is_null())
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Option<FieldValue> {
        self.fields.insert(field.into(), value.into())
    }

    pub fn remove(&mut self, field: &str) -> Option<FieldValue> {
        self.fields.remove(field)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl From<Record> for FieldValue {
    fn from(record: Record) -> Self {
        FieldValue::Map(record.fields)
    }
}

impl From<BTreeMap<String, FieldValue>> for Record {
    fn from(fields: BTreeMap<String, FieldValue>) -> Self {
        Record { fields }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_nested_path() {
        let record = Record::new()
            .with("id", 4)
            .with("permissions", Record::new().with("teams", vec!["Management"]));

        let teams = record.lookup("permissions.teams").unwrap();
        assert_eq!(teams.as_list().unwrap().len(), 1);
        assert_eq!(record.lookup("permissions.users"), None);
        assert_eq!(record.lookup("id.value"), None);
        assert_eq!(record.lookup(""), None);
    }

    #[test]
    fn test_literal_dotted_field_wins() {
        let record = Record::new()
            .with("a.b", 1)
            .with("a", Record::new().with("b", 2));
        assert_eq!(record.lookup("a.b"), Some(&FieldValue::Int(1)));
    }

    #[test]
    fn test_present_folds_null() {
        let record = Record::new().with("status", FieldValue::Null).with("name", "x");
        assert!(record.lookup("status").is_some());
        assert!(record.present("status").is_none());
        assert!(record.present("name").is_some());
    }

    #[test]
    fn test_key_by_field() {
        let key_fn = key_by_field("id");
        assert_eq!(key_fn(&Record::new().with("id", 3)), Some(RecordKey::Int(3)));
        assert_eq!(key_fn(&Record::new().with("id", 3.0)), Some(RecordKey::Int(3)));
        assert_eq!(key_fn(&Record::new().with("id", "job-3")), Some(RecordKey::from("job-3")));
        assert_eq!(key_fn(&Record::new().with("id", 3.5)), None);
        assert_eq!(key_fn(&Record::new().with("name", "no id")), None);
    }

    #[test]
    fn test_record_json_is_a_plain_object() {
        let record: Record = serde_json::from_str(r#"{"id": 1, "status": "Success"}"#).unwrap();
        assert_eq!(record.len(), 2);
        assert_eq!(record.get("status").and_then(|v| v.as_str()), Some("Success"));

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"id":1,"status":"Success"}"#);
    }
}
