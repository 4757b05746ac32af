//! Records: schema-free JSON objects with an id and a timestamp

use crate::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A record stored in a collection.
///
/// The workflow never interprets `data`; it only compares it when computing
/// diffs. Deleted records are kept as tombstones (`deleted == true`, empty
/// data) until compacted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub last_modified: Timestamp,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deleted: bool,
    #[serde(default, flatten)]
    pub data: Map<String, Value>,
}

impl Record {
    pub fn new(id: impl Into<String>, data: Map<String, Value>, last_modified: Timestamp) -> Self {
        let mut data = data;
        // Reserved fields live on the struct, not in the payload.
        data.remove("id");
        data.remove("last_modified");
        data.remove("deleted");
        Self {
            id: id.into(),
            last_modified,
            deleted: false,
            data,
        }
    }

    pub fn tombstone(id: impl Into<String>, last_modified: Timestamp) -> Self {
        Self {
            id: id.into(),
            last_modified,
            deleted: true,
            data: Map::new(),
        }
    }

    pub fn is_tombstone(&self) -> bool {
        self.deleted
    }

    /// Same id, liveness and payload; timestamps are ignored
    pub fn same_content(&self, other: &Record) -> bool {
        self.id == other.id && self.deleted == other.deleted && self.data == other.data
    }

    /// Full JSON object, including `id`, `last_modified` and `deleted` when set
    pub fn to_value(&self) -> Value {
        let mut object = self.data.clone();
        object.insert("id".to_string(), Value::String(self.id.clone()));
        object.insert(
            "last_modified".to_string(),
            Value::from(self.last_modified.as_millis()),
        );
        if self.deleted {
            object.insert("deleted".to_string(), Value::Bool(true));
        }
        Value::Object(object)
    }
}

/// A record-level write requested against a source collection
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum RecordChange {
    /// Create or replace the record with this id
    Upsert { id: String, data: Map<String, Value> },
    /// Tombstone the record with this id
    Delete { id: String },
}

impl RecordChange {
    pub fn upsert(id: impl Into<String>, data: Value) -> Self {
        let data = match data {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        RecordChange::Upsert {
            id: id.into(),
            data,
        }
    }

    pub fn delete(id: impl Into<String>) -> Self {
        RecordChange::Delete { id: id.into() }
    }

    pub fn record_id(&self) -> &str {
        match self {
            RecordChange::Upsert { id, .. } | RecordChange::Delete { id } => id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reserved_fields_are_stripped_from_data() {
        let data = json!({"id": "x", "last_modified": 4, "title": "t"});
        let record = Record::new("a", data.as_object().cloned().unwrap(), Timestamp(10));
        assert_eq!(record.data.len(), 1);
        assert_eq!(record.to_value(), json!({"id": "a", "last_modified": 10, "title": "t"}));
    }

    #[test]
    fn test_same_content_ignores_timestamps() {
        let data = json!({"n": 1}).as_object().cloned().unwrap();
        let a = Record::new("a", data.clone(), Timestamp(1));
        let b = Record::new("a", data, Timestamp(2));
        assert!(a.same_content(&b));
        assert!(!a.same_content(&Record::tombstone("a", Timestamp(2))));
    }

    #[test]
    fn test_tombstone_serializes_deleted_flag() {
        let value = serde_json::to_value(Record::tombstone("gone", Timestamp(7))).unwrap();
        assert_eq!(value, json!({"id": "gone", "last_modified": 7, "deleted": true}));
    }

    #[test]
    fn test_upsert_wraps_scalars() {
        let change = RecordChange::upsert("a", json!(3));
        match change {
            RecordChange::Upsert { data, .. } => assert_eq!(data.get("value"), Some(&json!(3))),
            RecordChange::Delete { .. } => panic!("expected upsert"),
        }
    }
}
