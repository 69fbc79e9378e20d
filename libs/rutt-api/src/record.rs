use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StoreError;
use crate::path::FieldPath;

/// Primary key field. Set on creation or first upsert, never rewritten.
pub const ID_KEY: &str = "_id";
pub const SOURCE_ID: &str = "sourceId";
pub const TIME_QUEUED: &str = "timeQueued";
pub const DESTINATIONS: &str = "destinations";

/// Schema-less document tree: string keys → scalar or nested object.
pub type Document = Map<String, Value>;

// ═══════════════════════════════════════════════════════════════
//  Update
// ═══════════════════════════════════════════════════════════════

/// A single leaf assignment: `path = value`.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub path: FieldPath,
    pub value: Value,
}

impl Update {
    pub fn new(path: FieldPath, value: impl Into<Value>) -> Self {
        Self {
            path,
            value: value.into(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  merge_at
// ═══════════════════════════════════════════════════════════════

/// Set `value` at `path`, creating missing intermediate objects.
///
/// Only the addressed leaf changes; siblings at every level are kept.
/// Fails with `PathConflict` if an existing intermediate level is not an
/// object. A failed call leaves `doc` untouched: levels are only created
/// below the first missing one, and nothing below a fresh level can
/// conflict.
pub fn merge_at(doc: &mut Document, path: &FieldPath, value: Value) -> Result<(), StoreError> {
    let mut node = doc;
    for (depth, segment) in path.parents().iter().enumerate() {
        let slot = node
            .entry(segment.as_str())
            .or_insert_with(|| Value::Object(Map::new()));
        node = match slot {
            Value::Object(map) => map,
            other => {
                return Err(StoreError::path_conflict(format!(
                    "cannot set '{path}': '{}' holds {}, not an object",
                    path.prefix(depth + 1),
                    type_name(other)
                )));
            }
        };
    }
    node.insert(path.leaf().to_string(), value);
    Ok(())
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ═══════════════════════════════════════════════════════════════
//  CorrelationRecord
// ═══════════════════════════════════════════════════════════════

/// Lifecycle document of one correlation id.
///
/// Serializes as the bare document, e.g.
/// `{"_id":"c1","sourceId":"s1","destinations":{"d1":{"m1":{"timeQueued":"t1"}}}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationRecord(Document);

impl CorrelationRecord {
    /// Record as written by Create: exactly `{_id, sourceId}`.
    pub fn created(id: &str, source_id: &str) -> Self {
        let mut doc = Document::new();
        doc.insert(ID_KEY.to_string(), Value::String(id.to_string()));
        doc.insert(SOURCE_ID.to_string(), Value::String(source_id.to_string()));
        Self(doc)
    }

    /// Starting point of an upsert against a missing id: only the id key,
    /// `sourceId` is never backfilled.
    pub fn upserted(id: &str) -> Self {
        let mut doc = Document::new();
        doc.insert(ID_KEY.to_string(), Value::String(id.to_string()));
        Self(doc)
    }

    pub fn id(&self) -> Option<&str> {
        self.0.get(ID_KEY).and_then(Value::as_str)
    }

    pub fn source_id(&self) -> Option<&str> {
        self.0.get(SOURCE_ID).and_then(Value::as_str)
    }

    pub fn time_queued(&self) -> Option<&str> {
        self.0.get(TIME_QUEUED).and_then(Value::as_str)
    }

    /// Sub-record of one destination leg, if any field was ever set on it.
    pub fn destination(&self, destination_id: &str, message_id: &str) -> Option<&Document> {
        self.0
            .get(DESTINATIONS)?
            .get(destination_id)?
            .get(message_id)?
            .as_object()
    }

    /// Value at `path`, if present.
    pub fn get(&self, path: &FieldPath) -> Option<&Value> {
        let mut node = &self.0;
        for segment in path.parents() {
            node = node.get(segment.as_str())?.as_object()?;
        }
        node.get(path.leaf().as_str())
    }

    /// Merge one leaf assignment into the record.
    pub fn apply(&mut self, update: &Update) -> Result<(), StoreError> {
        merge_at(&mut self.0, &update.path, update.value.clone())
    }

    pub fn as_document(&self) -> &Document {
        &self.0
    }
}
