use serde_json::{Map, Value};
use std::fmt;

/// Opaque pagination token handed out by the search service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cursor(String);

impl Cursor {
    pub fn new<S: Into<String>>(token: S) -> Self {
        Cursor(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A retrieved document: its identifier and its source fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new<S: Into<String>>(id: S, fields: Map<String, Value>) -> Self {
        Record {
            id: id.into(),
            fields,
        }
    }

    /// Build a record from a JSON value. Anything but an object is kept under a
    /// single `_source` field, so no payload is ever dropped.
    pub fn from_source<S: Into<String>>(id: S, source: Value) -> Self {
        let fields = match source {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert(String::from("_source"), other);
                map
            }
        };
        Record::new(id, fields)
    }
}

/// One page of a scroll, as returned by the search service.
#[derive(Debug, Clone)]
pub struct Page {
    pub cursor: Cursor,
    /// Total number of hits matching the query, when reported.
    pub total: Option<u64>,
    pub records: Vec<Record>,
}

impl Page {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
