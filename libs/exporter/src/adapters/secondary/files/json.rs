use serde::ser::{Serialize, SerializeMap, Serializer};
use snafu::ResultExt;
use std::io::Write;

use crate::domain::model::{record::Record, table::ResultTable};
use crate::domain::ports::secondary::write::{Error, JsonSerializationSnafu, TableWriter};

/// Writes the table as an array of objects, `_id` first, then the fields of the
/// record. Absent fields are left out, `null` is kept.
#[derive(Debug, Clone)]
pub struct JsonWriter {
    pub pretty: bool,
}

impl Default for JsonWriter {
    fn default() -> Self {
        JsonWriter { pretty: true }
    }
}

struct JsonRecord<'a>(&'a Record);

impl Serialize for JsonRecord<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.fields.len() + 1))?;
        map.serialize_entry("_id", &self.0.id)?;
        for (key, value) in &self.0.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

struct JsonTable<'a>(&'a ResultTable);

impl Serialize for JsonTable<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.rows().iter().map(JsonRecord))
    }
}

impl TableWriter for JsonWriter {
    fn format(&self) -> &'static str {
        "json"
    }

    fn write(&self, table: &ResultTable, out: &mut dyn Write) -> Result<(), Error> {
        if self.pretty {
            serde_json::to_writer_pretty(out, &JsonTable(table))
        } else {
            serde_json::to_writer(out, &JsonTable(table))
        }
        .context(JsonSerializationSnafu)
    }
}
