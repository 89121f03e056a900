use serde_json::Value;
use std::collections::HashSet;

use super::record::Record;

/// Content of a table cell.
///
/// `Absent` means the record has no such field, which is distinct from a field
/// explicitly set to `null`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<'a> {
    Absent,
    Value(&'a Value),
}

impl<'a> Cell<'a> {
    /// Textual rendering used by the delimited and markup exports: absent and null
    /// cells are empty, strings are raw, anything else is compact JSON.
    pub fn to_text(&self) -> String {
        match self {
            Cell::Absent | Cell::Value(Value::Null) => String::new(),
            Cell::Value(Value::String(s)) => s.clone(),
            Cell::Value(value) => value.to_string(),
        }
    }
}

/// Append-only table of records.
///
/// The column set is the union of every field seen so far, in first-seen order.
/// Rows keep their append order and are never deduplicated.
#[derive(Debug, Default, Clone)]
pub struct ResultTable {
    columns: Vec<String>,
    known: HashSet<String>,
    rows: Vec<Record>,
}

impl ResultTable {
    pub fn new() -> Self {
        ResultTable::default()
    }

    pub fn push(&mut self, record: Record) {
        for key in record.fields.keys() {
            if !self.known.contains(key) {
                self.known.insert(key.clone());
                self.columns.push(key.clone());
            }
        }
        self.rows.push(record);
    }

    pub fn extend<I: IntoIterator<Item = Record>>(&mut self, records: I) {
        records.into_iter().for_each(|record| self.push(record))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn cell<'a>(&self, record: &'a Record, column: &str) -> Cell<'a> {
        record
            .fields
            .get(column)
            .map(Cell::Value)
            .unwrap_or(Cell::Absent)
    }

    /// Cells of a row, aligned on `columns()`.
    pub fn row_cells<'a>(&'a self, record: &'a Record) -> impl Iterator<Item = Cell<'a>> + 'a {
        self.columns
            .iter()
            .map(move |column| self.cell(record, column))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(id: &str, source: Value) -> Record {
        Record::from_source(id, source)
    }

    #[test]
    fn should_union_columns_in_first_seen_order() {
        let mut table = ResultTable::new();
        table.push(record("a", json!({"host": "h1", "level": "info"})));
        table.push(record("b", json!({"level": "warn", "code": 503})));

        assert_eq!(table.columns(), ["host", "level", "code"]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn should_distinguish_absent_from_null() {
        let mut table = ResultTable::new();
        table.push(record("a", json!({"x": null})));
        table.push(record("b", json!({"y": 1})));

        let rows = table.rows();
        assert_eq!(table.cell(&rows[0], "x"), Cell::Value(&Value::Null));
        assert_eq!(table.cell(&rows[0], "y"), Cell::Absent);
        assert_eq!(table.cell(&rows[1], "x"), Cell::Absent);
    }

    #[test]
    fn should_keep_repeated_records() {
        let mut table = ResultTable::new();
        table.extend(vec![
            record("a", json!({"v": 1})),
            record("a", json!({"v": 1})),
        ]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.columns(), ["v"]);
    }

    #[test]
    fn should_render_cells_as_text() {
        let nested = json!({"k": [1, 2]});
        assert_eq!(Cell::Absent.to_text(), "");
        assert_eq!(Cell::Value(&Value::Null).to_text(), "");
        assert_eq!(Cell::Value(&json!("plain")).to_text(), "plain");
        assert_eq!(Cell::Value(&json!(2.5)).to_text(), "2.5");
        assert_eq!(Cell::Value(&json!(true)).to_text(), "true");
        assert_eq!(Cell::Value(&nested).to_text(), r#"{"k":[1,2]}"#);
    }
}
