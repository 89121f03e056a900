use snafu::ResultExt;
use std::io::Write;

use crate::domain::model::table::ResultTable;
use crate::domain::ports::secondary::write::{
    CsvSerializationSnafu, Error, OutputWriteSnafu, TableWriter,
};

/// Writes the table as delimited text: a header with `_id` and the union of
/// columns, then one line per row. Absent and null cells are empty fields.
#[derive(Debug, Clone)]
pub struct CsvWriter {
    pub delimiter: u8,
}

impl Default for CsvWriter {
    fn default() -> Self {
        CsvWriter { delimiter: b',' }
    }
}

impl CsvWriter {
    pub fn new(delimiter: u8) -> Self {
        CsvWriter { delimiter }
    }
}

impl TableWriter for CsvWriter {
    fn format(&self) -> &'static str {
        "csv"
    }

    fn write(&self, table: &ResultTable, out: &mut dyn Write) -> Result<(), Error> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(out);

        writer
            .write_record(std::iter::once("_id").chain(table.columns().iter().map(String::as_str)))
            .context(CsvSerializationSnafu)?;

        for record in table.rows() {
            let cells = table.row_cells(record).map(|cell| cell.to_text());
            writer
                .write_record(std::iter::once(record.id.clone()).chain(cells))
                .context(CsvSerializationSnafu)?;
        }

        writer.flush().context(OutputWriteSnafu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::record::Record;
    use serde_json::json;

    fn written(table: &ResultTable, writer: CsvWriter) -> String {
        let mut out = Vec::new();
        writer.write(table, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn should_align_rows_on_column_union() {
        let mut table = ResultTable::new();
        table.push(Record::from_source("a", json!({"host": "h1", "code": 200})));
        table.push(Record::from_source("b", json!({"code": null, "tags": ["x", "y"]})));

        assert_eq!(
            written(&table, CsvWriter::default()),
            "_id,host,code,tags\na,h1,200,\nb,,,\"[\"\"x\"\",\"\"y\"\"]\"\n"
        );
    }

    #[test]
    fn should_use_delimiter() {
        let mut table = ResultTable::new();
        table.push(Record::from_source("a", json!({"msg": "one; two"})));

        assert_eq!(
            written(&table, CsvWriter::new(b';')),
            "_id;msg\na;\"one; two\"\n"
        );
    }
}
