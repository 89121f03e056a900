use snafu::ResultExt;
use std::io::Write;

use crate::domain::model::table::ResultTable;
use crate::domain::ports::secondary::write::{Error, OutputWriteSnafu, TableWriter};

/// Writes the table as an HTML `<table>`, with the record identifier as row header.
#[derive(Debug, Clone)]
pub struct HtmlWriter {
    pub class: String,
}

impl Default for HtmlWriter {
    fn default() -> Self {
        HtmlWriter {
            class: String::from("dataframe"),
        }
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

impl HtmlWriter {
    fn write_table(&self, table: &ResultTable, out: &mut dyn Write) -> std::io::Result<()> {
        writeln!(out, "<table border=\"1\" class=\"{}\">", escape(&self.class))?;
        writeln!(out, "  <thead>")?;
        writeln!(out, "    <tr style=\"text-align: right;\">")?;
        writeln!(out, "      <th>_id</th>")?;
        for column in table.columns() {
            writeln!(out, "      <th>{}</th>", escape(column))?;
        }
        writeln!(out, "    </tr>")?;
        writeln!(out, "  </thead>")?;
        writeln!(out, "  <tbody>")?;
        for record in table.rows() {
            writeln!(out, "    <tr>")?;
            writeln!(out, "      <th>{}</th>", escape(&record.id))?;
            for cell in table.row_cells(record) {
                writeln!(out, "      <td>{}</td>", escape(&cell.to_text()))?;
            }
            writeln!(out, "    </tr>")?;
        }
        writeln!(out, "  </tbody>")?;
        writeln!(out, "</table>")
    }
}

impl TableWriter for HtmlWriter {
    fn format(&self) -> &'static str {
        "html"
    }

    fn write(&self, table: &ResultTable, out: &mut dyn Write) -> Result<(), Error> {
        self.write_table(table, out).context(OutputWriteSnafu)
    }
}
