use snafu::{ResultExt, Snafu};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::model::table::ResultTable;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("Output Creation Error for {}: {}", path, source))]
    OutputCreation {
        path: String,
        source: std::io::Error,
    },

    #[snafu(display("Output Write Error: {}", source))]
    OutputWrite { source: std::io::Error },

    #[snafu(display("JSON Serialization Error: {}", source))]
    JsonSerialization { source: serde_json::Error },

    #[snafu(display("CSV Serialization Error: {}", source))]
    CsvSerialization { source: csv::Error },
}

/// This port defines how a result table is serialized.
pub trait TableWriter {
    /// Short name of the format, used in reports and logs.
    fn format(&self) -> &'static str;

    fn write(&self, table: &ResultTable, out: &mut dyn Write) -> Result<(), Error>;

    /// Create (or truncate) the file at `path` and write the table into it.
    fn write_to_path(&self, table: &ResultTable, path: &Path) -> Result<(), Error> {
        let file = File::create(path).context(OutputCreationSnafu {
            path: path.display().to_string(),
        })?;
        let mut out = BufWriter::new(file);
        self.write(table, &mut out)?;
        out.flush().context(OutputWriteSnafu)
    }
}
