use crate::domain::model::report::OutputPaths;
use crate::domain::ports::primary::export_documents::ExportTarget;

pub mod csv;
pub mod html;
pub mod json;

pub use self::csv::CsvWriter;
pub use self::html::HtmlWriter;
pub use self::json::JsonWriter;

/// The three file exports: JSON, delimited text and HTML table.
pub fn targets(paths: &OutputPaths, delimiter: u8) -> Vec<ExportTarget> {
    vec![
        ExportTarget {
            path: paths.json.clone(),
            writer: Box::new(JsonWriter::default()),
        },
        ExportTarget {
            path: paths.csv.clone(),
            writer: Box::new(CsvWriter::new(delimiter)),
        },
        ExportTarget {
            path: paths.html.clone(),
            writer: Box::new(HtmlWriter::default()),
        },
    ]
}
