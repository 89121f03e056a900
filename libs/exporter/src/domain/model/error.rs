use snafu::Snafu;
use std::path::PathBuf;

use super::report::ExportReport;

/// One output that could not be written.
#[derive(Debug)]
pub struct ExportFailure {
    pub format: &'static str,
    pub path: PathBuf,
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

fn describe(failures: &[ExportFailure]) -> String {
    failures
        .iter()
        .map(|failure| {
            format!(
                "{} ({}): {}",
                failure.format,
                failure.path.display(),
                failure.source
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("Invalid Query: {}", details))]
    InvalidQuery { details: String },

    #[snafu(display("Connection Error: {}", source))]
    Connection {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[snafu(display("Search Error on index {} after {} records: {}", index, count, source))]
    Search {
        index: String,
        count: usize,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[snafu(display("Export Error: {}", describe(failures)))]
    Export { failures: Vec<ExportFailure> },

    #[snafu(display(
        "Export Interrupted: {} records exported before failure: {}",
        report.count,
        source
    ))]
    Interrupted {
        report: Box<ExportReport>,
        source: Box<Error>,
    },
}
