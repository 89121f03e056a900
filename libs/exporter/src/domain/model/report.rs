use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Where the three exports are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputPaths {
    pub json: PathBuf,
    pub csv: PathBuf,
    pub html: PathBuf,
}

impl Default for OutputPaths {
    fn default() -> Self {
        OutputPaths {
            json: PathBuf::from("object.json"),
            csv: PathBuf::from("object.csv"),
            html: PathBuf::from("objectrocket.html"),
        }
    }
}

/// Number of records retrieved from one index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexCount {
    pub index: String,
    pub count: usize,
}

/// A file written by the export, and its format.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportedFile {
    pub format: &'static str,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    /// Rows in the exported table.
    pub count: usize,
    /// Pages received, including the terminating empty page of each index.
    pub pages: usize,
    pub indices: Vec<IndexCount>,
    pub elapsed: Duration,
    pub outputs: Vec<ExportedFile>,
}

impl fmt::Display for ExportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TOTAL DOC COUNT: {}", self.count)?;
        writeln!(f, "TOTAL PAGES: {}", self.pages)?;
        for index in &self.indices {
            writeln!(f, "  {}: {}", index.index, index.count)?;
        }
        for output in &self.outputs {
            writeln!(
                f,
                "{}: {}",
                output.format.to_uppercase(),
                output.path.display()
            )?;
        }
        write!(f, "TOTAL TIME: {:.3} seconds", self.elapsed.as_secs_f64())
    }
}
