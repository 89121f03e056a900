use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, info_span, warn};
use tracing_futures::Instrument;

use crate::domain::model::{
    error::{Error as ModelError, ExportFailure},
    query::QuerySpec,
    record::{Cursor, Page},
    report::{ExportReport, ExportedFile, IndexCount},
    table::ResultTable,
};
use crate::domain::ports::secondary::{
    remote::Remote,
    scroll::{Error as ScrollError, Scroll},
    write::{Error as WriteError, TableWriter},
};

/// What happens to the rows already gathered when a page request fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchFailurePolicy {
    /// Drop everything, nothing is exported.
    Discard,
    /// Export the partial table, then report the interruption.
    Export,
}

impl Default for SearchFailurePolicy {
    fn default() -> Self {
        SearchFailurePolicy::Discard
    }
}

/// An output file and the writer producing it.
pub struct ExportTarget {
    pub path: PathBuf,
    pub writer: Box<dyn TableWriter + Send + Sync>,
}

pub struct ExportParameters {
    pub query: QuerySpec,
    pub targets: Vec<ExportTarget>,
    pub on_search_error: SearchFailurePolicy,
}

#[async_trait]
pub trait ExportDocuments {
    /// Drain every index of the query into a single table, then write all targets.
    async fn export_documents(&self, parameters: ExportParameters)
        -> Result<ExportReport, ModelError>;
}

#[async_trait]
impl<T> ExportDocuments for T
where
    T: Scroll + Send + Sync,
{
    async fn export_documents(
        &self,
        parameters: ExportParameters,
    ) -> Result<ExportReport, ModelError> {
        let start = Instant::now();
        let ExportParameters {
            query,
            targets,
            on_search_error,
        } = parameters;
        let outputs: Vec<ExportedFile> = targets
            .iter()
            .map(|target| ExportedFile {
                format: target.writer.format(),
                path: target.path.clone(),
            })
            .collect();

        let mut table = ResultTable::new();
        let mut pages = 0;
        let mut indices = Vec::with_capacity(query.indices().len());

        for index in query.indices() {
            let before = table.len();
            let res = drain_index(self, index, &query, &mut table, &mut pages)
                .instrument(info_span!("Drain index", index = index.as_str()))
                .await;
            indices.push(IndexCount {
                index: index.clone(),
                count: table.len() - before,
            });

            if let Err(err) = res {
                let err = ModelError::Search {
                    index: index.clone(),
                    count: table.len(),
                    source: Box::new(err),
                };
                return match on_search_error {
                    SearchFailurePolicy::Discard => {
                        warn!("discarding {} records", table.len());
                        Err(err)
                    }
                    SearchFailurePolicy::Export => {
                        warn!("exporting {} records gathered so far", table.len());
                        write_targets(&table, &targets)?;
                        Err(ModelError::Interrupted {
                            report: Box::new(ExportReport {
                                count: table.len(),
                                pages,
                                indices,
                                elapsed: start.elapsed(),
                                outputs,
                            }),
                            source: Box::new(err),
                        })
                    }
                };
            }
        }

        info!("exporting {} records", table.len());
        write_targets(&table, &targets)?;

        Ok(ExportReport {
            count: table.len(),
            pages,
            indices,
            elapsed: start.elapsed(),
            outputs,
        })
    }
}

// Runs the scroll for a single index to completion, appending every record to the table.
// Whatever the outcome, the last known cursor is released before returning.
async fn drain_index<S>(
    scroll: &S,
    index: &str,
    query: &QuerySpec,
    table: &mut ResultTable,
    pages: &mut usize,
) -> Result<(), ScrollError>
where
    S: Scroll + Send + Sync + ?Sized,
{
    let page = scroll.open_scroll(index, query).await?;
    *pages += 1;

    let mut cursor = page.cursor.clone();
    let res = paginate(scroll, query.keep_alive(), page, &mut cursor, table, pages).await;

    if let Err(err) = scroll.clear_scroll(&cursor).await {
        warn!("could not release scroll context for {}: {}", index, err);
    }

    res
}

async fn paginate<S>(
    scroll: &S,
    keep_alive: &str,
    first: Page,
    cursor: &mut Cursor,
    table: &mut ResultTable,
    pages: &mut usize,
) -> Result<(), ScrollError>
where
    S: Scroll + Send + Sync + ?Sized,
{
    let mut page = first;
    while !page.is_empty() {
        info!(
            page = *pages,
            hits = page.records.len(),
            total = page.total.unwrap_or_default(),
            "received page"
        );
        table.extend(page.records);

        page = scroll.next_page(cursor, keep_alive).await?;
        *pages += 1;

        if page.cursor != *cursor {
            info!(scroll_id = page.cursor.as_str(), "new scroll id");
        }
        *cursor = page.cursor.clone();
    }
    Ok(())
}

// Every target is attempted, a failure does not prevent the next writes.
fn write_targets(table: &ResultTable, targets: &[ExportTarget]) -> Result<(), ModelError> {
    let failures: Vec<ExportFailure> = targets
        .iter()
        .filter_map(|target| {
            write_target(table, target).err().map(|err| {
                warn!(
                    "failed to export {} to {}: {}",
                    target.writer.format(),
                    target.path.display(),
                    err
                );
                ExportFailure {
                    format: target.writer.format(),
                    path: target.path.clone(),
                    source: Box::new(err),
                }
            })
        })
        .collect();

    if failures.is_empty() {
        Ok(())
    } else {
        Err(ModelError::Export { failures })
    }
}

fn write_target(
    table: &ResultTable,
    target: &ExportTarget,
) -> Result<(), WriteError> {
    let path: &Path = &target.path;
    target.writer.write_to_path(table, path)?;
    info!(
        "exported {} records as {} to {}",
        table.len(),
        target.writer.format(),
        path.display()
    );
    Ok(())
}

/// Connect to the remote, then export. Nothing is requested, and no file is
/// created, if the connection cannot be established.
pub async fn run<R>(remote: R, parameters: ExportParameters) -> Result<ExportReport, ModelError>
where
    R: Remote + Send,
    R::Conn: Scroll + Send + Sync,
{
    let start = Instant::now();
    let client = remote.conn().await?;
    info!("connected to search service");

    let mut report = client
        .export_documents(parameters)
        .instrument(info_span!("Export documents"))
        .await?;
    report.elapsed = start.elapsed();
    Ok(report)
}
