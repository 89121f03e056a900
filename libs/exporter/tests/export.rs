use async_trait::async_trait;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use exporter::adapters::secondary::files;
use exporter::domain::model::{
    error::Error,
    query::{QuerySpec, TimeRange},
    record::Record,
    report::OutputPaths,
};
use exporter::domain::ports::primary::export_documents::{
    run, ExportDocuments, ExportParameters, SearchFailurePolicy,
};
use exporter::domain::ports::secondary::remote::{Error as RemoteError, Remote};
use exporter::utils::memory::MemoryScroll;

fn records(ids: &[&str]) -> Vec<Record> {
    ids.iter()
        .enumerate()
        .map(|(n, id)| Record::from_source(*id, json!({"n": n, "msg": format!("doc {}", id)})))
        .collect()
}

fn query(indices: &[&str], page_size: u64) -> QuerySpec {
    QuerySpec::new(
        indices.iter().map(|index| index.to_string()).collect(),
        page_size,
        "60s",
        TimeRange {
            gte: Some(String::from("2022-06-08T02:40:52.138Z")),
            lte: Some(String::from("2022-06-08T02:51:01.125Z")),
            ..TimeRange::default()
        },
    )
    .expect("valid query")
}

// The default file names, inside `dir`.
fn output_paths(dir: &Path) -> OutputPaths {
    let defaults = OutputPaths::default();
    OutputPaths {
        json: dir.join(defaults.json),
        csv: dir.join(defaults.csv),
        html: dir.join(defaults.html),
    }
}

fn parameters(query: QuerySpec, paths: OutputPaths) -> ExportParameters {
    ExportParameters {
        query,
        targets: files::targets(&paths, b','),
        on_search_error: SearchFailurePolicy::default(),
    }
}

fn read_json(path: &Path) -> Vec<Value> {
    let content = fs::read_to_string(path).expect("json output");
    serde_json::from_str::<Value>(&content)
        .expect("valid json")
        .as_array()
        .expect("array of records")
        .clone()
}

fn json_ids(path: &Path) -> Vec<String> {
    read_json(path)
        .iter()
        .map(|row| row["_id"].as_str().expect("string id").to_string())
        .collect()
}

#[tokio::test]
async fn should_export_two_pages_then_stop_on_empty_page() {
    let dir = tempfile::tempdir().unwrap();
    let paths = output_paths(dir.path());
    let service = Arc::new(MemoryScroll::new().with_index("logs", records(&["a", "b", "c", "d"])));

    let report = run(service.clone(), parameters(query(&["logs"], 2), paths.clone()))
        .await
        .expect("export");

    assert_eq!(report.count, 4);
    // two full pages, then the empty one
    assert_eq!(report.pages, 3);
    assert!(paths.json.exists());
    assert!(paths.csv.exists());
    assert!(paths.html.exists());
    assert_eq!(json_ids(&paths.json), ["a", "b", "c", "d"]);
    assert_eq!(service.released().len(), 1);
    assert_eq!(service.open_contexts(), 0);
}

#[tokio::test]
async fn should_report_the_files_actually_written() {
    let dir = tempfile::tempdir().unwrap();
    let paths = output_paths(dir.path());
    let service = MemoryScroll::new().with_index("logs", records(&["a"]));

    let mut parameters = parameters(query(&["logs"], 10), paths.clone());
    let elsewhere = dir.path().join("elsewhere.csv");
    parameters.targets[1].path = elsewhere.clone();

    let report = service.export_documents(parameters).await.expect("export");

    let written: Vec<(&str, PathBuf)> = report
        .outputs
        .iter()
        .map(|output| (output.format, output.path.clone()))
        .collect();
    assert_eq!(
        written,
        [
            ("json", paths.json.clone()),
            ("csv", elsewhere.clone()),
            ("html", paths.html.clone()),
        ]
    );
    assert!(elsewhere.exists());
    assert!(!paths.csv.exists());
    assert!(report.to_string().contains(&format!("CSV: {}", elsewhere.display())));
}

#[tokio::test]
async fn should_retrieve_every_record_whatever_the_page_size() {
    let ids: Vec<String> = (0..23).map(|n| format!("doc-{}", n)).collect();
    let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();

    for page_size in 1..=25u64 {
        let dir = tempfile::tempdir().unwrap();
        let paths = output_paths(dir.path());
        let service = MemoryScroll::new().with_index("logs", records(&id_refs));

        let report = service
            .export_documents(parameters(query(&["logs"], page_size), paths.clone()))
            .await
            .expect("export");

        let expected_pages = (ids.len() as u64 + page_size - 1) / page_size + 1;
        assert_eq!(report.count, ids.len(), "page size {}", page_size);
        assert_eq!(report.pages as u64, expected_pages, "page size {}", page_size);
        assert_eq!(json_ids(&paths.json), ids);
    }
}

#[tokio::test]
async fn should_always_submit_latest_cursor() {
    let dir = tempfile::tempdir().unwrap();
    let paths = output_paths(dir.path());
    let service = MemoryScroll::new()
        .with_index("logs", records(&["a", "b", "c", "d", "e"]))
        .rotate_cursor(true);

    // A stale cursor would be rejected by the service and fail the export.
    let report = service
        .export_documents(parameters(query(&["logs"], 2), paths))
        .await
        .expect("export");
    assert_eq!(report.count, 5);

    let submitted = service.submitted();
    assert_eq!(submitted.len(), 3);
    let mut unique = submitted.clone();
    unique.dedup();
    assert_eq!(unique, submitted);
    assert_eq!(service.released().len(), 1);
    assert_eq!(service.open_contexts(), 0);
}

#[tokio::test]
async fn should_keep_repeated_records() {
    let dir = tempfile::tempdir().unwrap();
    let paths = output_paths(dir.path());
    let service = MemoryScroll::new().with_index("logs", records(&["a", "b", "a", "a"]));

    let report = service
        .export_documents(parameters(query(&["logs"], 3), paths.clone()))
        .await
        .expect("export");

    assert_eq!(report.count, 4);
    assert_eq!(json_ids(&paths.json), ["a", "b", "a", "a"]);
}

#[tokio::test]
async fn should_append_indices_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let paths = output_paths(dir.path());
    let service = MemoryScroll::new()
        .with_index("first", records(&["a", "b", "c"]))
        .with_index("second", vec![])
        .with_index("third", records(&["d"]));

    let report = service
        .export_documents(parameters(query(&["first", "second", "third"], 2), paths.clone()))
        .await
        .expect("export");

    assert_eq!(report.count, 4);
    let counts: Vec<usize> = report.indices.iter().map(|index| index.count).collect();
    assert_eq!(counts, [3, 0, 1]);
    assert_eq!(json_ids(&paths.json), ["a", "b", "c", "d"]);
    assert_eq!(service.released().len(), 3);
}

#[tokio::test]
async fn should_write_aligned_csv_and_faithful_json() {
    let dir = tempfile::tempdir().unwrap();
    let paths = output_paths(dir.path());
    let service = MemoryScroll::new().with_index(
        "logs",
        vec![
            Record::from_source("a", json!({"host": "h1", "status": 200})),
            Record::from_source("b", json!({"status": null, "tags": ["x"]})),
            Record::from_source("c", json!({})),
        ],
    );

    service
        .export_documents(parameters(query(&["logs"], 2), paths.clone()))
        .await
        .expect("export");

    let mut reader = csv::Reader::from_path(&paths.csv).expect("csv output");
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers, vec!["_id", "host", "status", "tags"]);
    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0], vec!["a", "h1", "200", ""]);
    assert_eq!(rows[1], vec!["b", "", "", r#"["x"]"#]);
    assert_eq!(rows[2], vec!["c", "", "", ""]);

    let json = read_json(&paths.json);
    assert_eq!(json.len(), 3);
    assert_eq!(json[0], json!({"_id": "a", "host": "h1", "status": 200}));
    assert_eq!(json[1], json!({"_id": "b", "status": null, "tags": ["x"]}));
    assert_eq!(json[2], json!({"_id": "c"}));
}

#[tokio::test]
async fn should_discard_everything_on_search_failure() {
    let dir = tempfile::tempdir().unwrap();
    let paths = output_paths(dir.path());
    let service = MemoryScroll::new()
        .with_index("logs", records(&["a", "b", "c", "d", "e"]))
        .fail_on_request(2);

    let res = service
        .export_documents(parameters(query(&["logs"], 1), paths.clone()))
        .await;

    match res {
        Err(Error::Search { index, count, .. }) => {
            assert_eq!(index, "logs");
            assert_eq!(count, 2);
        }
        other => panic!("expected a search error, got {:?}", other),
    }
    assert!(!paths.json.exists());
    assert!(!paths.csv.exists());
    assert!(!paths.html.exists());
    // The context is released even though the export failed.
    assert_eq!(service.released().len(), 1);
    assert_eq!(service.open_contexts(), 0);
}

#[tokio::test]
async fn should_export_partial_table_when_asked() {
    let dir = tempfile::tempdir().unwrap();
    let paths = output_paths(dir.path());
    let service = MemoryScroll::new()
        .with_index("logs", records(&["a", "b", "c", "d", "e"]))
        .fail_on_request(2);

    let res = service
        .export_documents(ExportParameters {
            on_search_error: SearchFailurePolicy::Export,
            ..parameters(query(&["logs"], 1), paths.clone())
        })
        .await;

    match res {
        Err(Error::Interrupted { report, source }) => {
            assert_eq!(report.count, 2);
            assert!(matches!(*source, Error::Search { .. }));
        }
        other => panic!("expected an interrupted export, got {:?}", other),
    }
    assert_eq!(json_ids(&paths.json), ["a", "b"]);
    assert!(paths.csv.exists());
    assert!(paths.html.exists());
}

#[tokio::test]
async fn should_report_each_failed_export_and_write_the_others() {
    let dir = tempfile::tempdir().unwrap();
    let paths = OutputPaths {
        csv: dir.path().join("missing").join("object.csv"),
        ..output_paths(dir.path())
    };
    let service = MemoryScroll::new().with_index("logs", records(&["a"]));

    let res = service
        .export_documents(parameters(query(&["logs"], 10), paths.clone()))
        .await;

    match res {
        Err(Error::Export { failures }) => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].format, "csv");
            assert_eq!(failures[0].path, paths.csv);
        }
        other => panic!("expected an export error, got {:?}", other),
    }
    assert!(paths.json.exists());
    assert!(paths.html.exists());
}

struct Unreachable;

#[async_trait]
impl Remote for Unreachable {
    type Conn = MemoryScroll;

    async fn conn(self) -> Result<Self::Conn, RemoteError> {
        Err(RemoteError::Connection {
            source: "connection refused".into(),
        })
    }
}

#[tokio::test]
async fn should_not_create_files_when_connection_fails() {
    let dir = tempfile::tempdir().unwrap();
    let paths = output_paths(dir.path());

    let res = run(Unreachable, parameters(query(&["logs"], 10), paths.clone())).await;

    assert!(matches!(res, Err(Error::Connection { .. })));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn should_fail_on_unknown_index() {
    let dir = tempfile::tempdir().unwrap();
    let paths = output_paths(dir.path());
    let service = MemoryScroll::new();

    let res = service
        .export_documents(parameters(query(&["nope"], 10), paths))
        .await;

    assert!(matches!(res, Err(Error::Search { .. })));
    assert!(service.released().is_empty());
}
