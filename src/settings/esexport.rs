/// This module contains the definition for esexport configuration and command line arguments.
use config::Config;
use serde::de::{Deserializer, Error as DeError};
use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu};
use std::path::PathBuf;
use structopt::StructOpt;

use exporter::adapters::secondary::elasticsearch::ElasticsearchStorageConfig;
use exporter::domain::model::{
    error::Error as ModelError,
    query::{QuerySpec, TimeRange},
    report::OutputPaths,
};
use exporter::domain::ports::primary::export_documents::SearchFailurePolicy;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Config Source Error: {}", source))]
    ConfigSource { source: common::config::Error },

    #[snafu(display("Config Merge Error: {} [{}]", msg, source))]
    ConfigMerge {
        msg: String,
        source: config::ConfigError,
    },

    #[snafu(display("Invalid Configuration: {}", msg))]
    Invalid { msg: String },

    #[snafu(display("Invalid Query Configuration: {}", source))]
    InvalidQuery { source: ModelError },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Logging {
    /// A file, or a directory in which 'esexport.log' is created. Logs go to stderr
    /// when missing.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    /// Indices are exported in order, into a single table.
    #[serde(deserialize_with = "deserialize_indices")]
    pub indices: Vec<String>,
    pub page_size: u64,
    /// How long elasticsearch keeps the scroll context between two requests.
    pub scroll: String,
    pub field: String,
    pub format: String,
    #[serde(default)]
    pub gte: Option<String>,
    #[serde(default)]
    pub lte: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Output {
    pub json: PathBuf,
    pub csv: PathBuf,
    pub html: PathBuf,
    pub delimiter: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub mode: Option<String>,
    #[serde(default)]
    pub logging: Logging,
    pub elasticsearch: ElasticsearchStorageConfig,
    pub query: Query,
    pub output: Output,
    #[serde(default)]
    pub on_search_error: SearchFailurePolicy,
}

#[derive(Debug, StructOpt)]
#[structopt(
    name = "esexport",
    about = "Export the documents of Elasticsearch indices to JSON, CSV and HTML"
)]
pub struct Opts {
    /// Defines the config directory
    ///
    /// This directory must contain 'elasticsearch' and 'esexport' subdirectories.
    #[structopt(parse(from_os_str), short = "c", long = "config-dir")]
    pub config_dir: PathBuf,

    /// Defines the run mode in {testing, dev, prod, ...}
    ///
    /// If no run mode is provided, a default behavior will be used.
    #[structopt(short = "m", long = "run-mode")]
    pub run_mode: Option<String>,

    /// Override settings values using key=value
    #[structopt(short = "s", long = "setting")]
    pub settings: Vec<String>,

    #[structopt(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, StructOpt)]
pub enum Command {
    /// Execute esexport with the given configuration
    Run,
    /// Prints esexport's configuration
    Config,
}

impl Settings {
    // Read the configuration from <config-dir>/esexport and <config-dir>/elasticsearch
    pub fn new(opts: &Opts) -> Result<Self, Error> {
        let mut builder = Config::builder();

        builder = builder.add_source(
            common::config::config_from(
                opts.config_dir.as_ref(),
                &["esexport", "elasticsearch"],
                opts.run_mode.as_deref(),
                "ESEXPORT",
                opts.settings.clone(),
            )
            .context(ConfigSourceSnafu)?,
        );

        let config = builder.build().context(ConfigMergeSnafu {
            msg: String::from("Cannot build the configuration from sources"),
        })?;

        config.try_deserialize().context(ConfigMergeSnafu {
            msg: String::from("Cannot convert configuration into esexport settings"),
        })
    }

    pub fn query_spec(&self) -> Result<QuerySpec, Error> {
        QuerySpec::new(
            self.query.indices.clone(),
            self.query.page_size,
            self.query.scroll.clone(),
            TimeRange {
                field: self.query.field.clone(),
                format: self.query.format.clone(),
                gte: self.query.gte.clone(),
                lte: self.query.lte.clone(),
            },
        )
        .context(InvalidQuerySnafu)
    }

    pub fn output_paths(&self) -> OutputPaths {
        OutputPaths {
            json: self.output.json.clone(),
            csv: self.output.csv.clone(),
            html: self.output.html.clone(),
        }
    }

    /// The CSV delimiter, which must be a single ASCII character.
    pub fn delimiter(&self) -> Result<u8, Error> {
        match self.output.delimiter.as_bytes() {
            [byte] if byte.is_ascii() => Ok(*byte),
            _ => Err(Error::Invalid {
                msg: format!(
                    "CSV delimiter must be a single ASCII character, got '{}'",
                    self.output.delimiter
                ),
            }),
        }
    }
}

// Indices are a list in configuration files, but a comma separated string is easier
// to give on the command line (-s query.indices=a,b).
fn deserialize_indices<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Indices {
        List(Vec<String>),
        Joined(String),
    }

    let indices = match Indices::deserialize(deserializer)? {
        Indices::List(indices) => indices,
        Indices::Joined(joined) => joined
            .split(',')
            .map(|index| index.trim().to_string())
            .filter(|index| !index.is_empty())
            .collect(),
    };

    if indices.is_empty() {
        Err(D::Error::custom("at least one index is required"))
    } else {
        Ok(indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(settings: Vec<String>) -> Opts {
        Opts {
            config_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config"),
            run_mode: None,
            settings,
            cmd: Command::Run,
        }
    }

    #[test]
    fn should_return_ok_with_default_config_dir() {
        let settings = Settings::new(&opts(vec![]));
        assert!(
            settings.is_ok(),
            "Expected Ok, Got an Err: {}",
            settings.unwrap_err().to_string()
        );
        let settings = settings.unwrap();
        assert_eq!(settings.mode, None);
        assert_eq!(settings.query.indices, ["rasa-prd-all"]);
        assert_eq!(settings.query.page_size, 1000);
        assert_eq!(settings.query.scroll, "60s");
        assert_eq!(settings.on_search_error, SearchFailurePolicy::Discard);
        assert_eq!(settings.output_paths(), OutputPaths::default());
        assert!(settings.query_spec().is_ok());
    }

    #[test]
    fn should_override_settings_with_command_line() {
        let settings = Settings::new(&opts(vec![
            String::from("elasticsearch.url=http://localhost:9999"),
            String::from("query.indices=logs-a, logs-b"),
            String::from("query.page_size=50"),
            String::from("output.delimiter=;"),
            String::from("on_search_error=export"),
        ]))
        .expect("settings");

        assert_eq!(settings.elasticsearch.url.as_str(), "http://localhost:9999/");
        assert_eq!(settings.query.indices, ["logs-a", "logs-b"]);
        assert_eq!(settings.query.page_size, 50);
        assert_eq!(settings.delimiter().unwrap(), b';');
        assert_eq!(settings.on_search_error, SearchFailurePolicy::Export);
    }

    #[test]
    fn should_reject_invalid_delimiter_and_query() {
        let settings = Settings::new(&opts(vec![
            String::from("output.delimiter=||"),
            String::from("query.page_size=0"),
        ]))
        .expect("settings");

        assert!(matches!(settings.delimiter(), Err(Error::Invalid { .. })));
        assert!(matches!(
            settings.query_spec(),
            Err(Error::InvalidQuery { .. })
        ));
    }

    #[test]
    fn should_use_testing_run_mode() {
        let settings = Settings::new(&Opts {
            run_mode: Some(String::from("testing")),
            ..opts(vec![])
        })
        .expect("settings");

        assert_eq!(settings.mode.as_deref(), Some("testing"));
        assert_eq!(settings.query.page_size, 10);
    }

    #[test]
    fn should_never_print_password() {
        let settings = Settings::new(&opts(vec![
            String::from("elasticsearch.username=reader"),
            String::from("elasticsearch.password=s3cr3t"),
        ]))
        .expect("settings");

        assert_eq!(settings.elasticsearch.password.as_deref(), Some("s3cr3t"));
        let printed = serde_json::to_string_pretty(&settings).unwrap();
        assert!(printed.contains("reader"));
        assert!(!printed.contains("s3cr3t"));
    }
}
