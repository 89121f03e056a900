use snafu::{ResultExt, Snafu};
use tracing::{error, info, warn};

use exporter::adapters::secondary::elasticsearch::remote::{self, connection_pool};
use exporter::adapters::secondary::files;
use exporter::domain::model::{error::Error as ModelError, report::ExportReport};
use exporter::domain::ports::primary::export_documents::{self, ExportParameters};

use crate::settings::esexport::{Error as SettingsError, Settings};
use crate::utils::logger::{logger_init, Error as LoggerError};

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Settings (Configuration or CLI) Error: {}", source))]
    Settings { source: SettingsError },

    #[snafu(display("Logger Initialization Error: {}", source))]
    InitLog { source: LoggerError },

    #[snafu(display("Elasticsearch Connection Pool {}", source))]
    ElasticsearchConnection { source: remote::Error },

    #[snafu(display("{}", source))]
    Export { source: ModelError },

    #[snafu(display("Execution Error {}", source))]
    Execution { source: Box<dyn std::error::Error> },
}

/// Build the export parameters out of the settings.
pub fn parameters(settings: &Settings) -> Result<ExportParameters, Error> {
    let query = settings.query_spec().context(SettingsSnafu)?;
    let delimiter = settings.delimiter().context(SettingsSnafu)?;
    let targets = files::targets(&settings.output_paths(), delimiter);
    Ok(ExportParameters {
        query,
        targets,
        on_search_error: settings.on_search_error,
    })
}

/// Export the configured indices from elasticsearch into the output files.
pub async fn export(settings: Settings) -> Result<ExportReport, Error> {
    let parameters = parameters(&settings)?;

    let pool = connection_pool(settings.elasticsearch).context(ElasticsearchConnectionSnafu)?;
    info!("Trying to connect to elasticsearch at {}", pool.url());

    export_documents::run(pool, parameters)
        .await
        .context(ExportSnafu)
}

pub async fn run(settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let _guard = logger_init(settings.logging.path.as_ref()).context(InitLogSnafu)?;

    match export(settings).await {
        Ok(report) => {
            info!("{}", report);
            println!("{}", report);
            Ok(())
        }
        Err(err) => {
            if let Error::Export {
                source: ModelError::Interrupted { report, .. },
            } = &err
            {
                warn!("partial export: {}", report);
                println!("{}", report);
            }
            error!("{}", err);
            Err(Box::new(err))
        }
    }
}
