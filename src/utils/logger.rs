use snafu::{ResultExt, Snafu};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry};

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Could not init log file: {}", source))]
    InitLog { source: std::io::Error },

    #[snafu(display("Could not setup log tracer: {}", details))]
    LogTracer { details: String },

    #[snafu(display("Could not set global tracing subscriber: {}", details))]
    Subscriber { details: String },
}

/// Install a bunyan formatted subscriber, writing to `path` if given, or stderr.
///
/// If `path` is a directory, logs go to 'esexport.log', rotated daily.
/// The returned guard must be kept alive until the program exits, so pending
/// logs are flushed.
pub fn logger_init<P: AsRef<Path>>(path: Option<P>) -> Result<WorkerGuard, Error> {
    LogTracer::init().map_err(|err| Error::LogTracer {
        details: err.to_string(),
    })?;

    // Filter traces based on the RUST_LOG env var, or, if it's not set,
    // default to info for everything.
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_owned());

    let app_name = concat!(env!("CARGO_PKG_NAME"), "-", env!("CARGO_PKG_VERSION")).to_string();

    let path: Option<&Path> = path.as_ref().map(|path| AsRef::<Path>::as_ref(path));
    let (non_blocking, guard) = match path {
        Some(path) if path.is_dir() => {
            tracing_appender::non_blocking(tracing_appender::rolling::daily(path, "esexport.log"))
        }
        Some(path) => tracing_appender::non_blocking(
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .context(InitLogSnafu)?,
        ),
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    let bunyan_formatting_layer = BunyanFormattingLayer::new(app_name, non_blocking);
    let subscriber = Registry::default()
        .with(EnvFilter::new(&filter))
        .with(JsonStorageLayer)
        .with(bunyan_formatting_layer);
    tracing::subscriber::set_global_default(subscriber).map_err(|err| Error::Subscriber {
        details: err.to_string(),
    })?;
    Ok(guard)
}
