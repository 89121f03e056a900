use async_trait::async_trait;
use elasticsearch::auth::Credentials;
use elasticsearch::http::transport::{
    BuildError as TransportBuilderError, SingleNodeConnectionPool, TransportBuilder,
};
use elasticsearch::Elasticsearch;
use snafu::{ResultExt, Snafu};
use tracing::{info, warn};
use url::Url;

use super::{ElasticsearchStorage, ElasticsearchStorageConfig};
use crate::domain::ports::secondary::remote::{Error as RemoteError, Remote};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("Invalid URL: {}", details))]
    InvalidUrl { details: String },

    /// Elasticsearch Build Error
    #[snafu(display("Elasticsearch Connection Error: {}", source))]
    ElasticsearchConnection { source: TransportBuilderError },

    /// Elasticsearch unreachable
    #[snafu(display("Elasticsearch Unreachable at {}: {}", url, source))]
    ElasticsearchUnreachable {
        url: String,
        source: elasticsearch::Error,
    },

    /// Elasticsearch answered the info request with a failure
    #[snafu(display("Elasticsearch Info Request Failed with status {}", status))]
    ElasticsearchInfo { status: u16 },
}

/// Everything needed to open a session: the connection pool, and the credentials
/// and timeout taken from the configuration.
#[derive(Debug, Clone)]
pub struct ElasticsearchRemote {
    pool: SingleNodeConnectionPool,
    credentials: Option<(String, String)>,
    config: ElasticsearchStorageConfig,
}

impl ElasticsearchRemote {
    /// The endpoint, without credentials.
    pub fn url(&self) -> &Url {
        &self.config.url
    }
}

#[async_trait]
impl Remote for ElasticsearchRemote {
    type Conn = ElasticsearchStorage;

    /// Use the connection to create a client, and check the cluster answers.
    async fn conn(self) -> Result<Self::Conn, RemoteError> {
        let mut builder = TransportBuilder::new(self.pool)
            .disable_proxy()
            .timeout(self.config.timeout);
        if let Some((username, password)) = self.credentials {
            builder = builder.auth(Credentials::Basic(username, password));
        }
        let transport = builder
            .build()
            .context(ElasticsearchConnectionSnafu)
            .map_err(|err| RemoteError::Connection {
                source: Box::new(err),
            })?;
        let client = Elasticsearch::new(transport);

        let url = self.config.url.to_string();
        let response = client
            .info()
            .request_timeout(self.config.timeout)
            .send()
            .await
            .context(ElasticsearchUnreachableSnafu { url })
            .map_err(|err| RemoteError::Connection {
                source: Box::new(err),
            })?;

        let status = response.status_code();
        match status.as_u16() {
            401 | 403 => Err(RemoteError::Authentication {
                details: format!("credentials rejected by {} ({})", self.config.url, status),
            }),
            code if !status.is_success() => Err(RemoteError::Connection {
                source: Box::new(Error::ElasticsearchInfo { status: code }),
            }),
            _ => {
                info!("connected to elasticsearch at {}", self.config.url);
                Ok(ElasticsearchStorage::new(client, self.config))
            }
        }
    }
}

/// Prepare a connection to elasticsearch.
///
/// Credentials embedded in the URL are still honored, but they are removed from
/// the URL, and explicit `username` / `password` settings take precedence.
pub fn connection_pool(
    mut config: ElasticsearchStorageConfig,
) -> Result<ElasticsearchRemote, Error> {
    let (url, embedded) = strip_credentials(&config.url)?;
    if embedded.is_some() {
        warn!("credentials embedded in the elasticsearch url, prefer the ESEXPORT_ELASTICSEARCH_PASSWORD environment variable");
    }

    let credentials = match (config.username.clone(), config.password.clone()) {
        (Some(username), password) => Some((username, password.unwrap_or_default())),
        (None, Some(_)) => {
            warn!("elasticsearch password given without username, ignoring it");
            embedded
        }
        (None, None) => embedded,
    };

    config.url = url.clone();
    Ok(ElasticsearchRemote {
        pool: SingleNodeConnectionPool::new(url),
        credentials,
        config,
    })
}

fn strip_credentials(url: &Url) -> Result<(Url, Option<(String, String)>), Error> {
    if url.username().is_empty() {
        return Ok((url.clone(), None));
    }

    let credentials = (
        url.username().to_string(),
        url.password().unwrap_or_default().to_string(),
    );
    let mut stripped = url.clone();
    stripped
        .set_username("")
        .and_then(|_| stripped.set_password(None))
        .map_err(|_| Error::InvalidUrl {
            details: format!(
                "cannot remove credentials from {}",
                url.host_str().unwrap_or_default()
            ),
        })?;
    Ok((stripped, Some(credentials)))
}
