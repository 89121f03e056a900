use elasticsearch::Elasticsearch;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::utils::deserialize::{deserialize_duration, serialize_duration};

pub(super) mod internal;
pub mod models;
pub mod query;
pub mod remote;
pub mod scroll;

/// A structure wrapping around the elasticsearch's client.
#[derive(Clone, Debug)]
pub struct ElasticsearchStorage {
    /// Elasticsearch client
    pub(crate) client: Elasticsearch,
    /// Client configuration
    pub config: ElasticsearchStorageConfig,
}

impl ElasticsearchStorage {
    pub fn new(client: Elasticsearch, config: ElasticsearchStorageConfig) -> Self {
        ElasticsearchStorage { client, config }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ElasticsearchStorageConfig {
    pub url: Url,
    /// Request timeout, in milliseconds.
    #[serde(
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub timeout: Duration,
    #[serde(default)]
    pub username: Option<String>,
    /// Never serialized, it should come from the environment.
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
}

impl Default for ElasticsearchStorageConfig {
    fn default() -> Self {
        ElasticsearchStorageConfig {
            url: Url::parse("http://localhost:9200").expect("valid default url"),
            timeout: Duration::from_secs(10),
            username: None,
            password: None,
        }
    }
}
