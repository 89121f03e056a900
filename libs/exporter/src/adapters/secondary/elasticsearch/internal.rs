use elasticsearch::http::response::Response;
use elasticsearch::{ClearScrollParts, ScrollParts, SearchParts};
use serde_json::json;
use snafu::{ResultExt, Snafu};
use tracing::debug;

use super::models::ElasticsearchScrollResponse;
use super::query::build_scroll_query;
use super::ElasticsearchStorage;
use crate::domain::model::{
    query::QuerySpec,
    record::{Cursor, Page},
};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Elasticsearch Client Error
    #[snafu(display("Elasticsearch Error: {} [{}]", source, details))]
    ElasticsearchClient {
        details: String,
        source: elasticsearch::Error,
    },

    /// Elasticsearch answered with a non success status
    #[snafu(display("Elasticsearch Response: {} {}: {}", details, status, body))]
    ElasticsearchFailedStatus {
        details: String,
        status: u16,
        body: String,
    },

    /// Elasticsearch Deserialization Error
    #[snafu(display("JSON Elasticsearch Deserialization Error: {} [{}]", source, details))]
    ElasticsearchDeserialization {
        details: String,
        source: elasticsearch::Error,
    },

    /// The response does not carry a scroll id
    #[snafu(display("Elasticsearch Response Missing Scroll Id: {}", details))]
    ElasticsearchResponseMissingScrollId { details: String },
}

impl ElasticsearchStorage {
    pub(super) async fn search_with_scroll(
        &self,
        index: &str,
        query: &QuerySpec,
    ) -> Result<Page, Error> {
        let body = build_scroll_query(query);
        debug!("initial search on {}: {}", index, body);

        let response = self
            .client
            .search(SearchParts::Index(&[index]))
            .scroll(query.keep_alive())
            .request_timeout(self.config.timeout)
            .body(body)
            .send()
            .await
            .context(ElasticsearchClientSnafu {
                details: format!("cannot search index {}", index),
            })?;

        read_page(response, format!("search on {}", index)).await
    }

    pub(super) async fn continue_scroll(
        &self,
        cursor: &Cursor,
        keep_alive: &str,
    ) -> Result<Page, Error> {
        let response = self
            .client
            .scroll(ScrollParts::None)
            .request_timeout(self.config.timeout)
            .body(json!({
                "scroll": keep_alive,
                "scroll_id": cursor.as_str(),
            }))
            .send()
            .await
            .context(ElasticsearchClientSnafu {
                details: String::from("cannot continue scroll"),
            })?;

        read_page(response, String::from("scroll")).await
    }

    pub(super) async fn release_scroll(&self, cursor: &Cursor) -> Result<(), Error> {
        let response = self
            .client
            .clear_scroll(ClearScrollParts::None)
            .request_timeout(self.config.timeout)
            .body(json!({ "scroll_id": [cursor.as_str()] }))
            .send()
            .await
            .context(ElasticsearchClientSnafu {
                details: String::from("cannot clear scroll"),
            })?;

        let status = response.status_code();
        // 404: the context already expired, there is nothing left to free.
        if status.is_success() || status.as_u16() == 404 {
            debug!("scroll context released ({})", status);
            Ok(())
        } else {
            Err(failed_status(response, String::from("clear scroll")).await)
        }
    }
}

async fn read_page(response: Response, details: String) -> Result<Page, Error> {
    if !response.status_code().is_success() {
        return Err(failed_status(response, details).await);
    }

    let body: ElasticsearchScrollResponse =
        response
            .json()
            .await
            .context(ElasticsearchDeserializationSnafu {
                details: details.clone(),
            })?;

    body.into_page()
        .ok_or(Error::ElasticsearchResponseMissingScrollId { details })
}

async fn failed_status(response: Response, details: String) -> Error {
    let status = response.status_code().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|err| format!("<unreadable body: {}>", err));
    Error::ElasticsearchFailedStatus {
        details,
        status,
        body,
    }
}
