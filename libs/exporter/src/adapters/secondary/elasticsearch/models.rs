//! ES response for scroll queries, these only deserialize the fields that we use.
use serde::Deserialize;
use serde_json::Value;

use crate::domain::model::record::{Cursor, Page, Record};

/// ES response for a search or scroll request.
#[derive(Debug, Deserialize)]
pub struct ElasticsearchScrollResponse {
    #[serde(rename = "_scroll_id")]
    pub scroll_id: Option<String>,
    pub hits: ElasticsearchHits,
}

#[derive(Debug, Deserialize)]
pub struct ElasticsearchHits {
    #[serde(default)]
    pub total: Option<ElasticsearchTotal>,
    pub hits: Vec<ElasticsearchHit>,
}

/// ES 7 reports `{"value": .., "relation": ..}`, ES 6 a plain number.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ElasticsearchTotal {
    Object { value: u64, relation: Option<String> },
    Count(u64),
}

impl ElasticsearchTotal {
    pub fn value(&self) -> u64 {
        match self {
            ElasticsearchTotal::Object { value, .. } => *value,
            ElasticsearchTotal::Count(count) => *count,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ElasticsearchHit {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_source", default)]
    pub source: Value,
}

impl ElasticsearchScrollResponse {
    /// Consume the response into a page, if it carries a scroll id.
    pub fn into_page(self) -> Option<Page> {
        let cursor = Cursor::new(self.scroll_id?);
        let total = self.hits.total.as_ref().map(ElasticsearchTotal::value);
        let records = self
            .hits
            .hits
            .into_iter()
            .map(|hit| Record::from_source(hit.id, hit.source))
            .collect();
        Some(Page {
            cursor,
            total,
            records,
        })
    }
}
