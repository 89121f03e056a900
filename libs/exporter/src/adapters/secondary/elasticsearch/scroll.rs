use async_trait::async_trait;

use super::ElasticsearchStorage;
use crate::domain::model::{
    query::QuerySpec,
    record::{Cursor, Page},
};
use crate::domain::ports::secondary::scroll::{Error as ScrollError, Scroll};

#[async_trait]
impl Scroll for ElasticsearchStorage {
    async fn open_scroll(&self, index: &str, query: &QuerySpec) -> Result<Page, ScrollError> {
        self.search_with_scroll(index, query)
            .await
            .map_err(|err| ScrollError::ScrollOpening {
                index: index.to_string(),
                source: Box::new(err),
            })
    }

    async fn next_page(&self, cursor: &Cursor, keep_alive: &str) -> Result<Page, ScrollError> {
        self.continue_scroll(cursor, keep_alive)
            .await
            .map_err(|err| ScrollError::ScrollContinuation {
                source: Box::new(err),
            })
    }

    async fn clear_scroll(&self, cursor: &Cursor) -> Result<(), ScrollError> {
        self.release_scroll(cursor)
            .await
            .map_err(|err| ScrollError::ScrollRelease {
                source: Box::new(err),
            })
    }
}
