use async_trait::async_trait;
use snafu::Snafu;
use std::sync::Arc;

use crate::domain::model::query::QuerySpec;
use crate::domain::model::record::{Cursor, Page};

/// This port defines a paginated search session (a scroll) over a single index.
#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Scroll Opening Error on {}: {}", index, source))]
    ScrollOpening {
        index: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[snafu(display("Scroll Continuation Error: {}", source))]
    ScrollContinuation {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[snafu(display("Scroll Release Error: {}", source))]
    ScrollRelease {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

#[async_trait]
pub trait Scroll {
    /// Run the initial search on `index`, returning the first page and its cursor.
    async fn open_scroll(&self, index: &str, query: &QuerySpec) -> Result<Page, Error>;

    /// Fetch the page following `cursor`, extending the context by `keep_alive`.
    async fn next_page(&self, cursor: &Cursor, keep_alive: &str) -> Result<Page, Error>;

    /// Free the server side context behind `cursor`.
    async fn clear_scroll(&self, cursor: &Cursor) -> Result<(), Error>;
}

#[async_trait]
impl<T: ?Sized> Scroll for Box<T>
where
    T: Scroll + Send + Sync,
{
    async fn open_scroll(&self, index: &str, query: &QuerySpec) -> Result<Page, Error> {
        (**self).open_scroll(index, query).await
    }

    async fn next_page(&self, cursor: &Cursor, keep_alive: &str) -> Result<Page, Error> {
        (**self).next_page(cursor, keep_alive).await
    }

    async fn clear_scroll(&self, cursor: &Cursor) -> Result<(), Error> {
        (**self).clear_scroll(cursor).await
    }
}

#[async_trait]
impl<T: ?Sized> Scroll for Arc<T>
where
    T: Scroll + Send + Sync,
{
    async fn open_scroll(&self, index: &str, query: &QuerySpec) -> Result<Page, Error> {
        (**self).open_scroll(index, query).await
    }

    async fn next_page(&self, cursor: &Cursor, keep_alive: &str) -> Result<Page, Error> {
        (**self).next_page(cursor, keep_alive).await
    }

    async fn clear_scroll(&self, cursor: &Cursor) -> Result<(), Error> {
        (**self).clear_scroll(cursor).await
    }
}
