//! An in-memory search service, serving pre-built indices through the `Scroll` port.
use async_trait::async_trait;
use snafu::Snafu;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

use crate::domain::model::{
    query::QuerySpec,
    record::{Cursor, Page, Record},
};
use crate::domain::ports::secondary::{
    remote::{Error as RemoteError, Remote},
    scroll::{Error as ScrollError, Scroll},
};

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Unknown Index: {}", index))]
    UnknownIndex { index: String },

    #[snafu(display("Unknown Or Stale Scroll Id: {}", cursor))]
    UnknownCursor { cursor: String },

    #[snafu(display("Injected Failure on scroll request #{}", request))]
    Injected { request: usize },
}

#[derive(Debug)]
struct Context {
    pages: VecDeque<Vec<Record>>,
    total: u64,
}

#[derive(Debug, Default)]
struct State {
    contexts: HashMap<Cursor, Context>,
    generation: usize,
    scroll_requests: usize,
    submitted: Vec<Cursor>,
    released: Vec<Cursor>,
}

impl State {
    fn next_cursor(&mut self, index: &str) -> Cursor {
        self.generation += 1;
        Cursor::new(format!("{}-{}", index, self.generation))
    }
}

/// Serves the records of each index in pages of the requested size.
///
/// Only the latest cursor of a context is accepted. With `rotate_cursor`, every
/// response carries a new cursor, and the previous one becomes stale.
#[derive(Debug, Default)]
pub struct MemoryScroll {
    indices: HashMap<String, Vec<Record>>,
    rotate_cursor: bool,
    fail_on_request: Option<usize>,
    state: Mutex<State>,
}

impl MemoryScroll {
    pub fn new() -> Self {
        MemoryScroll::default()
    }

    pub fn with_index<S: Into<String>>(mut self, index: S, records: Vec<Record>) -> Self {
        self.indices.insert(index.into(), records);
        self
    }

    pub fn rotate_cursor(mut self, rotate: bool) -> Self {
        self.rotate_cursor = rotate;
        self
    }

    /// Fail the n-th scroll continuation request (counting from 1).
    pub fn fail_on_request(mut self, request: usize) -> Self {
        self.fail_on_request = Some(request);
        self
    }

    /// Every cursor submitted to `next_page`, in order.
    pub fn submitted(&self) -> Vec<Cursor> {
        self.lock().submitted.clone()
    }

    /// Every cursor passed to `clear_scroll`, in order.
    pub fn released(&self) -> Vec<Cursor> {
        self.lock().released.clone()
    }

    /// Contexts opened and not yet released.
    pub fn open_contexts(&self) -> usize {
        self.lock().contexts.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Scroll for MemoryScroll {
    async fn open_scroll(&self, index: &str, query: &QuerySpec) -> Result<Page, ScrollError> {
        let records = self
            .indices
            .get(index)
            .ok_or_else(|| ScrollError::ScrollOpening {
                index: index.to_string(),
                source: Box::new(Error::UnknownIndex {
                    index: index.to_string(),
                }),
            })?;

        let mut pages: VecDeque<Vec<Record>> = records
            .chunks(query.page_size() as usize)
            .map(<[Record]>::to_vec)
            .collect();
        let first = pages.pop_front().unwrap_or_default();
        let total = records.len() as u64;

        let mut state = self.lock();
        let cursor = state.next_cursor(index);
        state
            .contexts
            .insert(cursor.clone(), Context { pages, total });

        Ok(Page {
            cursor,
            total: Some(total),
            records: first,
        })
    }

    async fn next_page(&self, cursor: &Cursor, _keep_alive: &str) -> Result<Page, ScrollError> {
        let mut state = self.lock();
        state.scroll_requests += 1;
        state.submitted.push(cursor.clone());

        if self.fail_on_request == Some(state.scroll_requests) {
            return Err(ScrollError::ScrollContinuation {
                source: Box::new(Error::Injected {
                    request: state.scroll_requests,
                }),
            });
        }

        let mut context =
            state
                .contexts
                .remove(cursor)
                .ok_or_else(|| ScrollError::ScrollContinuation {
                    source: Box::new(Error::UnknownCursor {
                        cursor: cursor.to_string(),
                    }),
                })?;

        let records = context.pages.pop_front().unwrap_or_default();
        let total = context.total;
        let next = if self.rotate_cursor {
            let index = cursor
                .as_str()
                .rsplit_once('-')
                .map(|(index, _)| index.to_string())
                .unwrap_or_default();
            state.next_cursor(&index)
        } else {
            cursor.clone()
        };
        state.contexts.insert(next.clone(), context);

        Ok(Page {
            cursor: next,
            total: Some(total),
            records,
        })
    }

    async fn clear_scroll(&self, cursor: &Cursor) -> Result<(), ScrollError> {
        let mut state = self.lock();
        state.released.push(cursor.clone());
        state.contexts.remove(cursor);
        Ok(())
    }
}

/// A shared in-memory service is always reachable, and stays inspectable after the
/// export consumed the remote.
#[async_trait]
impl Remote for Arc<MemoryScroll> {
    type Conn = Arc<MemoryScroll>;

    async fn conn(self) -> Result<Self::Conn, RemoteError> {
        Ok(self)
    }
}
