//! Search session — page cache plus last-request-wins ordering.
//!
//! Every load names the query key it belongs to. Issuing a load for a new key
//! makes that key current; a response that arrives for any other key is
//! dropped as [`PageOutcome::Superseded`] and never cached. There are no
//! cancellation tokens: the older fetch still runs to completion, its result
//! is just ignored.
//!
//! The cache only ever holds pages of the current key. Switching keys evicts
//! everything cached for the previous one.

use crate::error::FetchError;
use crate::fetcher::{FetchParams, PaginatedFetcher};
use crate::CollectionSource;
use serde::de::DeserializeOwned;
use sift_core::PaginatedResponse;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// What a [`SearchSession::load`] produced.
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome<T> {
    /// Fetched from the remote just now.
    Fresh(PaginatedResponse<T>),
    /// Served from the page cache without I/O.
    Cached(PaginatedResponse<T>),
    /// A newer key was loaded while this fetch was in flight.
    Superseded,
}

impl<T> PageOutcome<T> {
    pub fn page(&self) -> Option<&PaginatedResponse<T>> {
        match self {
            PageOutcome::Fresh(page) | PageOutcome::Cached(page) => Some(page),
            PageOutcome::Superseded => None,
        }
    }

    pub fn into_page(self) -> Option<PaginatedResponse<T>> {
        match self {
            PageOutcome::Fresh(page) | PageOutcome::Cached(page) => Some(page),
            PageOutcome::Superseded => None,
        }
    }

    pub fn is_superseded(&self) -> bool {
        matches!(self, PageOutcome::Superseded)
    }
}

#[derive(Debug)]
struct SessionState<T> {
    current: Option<String>,
    pages: HashMap<(String, usize), PaginatedResponse<T>>,
}

pub struct SearchSession<S, T> {
    fetcher: PaginatedFetcher<S>,
    state: Mutex<SessionState<T>>,
}

impl<S, T> SearchSession<S, T>
where
    S: CollectionSource,
    T: DeserializeOwned + Clone + Send,
{
    pub fn new(fetcher: PaginatedFetcher<S>) -> Self {
        Self {
            fetcher,
            state: Mutex::new(SessionState {
                current: None,
                pages: HashMap::new(),
            }),
        }
    }

    pub fn fetcher(&self) -> &PaginatedFetcher<S> {
        &self.fetcher
    }

    /// The key of the most recent load.
    pub async fn current_key(&self) -> Option<String> {
        self.state.lock().await.current.clone()
    }

    /// Load the page at `params.offset` for `key`, from cache when possible.
    ///
    /// Failed pages are returned but not cached, so the next load retries.
    pub async fn load(&self, key: &str, params: &FetchParams) -> Result<PageOutcome<T>, FetchError> {
        {
            let mut state = self.state.lock().await;
            if state.current.as_deref() != Some(key) {
                let before = state.pages.len();
                state.pages.retain(|(cached, _), _| cached == key);
                tracing::debug!(key, evicted = before - state.pages.len(), "query key changed");
                state.current = Some(key.to_string());
            }
            if let Some(page) = state.pages.get(&(key.to_string(), params.offset)) {
                tracing::debug!(key, offset = params.offset, "page cache hit");
                return Ok(PageOutcome::Cached(page.clone()));
            }
        }

        let page = self.fetcher.fetch_page::<T>(params).await?;

        let mut state = self.state.lock().await;
        if state.current.as_deref() != Some(key) {
            tracing::debug!(key, offset = params.offset, "dropping superseded page");
            return Ok(PageOutcome::Superseded);
        }
        if !page.is_error() {
            state.pages.insert((key.to_string(), params.offset), page.clone());
        }
        Ok(PageOutcome::Fresh(page))
    }

    /// Drop every cached page; the current key is kept.
    pub async fn invalidate(&self) {
        let mut state = self.state.lock().await;
        tracing::debug!(pages = state.pages.len(), "page cache cleared");
        state.pages.clear();
    }

    pub async fn cached_pages(&self) -> usize {
        self.state.lock().await.pages.len()
    }
}
