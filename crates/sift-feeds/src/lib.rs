//! sift-feeds — remote collection sources and the paginated fetcher.
//!
//! A [`CollectionSource`] returns one raw page from a remote collection. The
//! [`PaginatedFetcher`] turns that raw page into a normalised
//! [`sift_core::PaginatedResponse`], and a [`SearchSession`] adds a page cache
//! and last-request-wins ordering on top.

pub mod error;
pub mod fetcher;
pub mod http;
pub mod session;

use sift_core::SortOrder;
use std::future::Future;

pub use error::{FetchError, SourceError};
pub use fetcher::{normalize, FetchParams, PaginatedFetcher};
pub use http::HttpSource;
pub use session::{PageOutcome, SearchSession};

/// One request for a page of the remote collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    pub offset: usize,
    pub limit: usize,
    pub sort: SortOrder,
    /// Filter parameters, already flattened; list values repeat the name.
    pub params: Vec<(String, String)>,
}

/// A page exactly as the remote returned it, before normalisation.
#[derive(Debug, Clone, PartialEq)]
pub enum RawPayload {
    Structured(serde_json::Value),
    /// A string encoding that still needs a parse step.
    Text(String),
}

/// Trait implemented by each remote collection the fetcher can page through.
pub trait CollectionSource: Send + Sync {
    fn list(&self, request: &ListRequest) -> impl Future<Output = Result<RawPayload, SourceError>> + Send;
}
