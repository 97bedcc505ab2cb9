//! Paginated fetcher — one page from a [`CollectionSource`], normalised.
//!
//! Payload shapes accepted:
//! - an object carrying the item list under `items`, `results` or `data`,
//!   with optional `has_more`/`hasMore`, `total` and
//!   `filtered_total`/`filteredTotal`
//! - a bare array of items
//! - either of the above encoded as a JSON string, possibly twice
//!
//! Anything else becomes an empty page with `error` set. The remote "more
//! results" flag is ignored unless the fetcher was built to trust it; the
//! default is to infer `has_more` from a full page.

use crate::error::FetchError;
use crate::http::HttpSource;
use crate::{CollectionSource, ListRequest, RawPayload};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use sift_core::config::FetchConfig;
use sift_core::{PaginatedResponse, ServerParams, SortOrder};
use std::time::Duration;

/// Keys that may hold the item list, in lookup order.
const ITEM_KEYS: &[&str] = &["items", "results", "data"];

/// String-encoded payloads are unwrapped at most this many times.
const MAX_DECODE_DEPTH: usize = 3;

/// Arguments of one page fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchParams {
    pub offset: usize,
    pub limit: usize,
    pub sort: SortOrder,
    pub filter: ServerParams,
}

impl FetchParams {
    pub fn new(offset: usize, limit: usize) -> Self {
        Self {
            offset,
            limit,
            ..Self::default()
        }
    }

    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub fn filter(mut self, filter: ServerParams) -> Self {
        self.filter = filter;
        self
    }

    /// The same query, one page further on.
    pub fn at(&self, offset: usize) -> Self {
        Self {
            offset,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone)]
pub struct PaginatedFetcher<S> {
    source: S,
    trust_has_more: bool,
}

impl PaginatedFetcher<HttpSource> {
    /// An HTTP fetcher configured from the `[fetch]` section.
    pub fn from_config(cfg: &FetchConfig) -> Self {
        let source = HttpSource::new(&cfg.base_url, &cfg.list_path)
            .with_timeout(Duration::from_millis(cfg.timeout_ms));
        Self::new(source).trust_has_more(cfg.trust_has_more)
    }
}

impl<S: CollectionSource> PaginatedFetcher<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            trust_has_more: false,
        }
    }

    pub fn trust_has_more(mut self, trust: bool) -> Self {
        self.trust_has_more = trust;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch one page.
    ///
    /// Transport failures are returned as `Err`; a payload that cannot be
    /// understood is returned as an empty page with `error` set.
    pub async fn fetch_page<T: DeserializeOwned>(
        &self,
        params: &FetchParams,
    ) -> Result<PaginatedResponse<T>, FetchError> {
        if params.limit == 0 {
            return Err(FetchError::InvalidLimit);
        }
        let request = ListRequest {
            offset: params.offset,
            limit: params.limit,
            sort: params.sort,
            params: params.filter.to_query_pairs(),
        };
        let raw = self.source.list(&request).await?;
        Ok(normalize(raw, params.offset, params.limit, self.trust_has_more))
    }
}

/// Normalise a raw page into a [`PaginatedResponse`].
///
/// Never fails: parse and decode errors are logged and reported through
/// [`PaginatedResponse::error`].
pub fn normalize<T: DeserializeOwned>(
    raw: RawPayload,
    offset: usize,
    limit: usize,
    trust_has_more: bool,
) -> PaginatedResponse<T> {
    let mut value = match raw {
        RawPayload::Structured(value) => value,
        RawPayload::Text(text) => match serde_json::from_str::<Value>(&text) {
            Ok(value) => value,
            Err(e) => return malformed(format!("payload is not JSON: {e}")),
        },
    };

    for _ in 0..MAX_DECODE_DEPTH {
        let Value::String(inner) = &value else { break };
        value = match serde_json::from_str::<Value>(inner) {
            Ok(v) => v,
            Err(e) => return malformed(format!("string payload is not JSON: {e}")),
        };
    }

    let (items, envelope) = match value {
        Value::Array(items) => (items, None),
        Value::Object(mut obj) => {
            let Some(items) = take_items(&mut obj) else {
                let reason = upstream_message(&obj)
                    .unwrap_or_else(|| "payload has no item list".to_string());
                return malformed(reason);
            };
            (items, Some(obj))
        }
        other => return malformed(format!("unexpected payload type: {}", kind(&other))),
    };

    let count = items.len();
    let items: Vec<T> = match serde_json::from_value(Value::Array(items)) {
        Ok(items) => items,
        Err(e) => return malformed(format!("items do not decode: {e}")),
    };

    let flag = envelope
        .as_ref()
        .and_then(|obj| first_of(obj, &["has_more", "hasMore"]))
        .and_then(Value::as_bool);
    let has_more = match flag {
        Some(flag) if trust_has_more => flag && count > 0,
        _ => count >= limit,
    };

    let total = envelope
        .as_ref()
        .and_then(|obj| obj.get("total"))
        .and_then(Value::as_u64);
    let filtered_total = envelope
        .as_ref()
        .and_then(|obj| first_of(obj, &["filtered_total", "filteredTotal"]))
        .and_then(Value::as_u64);

    tracing::debug!(offset, limit, count, has_more, trusted = trust_has_more && flag.is_some(), "page normalised");

    PaginatedResponse {
        items,
        has_more,
        next_offset: has_more.then_some(offset + count),
        total,
        filtered_total,
        error: None,
    }
}

fn malformed<T>(reason: String) -> PaginatedResponse<T> {
    tracing::warn!(%reason, "malformed collection payload");
    PaginatedResponse::failed(reason)
}

fn take_items(obj: &mut Map<String, Value>) -> Option<Vec<Value>> {
    let key = ITEM_KEYS.iter().find(|k| matches!(obj.get(**k), Some(Value::Array(_))))?;
    match obj.remove(*key) {
        Some(Value::Array(items)) => Some(items),
        _ => None,
    }
}

fn first_of<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| obj.get(*k))
}

fn upstream_message(obj: &Map<String, Value>) -> Option<String> {
    first_of(obj, &["error", "message"])
        .and_then(Value::as_str)
        .map(|m| format!("upstream error: {m}"))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
