//! HTTP collection source.
//!
//! Issues `GET {base_url}{list_path}?offset=..&limit=..&sort=..&<filters>`
//! against the remote collection and hands the body back untouched as
//! [`RawPayload::Text`]; parsing happens in the fetcher.

use crate::error::SourceError;
use crate::{CollectionSource, ListRequest, RawPayload};
use http_body_util::{BodyExt, Empty};
use hyper::body::Bytes;
use hyper::header::ACCEPT;
use hyper::{Request, Uri};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::time::Duration;

/// Longest error body echoed back in [`SourceError::Status`].
const MAX_ERROR_BODY: usize = 512;

#[derive(Clone)]
pub struct HttpSource {
    client: Client<HttpConnector, Empty<Bytes>>,
    base_url: String,
    list_path: String,
    timeout: Duration,
}

impl std::fmt::Debug for HttpSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSource")
            .field("base_url", &self.base_url)
            .field("list_path", &self.list_path)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>, list_path: impl Into<String>) -> Self {
        Self {
            client: Client::builder(TokioExecutor::new()).build_http(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            list_path: list_path.into(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full request URI for `request`, with every value percent-encoded.
    pub fn request_uri(&self, request: &ListRequest) -> String {
        let mut query = format!(
            "offset={}&limit={}&sort={}",
            request.offset,
            request.limit,
            request.sort.as_str()
        );
        for (name, value) in &request.params {
            query.push('&');
            query.push_str(&urlencoding::encode(name));
            query.push('=');
            query.push_str(&urlencoding::encode(value));
        }
        let path = if self.list_path.starts_with('/') {
            self.list_path.clone()
        } else {
            format!("/{}", self.list_path)
        };
        format!("{}{}?{}", self.base_url, path, query)
    }

    async fn get(&self, uri: Uri) -> Result<(u16, Bytes), SourceError> {
        let req = Request::get(uri)
            .header(ACCEPT, "application/json")
            .body(Empty::<Bytes>::new())
            .map_err(|e| SourceError::Transport(e.to_string()))?;

        let resp = self
            .client
            .request(req)
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))?;
        let status = resp.status().as_u16();
        let body = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))?
            .to_bytes();
        Ok((status, body))
    }
}

impl CollectionSource for HttpSource {
    async fn list(&self, request: &ListRequest) -> Result<RawPayload, SourceError> {
        let raw = self.request_uri(request);
        let uri: Uri = raw.parse().map_err(|e: hyper::http::uri::InvalidUri| SourceError::InvalidUri {
            uri: raw.clone(),
            message: e.to_string(),
        })?;

        tracing::debug!(uri = %raw, "fetching page");
        let (status, body) = tokio::time::timeout(self.timeout, self.get(uri))
            .await
            .map_err(|_| SourceError::Timeout(self.timeout.as_millis() as u64))??;

        let text = String::from_utf8_lossy(&body).into_owned();
        if !(200..300).contains(&status) {
            let mut body = text;
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(SourceError::Status { status, body });
        }
        Ok(RawPayload::Text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sift_core::SortOrder;

    fn request(params: &[(&str, &str)]) -> ListRequest {
        ListRequest {
            offset: 50,
            limit: 25,
            sort: SortOrder::Asc,
            params: params.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        }
    }

    #[test]
    fn uri_carries_paging_and_filters() {
        let source = HttpSource::new("http://localhost:9000/", "/api/v1/jobs");
        assert_eq!(
            source.request_uri(&request(&[("status", "FAILED"), ("status", "PENDING")])),
            "http://localhost:9000/api/v1/jobs?offset=50&limit=25&sort=asc&status=FAILED&status=PENDING"
        );
    }

    #[test]
    fn filter_values_are_percent_encoded() {
        let source = HttpSource::new("http://localhost:9000", "api/v1/jobs");
        let uri = source.request_uri(&request(&[("q", "nightly build&x=1")]));
        assert!(uri.starts_with("http://localhost:9000/api/v1/jobs?"));
        assert!(uri.ends_with("q=nightly%20build%26x%3D1"));
        assert!(uri.parse::<Uri>().is_ok());
    }

    #[tokio::test]
    async fn refused_connection_is_a_transport_error() {
        // Port 9 (discard) is not expected to be listening on loopback.
        let source = HttpSource::new("http://127.0.0.1:9", "/jobs").with_timeout(Duration::from_secs(2));
        let err = source.list(&request(&[])).await.unwrap_err();
        assert!(matches!(err, SourceError::Transport(_) | SourceError::Timeout(_)));
    }
}
