//! Fake remote job collection for integration tests.
//!
//! Spins up a minimal `axum` HTTP server on a random TCP port bound to
//! 127.0.0.1. Serves `GET /api/v1/jobs` with `offset`, `limit`, `sort` and
//! the job filter parameters (`status`, `user`, `machine`, `q`).
//!
//! The response shape is switchable with [`PayloadMode`] so harnesses can
//! exercise the unreliable "more results" flag, string-encoded bodies and
//! outright garbage.
//!
//! # Example
//!
//! ```rust,no_run
//! # tokio_test::block_on(async {
//! use common::fake_collection_api::FakeCollectionApi;
//!
//! let api = FakeCollectionApi::start().await.unwrap();
//! api.set_jobs(sample_jobs()).await;
//!
//! // Point the fetcher at api.base_url()
//! let url = api.base_url();
//! # });
//! ```

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde_json::json;
use sift_core::models::Job;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

pub const LIST_PATH: &str = "/api/v1/jobs";

/// How the fake formats its list responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PayloadMode {
    /// `{items, has_more, total, filtered_total}` with a correct `has_more`.
    #[default]
    Honest,
    /// Like `Honest`, but `has_more` is always `false`.
    StuckHasMore,
    /// The JSON object serialised again as a JSON string.
    DoubleEncoded,
    /// A bare array of items.
    BareArray,
    /// A body that is not JSON at all.
    Malformed,
    /// An HTTP 503 with a short text body.
    Unavailable,
}

/// State shared between the router and test code.
#[derive(Default)]
struct ApiState {
    jobs: Vec<Job>,
    mode: PayloadMode,
    /// Query pairs of every request received, in arrival order.
    requests: Vec<Vec<(String, String)>>,
}

/// Handle to the running fake collection server.
pub struct FakeCollectionApi {
    addr: SocketAddr,
    state: Arc<Mutex<ApiState>>,
}

impl FakeCollectionApi {
    /// Start the server on a random port. Returns once the server is
    /// listening.
    pub async fn start() -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state = Arc::new(Mutex::new(ApiState::default()));

        let app = Router::new()
            .route(LIST_PATH, get(list_jobs))
            .with_state(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Give the task a moment to register.
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        Ok(Self { addr, state })
    }

    /// Base URL for the API (e.g. `http://127.0.0.1:PORT`).
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn set_jobs(&self, jobs: Vec<Job>) {
        self.state.lock().await.jobs = jobs;
    }

    pub async fn set_mode(&self, mode: PayloadMode) {
        self.state.lock().await.mode = mode;
    }

    /// Query pairs of every request received so far.
    pub async fn requests(&self) -> Vec<Vec<(String, String)>> {
        self.state.lock().await.requests.clone()
    }
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

async fn list_jobs(
    Query(pairs): Query<Vec<(String, String)>>,
    State(state): State<Arc<Mutex<ApiState>>>,
) -> Response {
    let mut state = state.lock().await;
    state.requests.push(pairs.clone());

    let offset: usize = param(&pairs, "offset").and_then(|v| v.parse().ok()).unwrap_or(0);
    let limit: usize = param(&pairs, "limit").and_then(|v| v.parse().ok()).unwrap_or(50);
    let statuses = list(&pairs, "status");
    let users = list(&pairs, "user");
    let machine = param(&pairs, "machine");
    let q = param(&pairs, "q").map(str::to_lowercase);

    let mut matching: Vec<&Job> = state
        .jobs
        .iter()
        .filter(|j| statuses.is_empty() || statuses.contains(&j.status.as_str()))
        .filter(|j| users.is_empty() || users.contains(&j.user.as_str()))
        .filter(|j| machine.is_none() || j.machine.as_deref() == machine)
        .filter(|j| q.as_ref().map_or(true, |q| j.name.to_lowercase().contains(q)))
        .collect();
    matching.sort_by_key(|j| j.created_at);
    if param(&pairs, "sort") != Some("asc") {
        matching.reverse();
    }

    let filtered_total = matching.len();
    let page: Vec<&Job> = matching.into_iter().skip(offset).take(limit).collect();
    let has_more = offset + page.len() < filtered_total;

    let body = json!({
        "items": &page,
        "has_more": has_more && state.mode != PayloadMode::StuckHasMore,
        "total": state.jobs.len(),
        "filtered_total": filtered_total,
    });

    match state.mode {
        PayloadMode::Honest | PayloadMode::StuckHasMore => axum::Json(body).into_response(),
        PayloadMode::DoubleEncoded => axum::Json(body.to_string()).into_response(),
        PayloadMode::BareArray => axum::Json(json!(page)).into_response(),
        PayloadMode::Malformed => (StatusCode::OK, "<html>gateway hiccup</html>").into_response(),
        PayloadMode::Unavailable => (StatusCode::SERVICE_UNAVAILABLE, "try again later").into_response(),
    }
}

fn param<'a>(pairs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    pairs.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
}

fn list<'a>(pairs: &'a [(String, String)], name: &str) -> Vec<&'a str> {
    pairs.iter().filter(|(k, _)| k == name).map(|(_, v)| v.as_str()).collect()
}
