//! HTTP search API
//!
//! Read-only JSON endpoints, one per strategy plus a `type`-dispatched one.
//! Error mapping at this boundary:
//! - `InvalidArgument` -> 400 Bad Request
//! - `Store`           -> 503 Service Unavailable
//! - `Cancelled`       -> 504 Gateway Timeout
//!
//! Error bodies are `{"error": <code>, "message": <text>}`, including for
//! query strings the extractor cannot decode. An empty `q` returns `200 []`.
//! Each search runs under the request timeout and is also cancelled when
//! the server starts shutting down.

use crate::error::SearchError;
use crate::search::{CancelSignal, MatchStrategy, SearchEngine, SearchParams};
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SearchEngine>,
    pub request_timeout: Duration,
    /// Becomes `true` once shutdown begins
    pub shutdown: watch::Receiver<bool>,
}

impl IntoResponse for SearchError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        (status, Json(self.body())).into_response()
    }
}

/// HTTP status class for each error kind
pub fn status_for(err: &SearchError) -> StatusCode {
    StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/search", get(search_by_type))
        .route("/search/prefix", get(search_prefix))
        .route("/search/substring", get(search_substring))
        .route("/search/fulltext", get(search_fulltext))
        .route("/search/fuzzy", get(search_fuzzy))
        .route("/search/fussy", get(search_fuzzy))
        .route("/search/unified", get(search_unified))
        .route("/unified", get(search_unified))
        .route("/healthz", get(health))
        .with_state(state)
}

type Params = Result<Query<SearchParams>, QueryRejection>;

/// Undecodable query strings are client errors like any other bad argument
fn decode(params: Params) -> Result<SearchParams, SearchError> {
    params
        .map(|Query(params)| params)
        .map_err(|rejection| SearchError::InvalidArgument(rejection.body_text()))
}

async fn run(
    state: &AppState,
    params: SearchParams,
    strategy: MatchStrategy,
) -> Result<Response, SearchError> {
    let query = params.into_query(strategy)?;
    let cancel =
        CancelSignal::deadline_in(state.request_timeout).with_flag(state.shutdown.clone());

    let result = state.engine.evaluate_with(&query, cancel).await.map_err(|e| {
        warn!(strategy = %strategy, "Search failed: {}", e);
        e
    })?;

    Ok(Json(result.records()).into_response())
}

async fn search_by_type(
    State(state): State<AppState>,
    params: Params,
) -> Result<Response, SearchError> {
    let params = decode(params)?;
    let strategy = params.strategy_or(MatchStrategy::FullText)?;
    run(&state, params, strategy).await
}

async fn search_prefix(
    State(state): State<AppState>,
    params: Params,
) -> Result<Response, SearchError> {
    run(&state, decode(params)?, MatchStrategy::Prefix).await
}

async fn search_substring(
    State(state): State<AppState>,
    params: Params,
) -> Result<Response, SearchError> {
    run(&state, decode(params)?, MatchStrategy::Substring).await
}

async fn search_fulltext(
    State(state): State<AppState>,
    params: Params,
) -> Result<Response, SearchError> {
    run(&state, decode(params)?, MatchStrategy::FullText).await
}

async fn search_fuzzy(
    State(state): State<AppState>,
    params: Params,
) -> Result<Response, SearchError> {
    run(&state, decode(params)?, MatchStrategy::Fuzzy).await
}

async fn search_unified(
    State(state): State<AppState>,
    params: Params,
) -> Result<Response, SearchError> {
    run(&state, decode(params)?, MatchStrategy::Unified).await
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "records": state.engine.store().len() }))
}

/// Bind and serve until Ctrl-C. In-flight searches are cancelled when
/// shutdown begins.
pub async fn serve(
    engine: Arc<SearchEngine>,
    request_timeout: Duration,
    bind: &str,
) -> anyhow::Result<()> {
    let (shutdown_tx, shutdown) = watch::channel(false);
    let state = AppState {
        engine,
        request_timeout,
        shutdown,
    };

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal(shutdown_tx: watch::Sender<bool>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
    let _ = shutdown_tx.send(true);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Medicine, MemoryStore, StoreError};
    use crate::config::EngineConfig;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    fn app() -> Router {
        let (_tx, shutdown) = watch::channel(false);
        app_with(shutdown)
    }

    fn app_with(shutdown: watch::Receiver<bool>) -> Router {
        let mut avastin = Medicine::named("m1", "Avastin");
        avastin.manufacturer_name = Some("Roche".to_string());
        avastin.price = Some(2999.0);
        let records = vec![
            avastin,
            Medicine::named("m2", "Avastin Forte"),
            Medicine::named("m3", "Avastn"),
            Medicine::named("m4", "Crocin"),
        ];
        let engine = SearchEngine::new(
            Arc::new(MemoryStore::new(records)),
            EngineConfig::default(),
        );
        router(AppState {
            engine: Arc::new(engine),
            request_timeout: Duration::from_secs(5),
            shutdown,
        })
    }

    async fn get_json(uri: &str) -> (StatusCode, Value) {
        send(app(), uri).await
    }

    async fn send(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn names(body: &Value) -> Vec<String> {
        body.as_array()
            .unwrap()
            .iter()
            .map(|r| r["name"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_empty_q_is_ok_and_empty() {
        for uri in ["/search/prefix", "/search/substring?q=", "/search/unified?q=%20%20"] {
            let (status, body) = get_json(uri).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, serde_json::json!([]));
        }
    }

    #[tokio::test]
    async fn test_prefix_endpoint_returns_full_records() {
        let (status, body) = get_json("/search/prefix?q=avas&limit=1").await;
        assert_eq!(status, StatusCode::OK);
        let arr = body.as_array().unwrap();
        assert_eq!(arr.len(), 1);
        assert_eq!(arr[0]["id"], "m1");
        assert_eq!(arr[0]["manufacturer_name"], "Roche");
        assert_eq!(arr[0]["price"], 2999.0);
        assert_eq!(arr[0]["available"], true);
        assert_eq!(arr[0]["is_discontinued"], false);
    }

    #[tokio::test]
    async fn test_unified_endpoint_ranking() {
        let (status, body) = get_json("/search/unified?q=Avastin").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(names(&body), vec!["Avastin", "Avastin Forte", "Avastn"]);

        let (_, alias) = get_json("/unified?q=Avastin").await;
        assert_eq!(alias, body);
    }

    #[tokio::test]
    async fn test_fuzzy_threshold_parameter_and_alias() {
        let (status, body) = get_json("/search/fuzzy?q=avastin&threshold=0.9").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(names(&body), vec!["Avastin"]);

        let (status, alias) = get_json("/search/fussy?q=avastin&threshold=0.9").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(alias, body);
    }

    #[tokio::test]
    async fn test_type_dispatch_defaults_to_fulltext() {
        let (_, body) = get_json("/search?q=forte").await;
        assert_eq!(names(&body), vec!["Avastin Forte"]);

        let (_, body) = get_json("/search?q=cro&type=prefix").await;
        assert_eq!(names(&body), vec!["Crocin"]);
    }

    #[tokio::test]
    async fn test_invalid_arguments_are_400() {
        for uri in [
            "/search/prefix?q=a&limit=0",
            "/search/prefix?q=a&limit=ten",
            "/search/fuzzy?q=a&threshold=1.5",
            "/search?q=a&type=regex",
        ] {
            let (status, body) = get_json(uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(body["error"], "invalid_argument");
        }
    }

    #[tokio::test]
    async fn test_undecodable_query_string_is_json_400() {
        let (status, body) = get_json("/search/prefix?q=a&q=b").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_argument");
        assert!(body["message"].as_str().is_some());

        let (status, body) = get_json("/search?q=a&q=b").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_argument");
    }

    #[tokio::test]
    async fn test_shutdown_cancels_searches() {
        let (tx, shutdown) = watch::channel(false);
        tx.send(true).unwrap();

        let (status, body) = send(app_with(shutdown.clone()), "/search/unified?q=avastin").await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body["error"], "cancelled");

        // Empty queries never reach the store, so they still succeed
        let (status, body) = send(app_with(shutdown), "/search/unified?q=").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_health_reports_record_count() {
        let (status, body) = get_json("/healthz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["records"], 4);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&SearchError::InvalidArgument(String::new())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&SearchError::Store(StoreError::Unavailable(String::new()))),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_for(&SearchError::Cancelled(String::new())),
            StatusCode::GATEWAY_TIMEOUT
        );
    }
}
