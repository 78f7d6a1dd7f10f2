//! End-to-end flows: data directory -> engine -> HTTP / bench

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::http::{router, AppState};
    use crate::tools::bench::{parse_items, run_benchmark};
    use crate::tools::util::load_engine;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::sync::watch;
    use tower::ServiceExt;

    fn dataset() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("01_injections.json"),
            json!([
                {
                    "id": "1",
                    "name": "Avastin 100mg Injection",
                    "manufacturer_name": "Roche",
                    "price": "22564.5"
                },
                {"id": 2, "name": "Avastin", "type": "allopathy"},
                {"id": "3", "name": "Avastn"},
            ])
            .to_string(),
        )
        .unwrap();
        std::fs::write(
            dir.path().join("02_tablets.json"),
            json!([
                {"id": "4", "name": "Crocin Advance Tablet"},
                {"id": "2", "name": "Shadowed duplicate"},
                {"name": "No id"},
            ])
            .to_string(),
        )
        .unwrap();
        dir
    }

    #[tokio::test]
    async fn unified_over_imported_catalog() {
        let dir = dataset();
        let engine = load_engine(dir.path(), &Config::default()).unwrap();
        assert_eq!(engine.store().len(), 4);

        let (_shutdown_tx, shutdown) = watch::channel(false);
        let app = router(AppState {
            engine: Arc::new(engine),
            request_timeout: Duration::from_secs(5),
            shutdown,
        });
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/search/unified?q=avastin")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        let ids: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["id"].as_str().unwrap())
            .collect();
        // exact, then prefix, then the misspelling via similarity
        assert_eq!(ids, vec!["2", "1", "3"]);
        assert_eq!(body[0]["type"], "allopathy");
        assert_eq!(body[1]["price"], 22564.5);
    }

    #[tokio::test]
    async fn bench_over_imported_catalog() {
        let dir = dataset();
        let engine = load_engine(dir.path(), &Config::default()).unwrap();
        let items = parse_items(&json!({"tests": [
            {"id": "t1", "query": "crocin", "type": "fulltext"},
            {"id": "t1", "query": "avastn", "type": "fuzzy", "threshold": 0.5},
        ]}))
        .unwrap();

        let report = run_benchmark(&engine, &items, 10).await.unwrap();
        assert_eq!(report.results["t1"], json!(["Crocin Advance Tablet"]));
        assert_eq!(report.results["t1_dup1"], json!(["Avastn", "Avastin"]));
        assert_eq!(report.timings.len(), 2);
    }
}
