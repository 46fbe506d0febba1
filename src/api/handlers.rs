use super::models::InfoAck;
use super::AppState;
use crate::errors::{ApiError, CatalogError, StoreError};
use crate::models::ServiceRecord;
use axum::body::Bytes;
use axum::extract::State;
use axum::response::{Html, Json};
use tokio::time::{timeout_at, Instant};

/// GET / — static index page
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    Ok(Html(state.templates.render("index")?))
}

/// POST /info — accepts any JSON payload, acknowledges it
pub async fn info(body: Bytes) -> Result<Json<InfoAck>, ApiError> {
    let payload: serde_json::Value =
        serde_json::from_slice(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    tracing::debug!(%payload, "received info payload");

    Ok(Json(InfoAck { status: "ok" }))
}

/// GET /data — fetch the upstream catalog, persist it, return the stored list.
/// The whole operation runs under one request-scoped deadline.
pub async fn get_data(
    State(state): State<AppState>,
) -> Result<Json<Vec<ServiceRecord>>, ApiError> {
    let deadline = Instant::now() + state.request_timeout;

    let records = timeout_at(deadline, state.catalog.fetch_catalog())
        .await
        .map_err(|_| CatalogError::Timeout)??;

    tracing::info!("persisting {} catalog record(s)", records.len());

    // Skip-and-continue: one bad record must not sink the whole batch.
    let mut failed = Vec::new();
    for record in records {
        let identifier = record.identifier.clone();
        let result = match timeout_at(deadline, state.store.upsert(record)).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Deadline),
        };

        if let Err(e) = result {
            tracing::error!("failed to persist {identifier}: {e}");
            failed.push(identifier);
        }
    }

    if !failed.is_empty() {
        return Err(ApiError::Persist { failed });
    }

    let stored = timeout_at(deadline, state.store.list())
        .await
        .map_err(|_| StoreError::Deadline)??;

    Ok(Json(stored))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::router;
    use crate::catalog::StubCatalog;
    use crate::store::{CatalogDb, StoreHandle};
    use crate::templates::TemplateStore;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::Utc;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn record(identifier: &str) -> ServiceRecord {
        ServiceRecord {
            identifier: identifier.to_string(),
            title: format!("{identifier} title"),
            description: None,
            fetched_at: Utc::now(),
        }
    }

    struct TestApp {
        app: axum::Router,
        store: StoreHandle,
        // keep the template dir alive for the app's lifetime
        _template_dir: tempfile::TempDir,
    }

    fn test_app(catalog: StubCatalog) -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html>catalog</html>").unwrap();

        let store = StoreHandle::spawn(CatalogDb::open(":memory:").unwrap());
        let state = AppState {
            catalog: Arc::new(catalog),
            store: store.clone(),
            templates: Arc::new(TemplateStore::load(dir.path()).unwrap()),
            request_timeout: Duration::from_secs(5),
        };

        TestApp {
            app: router::build(state),
            store,
            _template_dir: dir,
        }
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn index_renders_the_static_page() {
        let test = test_app(StubCatalog::with_records(vec![]));

        let response = test
            .app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn index_without_page_is_a_server_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("other.html"), "<html></html>").unwrap();

        let state = AppState {
            catalog: Arc::new(StubCatalog::with_records(vec![])),
            store: StoreHandle::spawn(CatalogDb::open(":memory:").unwrap()),
            templates: Arc::new(TemplateStore::load(dir.path()).unwrap()),
            request_timeout: Duration::from_secs(5),
        };

        let response = router::build(state)
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn info_acknowledges_valid_json() {
        let test = test_app(StubCatalog::with_records(vec![]));

        let response = test
            .app
            .oneshot(
                Request::post("/info")
                    .body(Body::from(r#"{"note": "hello", "count": 3}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn info_rejects_malformed_json() {
        let test = test_app(StubCatalog::with_records(vec![]));

        let response = test
            .app
            .oneshot(
                Request::post("/info")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn get_data_persists_and_returns_records() {
        let test = test_app(StubCatalog::with_records(vec![
            record("hmda"),
            record("credit-cards"),
        ]));

        let response = test
            .app
            .oneshot(Request::get("/data").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body.as_array().unwrap().len(), 2);
        assert_eq!(test.store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn get_data_is_idempotent_for_identical_upstream_data() {
        let test = test_app(StubCatalog::with_records(vec![
            record("hmda"),
            record("credit-cards"),
        ]));

        for _ in 0..2 {
            let response = test
                .app
                .clone()
                .oneshot(Request::get("/data").body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        assert_eq!(test.store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn get_data_maps_upstream_failure_to_bad_gateway() {
        let test = test_app(StubCatalog::with_status(500));

        let response = test
            .app
            .oneshot(Request::get("/data").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        // a failed fetch must not touch storage
        assert_eq!(test.store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn get_data_reports_per_record_persist_failures() {
        // an empty identifier slips past the stub and fails the presence
        // check in the store; the rest of the batch still lands
        let mut bad = record("");
        bad.title = "no identifier".to_string();

        let test = test_app(StubCatalog::with_records(vec![record("hmda"), bad]));

        let response = test
            .app
            .oneshot(Request::get("/data").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["failed"].as_array().unwrap().len(), 1);
        assert_eq!(test.store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn concurrent_fetches_with_disjoint_sets_do_not_lose_rows() {
        let store = StoreHandle::spawn(CatalogDb::open(":memory:").unwrap());
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
        let templates = Arc::new(TemplateStore::load(dir.path()).unwrap());

        let app_for = |records: Vec<ServiceRecord>| {
            router::build(AppState {
                catalog: Arc::new(StubCatalog::with_records(records)),
                store: store.clone(),
                templates: Arc::clone(&templates),
                request_timeout: Duration::from_secs(5),
            })
        };

        let app_a = app_for(vec![record("a-1"), record("a-2")]);
        let app_b = app_for(vec![record("b-1"), record("b-2")]);

        let (res_a, res_b) = tokio::join!(
            app_a.oneshot(Request::get("/data").body(Body::empty()).unwrap()),
            app_b.oneshot(Request::get("/data").body(Body::empty()).unwrap()),
        );

        assert_eq!(res_a.unwrap().status(), StatusCode::OK);
        assert_eq!(res_b.unwrap().status(), StatusCode::OK);

        let identifiers: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.identifier)
            .collect();
        for expected in ["a-1", "a-2", "b-1", "b-2"] {
            assert!(identifiers.iter().any(|id| id == expected));
        }
    }
}
