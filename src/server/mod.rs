//! Web server exposing the camera range lookup API.
//!
//! Thin transport over [`LookupService`]: handlers parse nothing beyond the
//! path, and every status code comes from the service's error kind.

mod handlers;
mod routes;

pub use routes::create_router;

use std::sync::Arc;

use tracing::info;

use crate::config::Settings;
use crate::service::LookupService;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub service: LookupService,
}

impl AppState {
    pub fn new(service: LookupService) -> Self {
        Self { service }
    }

    /// Open the configured store and wrap it in a service.
    pub async fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let ctx = settings.create_db_context()?;
        let warmed = ctx.warm_up().await?;
        if warmed > 0 {
            info!("Opened {} database connections", warmed);
        }

        let service = LookupService::new(Arc::new(ctx.ranges()))
            .with_query_timeout(settings.database.query_timeout);
        Ok(Self::new(service))
    }
}

/// Start the web server and run until Ctrl-C.
pub async fn serve(settings: &Settings, host: &str, port: u16) -> anyhow::Result<()> {
    let state = AppState::from_settings(settings).await?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    info!("Starting server at http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use tempfile::tempdir;
    use tower::ServiceExt;

    use crate::models::CameraRange;
    use crate::repository::DbContext;

    async fn setup_test_app() -> (axum::Router, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let ctx = DbContext::from_sqlite_path(&dir.path().join("test.db"));
        ctx.init_schema().await.unwrap();

        let mut rolleiflex = CameraRange::new(1, 100000, 199999, "Rolleiflex 2.8F");
        rolleiflex.year_produced = Some(1960);
        rolleiflex.taking_lens = Some("Planar 2.8/80".to_string());
        ctx.importer().upsert(&rolleiflex).await.unwrap();
        ctx.importer()
            .upsert(&CameraRange::new(2, 200000, 249999, "Rolleicord V"))
            .await
            .unwrap();

        let state = AppState::new(LookupService::new(Arc::new(ctx.ranges())));
        (create_router(state), dir)
    }

    async fn send(
        app: axum::Router,
        method: Method,
        uri: &str,
        body: Body,
    ) -> (StatusCode, axum::http::HeaderMap, serde_json::Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(body)
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if body.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, headers, json)
    }

    async fn get(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let (status, _, json) = send(app, Method::GET, uri, Body::empty()).await;
        (status, json)
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _dir) = setup_test_app().await;
        let (status, _) = get(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_list_serial_numbers() {
        let (app, _dir) = setup_test_app().await;
        let (status, json) = get(app, "/api/serial-numbers").await;

        assert_eq!(status, StatusCode::OK);
        let data = json["data"].as_array().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0]["id"], 1);
        assert_eq!(data[0]["attributes"]["taking_lens"], "Planar 2.8/80");
        assert_eq!(json["meta"]["pagination"]["total"], 2);
        assert_eq!(json["meta"]["pagination"]["pageSize"], 2);
        assert_eq!(json["meta"]["pagination"]["pageCount"], 1);
    }

    #[tokio::test]
    async fn test_get_serial_number() {
        let (app, _dir) = setup_test_app().await;
        let (status, json) = get(app, "/api/serial-numbers/1").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["id"], 1);
        assert_eq!(json["data"]["attributes"]["model_name"], "Rolleiflex 2.8F");
        assert_eq!(json["data"]["attributes"]["year_produced"], 1960);
        assert_eq!(json["meta"], serde_json::json!({}));
    }

    #[tokio::test]
    async fn test_get_serial_number_errors() {
        let (app, _dir) = setup_test_app().await;

        let (status, json) = get(app.clone(), "/api/serial-numbers/999").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(json["data"].is_null());
        assert_eq!(json["error"]["status"], 404);
        assert_eq!(json["error"]["name"], "NotFoundError");
        assert_eq!(json["error"]["message"], "Serial number not found");

        let (status, json) = get(app.clone(), "/api/serial-numbers/abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["name"], "ValidationError");

        let (status, _) = get(app, "/api/serial-numbers/-5").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_lookup_serial() {
        let (app, _dir) = setup_test_app().await;

        let (status, json) = get(app.clone(), "/api/lookup/150000").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["id"], 1);

        let (status, json) = get(app.clone(), "/api/lookup/249999").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["attributes"]["model_name"], "Rolleicord V");

        let (status, _) = get(app.clone(), "/api/lookup/250000").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = get(app, "/api/lookup/2.8F").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_mutations_are_method_not_allowed() {
        let (app, _dir) = setup_test_app().await;

        let cases = [
            (Method::POST, "/api/serial-numbers", r#"{"data":{"model_name":"SL66"}}"#),
            (Method::PUT, "/api/serial-numbers/1", "{not json"),
            (Method::PATCH, "/api/serial-numbers/1", ""),
            (Method::DELETE, "/api/serial-numbers/1", ""),
            (Method::POST, "/api/lookup/1500000", "{}"),
            (Method::PUT, "/api/lookup/1500000", ""),
            (Method::DELETE, "/api/lookup/1500000", ""),
        ];
        for (method, uri, body) in cases {
            let (status, headers, json) =
                send(app.clone(), method.clone(), uri, Body::from(body)).await;
            assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{method} {uri}");
            assert_eq!(headers.get(header::ALLOW).unwrap(), "GET");
            assert_eq!(json["error"]["name"], "MethodNotAllowedError");
        }

        // Nothing changed.
        let (_, json) = get(app, "/api/serial-numbers/1").await;
        assert_eq!(json["data"]["attributes"]["model_name"], "Rolleiflex 2.8F");
    }

    #[tokio::test]
    async fn test_store_failure_is_opaque_500() {
        let dir = tempdir().unwrap();
        // No schema, so every query fails in the backend.
        let ctx = DbContext::from_sqlite_path(&dir.path().join("empty.db"));
        let app = create_router(AppState::new(LookupService::new(Arc::new(ctx.ranges()))));

        let (status, json) = get(app, "/api/serial-numbers").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"]["status"], 500);
        assert_eq!(json["error"]["message"], "Internal Server Error");
        assert!(!json.to_string().contains("rolleiflex_cameras"));
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let (app, _dir) = setup_test_app().await;
        let (status, json) = get(app, "/api/does-not-exist").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["name"], "NotFoundError");
    }
}
