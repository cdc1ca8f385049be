//! `agro-registry serve` -- HTTP JSON API over the registry services.
//!
//! Endpoints:
//! - GET  /health
//! - POST /producers, GET /producers
//! - GET|PATCH|PUT|DELETE /producers/{id}  (GET returns the ownership tree)
//! - the same for /farms, /harvests and /crops
//! - GET  /dashboard/stats
//! - GET  /dashboard/farms-by-state
//! - GET  /dashboard/crops-by-type
//! - GET  /dashboard/land-use
//!
//! All responses use Content-Type: application/json. Deletes answer 204
//! with an empty body.

mod error;
mod handlers;
mod state;
mod validate;

use std::path::PathBuf;
use std::sync::Arc;

use agro_registry_adapters::store::InMemoryRegistryStore;
use agro_registry_domain::SystemClock;
use anyhow::{Context, Result};
use axum::Router;
use axum::http::{HeaderValue, Method, header};
use axum::routing::get;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use self::handlers::*;
use self::state::AppState;
use crate::args::ServeArgs;
use crate::config::AppConfig;

pub async fn execute(args: ServeArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;

    let clock = Arc::new(SystemClock);
    let state = if args.memory {
        tracing::warn!("Using in-memory store; records are lost on exit");
        AppState::new(Arc::new(InMemoryRegistryStore::new()), clock)
    } else {
        AppState::new(super::open_store(&config).await?, clock)
    };

    let app = router(Arc::new(state), &config.server.cors_origins)?;

    let host = args.host.unwrap_or(config.server.host);
    let port = args.port.unwrap_or(config.server.port);
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(addr = %addr, memory = args.memory, "Registry API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    tracing::info!("Server shut down");
    Ok(())
}

/// Build the API router with CORS restricted to `cors_origins`.
pub(crate) fn router(state: Arc<AppState>, cors_origins: &[String]) -> Result<Router> {
    let origins = cors_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("Invalid CORS origin: {}", origin))
        })
        .collect::<Result<Vec<_>>>()?;

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);

    let app = Router::new()
        .route("/health", get(handle_health))
        .route("/producers", get(list_producers).post(create_producer))
        .route(
            "/producers/{id}",
            get(get_producer)
                .patch(update_producer)
                .put(update_producer)
                .delete(delete_producer),
        )
        .route("/farms", get(list_farms).post(create_farm))
        .route(
            "/farms/{id}",
            get(get_farm)
                .patch(update_farm)
                .put(update_farm)
                .delete(delete_farm),
        )
        .route("/harvests", get(list_harvests).post(create_harvest))
        .route(
            "/harvests/{id}",
            get(get_harvest)
                .patch(update_harvest)
                .put(update_harvest)
                .delete(delete_harvest),
        )
        .route("/crops", get(list_crops).post(create_crop))
        .route(
            "/crops/{id}",
            get(get_crop)
                .patch(update_crop)
                .put(update_crop)
                .delete(delete_crop),
        )
        .route("/dashboard/stats", get(dashboard_stats))
        .route("/dashboard/farms-by-state", get(dashboard_farms_by_state))
        .route("/dashboard/crops-by-type", get(dashboard_crops_by_type))
        .route("/dashboard/land-use", get(dashboard_land_use))
        .fallback(handle_not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    Ok(app)
}

/// Wait for a shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        return;
    }
    tracing::info!("Received shutdown signal");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn app() -> Router {
        let state = AppState::new(
            Arc::new(InMemoryRegistryStore::new()),
            Arc::new(SystemClock),
        );
        router(Arc::new(state), &["http://localhost:3000".to_string()]).unwrap()
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn create_producer(app: &Router, document: &str) -> Value {
        let (status, body) = send(
            app,
            Method::POST,
            "/producers",
            Some(json!({
                "name": "João Silva Santos",
                "document_type": "CPF",
                "document": document,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&app(), Method::GET, "/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_producer_document_normalized_and_unique() {
        let app = app();

        let producer = create_producer(&app, "123.456.789-01").await;
        assert_eq!(producer["document"], "12345678901");

        let (status, body) = send(
            &app,
            Method::POST,
            "/producers",
            Some(json!({
                "name": "Outro Produtor",
                "document_type": "CPF",
                "document": "12345678901",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "conflict");
    }

    #[tokio::test]
    async fn test_farm_area_violation_is_bad_request() {
        let app = app();
        let producer = create_producer(&app, "12345678901").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/farms",
            Some(json!({
                "producer_id": producer["id"],
                "name": "Fazenda São João",
                "city": "Ribeirão Preto",
                "state": "SP",
                "total_area": 100.0,
                "arable_area": 70.0,
                "vegetation_area": 50.0,
            })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation");
        assert_eq!(body["field"], "total_area");
        assert_eq!(
            body["message"],
            "the sum of arable and vegetation area cannot exceed total area"
        );
    }

    #[tokio::test]
    async fn test_missing_records_are_not_found() {
        let app = app();
        let id = uuid::Uuid::new_v4();

        let (status, _) = send(&app, Method::GET, &format!("/farms/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, Method::DELETE, &format!("/crops/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(
            &app,
            Method::POST,
            "/harvests",
            Some(json!({ "farm_id": id, "year": 2024, "season": "Safra" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "farm not found");
    }

    #[tokio::test]
    async fn test_blank_name_rejected_before_service() {
        let (status, body) = send(
            &app(),
            Method::POST,
            "/producers",
            Some(json!({ "name": " ", "document_type": "CNPJ", "document": "12345678000195" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field"], "name");
    }

    #[tokio::test]
    async fn test_full_tree_then_cascade_delete() {
        let app = app();
        let producer = create_producer(&app, "11122233344").await;
        let producer_id = producer["id"].as_str().unwrap().to_string();

        let (_, farm) = send(
            &app,
            Method::POST,
            "/farms",
            Some(json!({
                "producer_id": producer_id,
                "name": "Fazenda Bela Vista",
                "city": "Rio Verde",
                "state": "GO",
                "total_area": 300.0,
                "arable_area": 240.0,
                "vegetation_area": 60.0,
            })),
        )
        .await;
        let (_, harvest) = send(
            &app,
            Method::POST,
            "/harvests",
            Some(json!({ "farm_id": farm["id"], "year": 2024, "season": "Safra" })),
        )
        .await;
        let (status, _) = send(
            &app,
            Method::POST,
            "/crops",
            Some(json!({ "harvest_id": harvest["id"], "name": "Soja", "area": 150.0 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, listed) = send(&app, Method::GET, "/producers", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed[0]["id"], producer_id.as_str());
        assert_eq!(listed[0]["farms"][0]["name"], "Fazenda Bela Vista");

        let (status, detail) =
            send(&app, Method::GET, &format!("/producers/{}", producer_id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["farms"][0]["harvests"][0]["crops"][0]["name"], "Soja");

        let (status, stats) = send(&app, Method::GET, "/dashboard/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["total_hectares"], 300.0);
        assert_eq!(stats["total_crops"], 1);

        let (status, body) =
            send(&app, Method::DELETE, &format!("/producers/{}", producer_id), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, Value::Null);

        let (_, stats) = send(&app, Method::GET, "/dashboard/stats", None).await;
        assert_eq!(stats["total_farms"], 0);
        assert_eq!(stats["total_crops"], 0);
    }

    #[tokio::test]
    async fn test_patch_and_put_update_partially() {
        let app = app();
        let producer = create_producer(&app, "98765432100").await;
        let uri = format!("/producers/{}", producer["id"].as_str().unwrap());

        let (status, updated) =
            send(&app, Method::PATCH, &uri, Some(json!({ "name": "Maria Oliveira Costa" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["name"], "Maria Oliveira Costa");
        assert_eq!(updated["document"], "98765432100");

        let (status, updated) =
            send(&app, Method::PUT, &uri, Some(json!({ "document": "987.654.321-00" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["document"], "98765432100");
        assert_eq!(updated["name"], "Maria Oliveira Costa");
    }

    #[tokio::test]
    async fn test_empty_dashboard_reports_zero() {
        let app = app();

        let (_, stats) = send(&app, Method::GET, "/dashboard/stats", None).await;
        assert_eq!(stats["total_producers"], 0);
        assert_eq!(stats["total_hectares"], 0.0);

        let (_, land_use) = send(&app, Method::GET, "/dashboard/land-use", None).await;
        assert_eq!(
            land_use,
            json!([{ "kind": "arable", "area": 0.0 }, { "kind": "vegetation", "area": 0.0 }])
        );

        let (_, by_state) = send(&app, Method::GET, "/dashboard/farms-by-state", None).await;
        assert_eq!(by_state, json!([]));
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let (status, body) = send(&app(), Method::GET, "/nope", None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
    }
}
