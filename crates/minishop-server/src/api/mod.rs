mod products;

use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use minishop_core::Product;
use minishop_store::{Catalog, CatalogError, KeyedStore};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::middleware::{request_id, RequestId, REQUEST_ID_HEADER};

/// Catalog behind a type-erased store so the backend can change without
/// touching handlers.
pub type SharedCatalog = Arc<Catalog<Arc<dyn KeyedStore<Product>>>>;

#[derive(Clone)]
pub struct AppState {
    pub catalog: SharedCatalog,
}

/// Error payload: `{ "error": <message>, "code": <code>, "request_id": <id> }`.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
    pub request_id: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    catalog: &'static str,
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: message.into(),
            code: code.into(),
            request_id: request_id.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" | "insufficient_stock" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Maps catalog failures onto the public error contract. Storage failures are
/// logged and reported with `internal_message`; their detail never reaches
/// the client.
pub(super) fn map_catalog_error(
    request_id: String,
    error: &CatalogError,
    internal_message: &str,
) -> ApiError {
    match error {
        CatalogError::InvalidQuantity(_) => {
            ApiError::new(request_id, "validation_error", "Invalid quantity")
        }
        CatalogError::NotFound(_) => ApiError::new(request_id, "not_found", "Product not found"),
        CatalogError::InsufficientStock { .. } => {
            ApiError::new(request_id, "insufficient_stock", "Not enough stock")
        }
        CatalogError::Storage(e) => {
            tracing::error!(error = %e, "catalog storage failed");
            ApiError::new(request_id, "internal_error", internal_message)
        }
    }
}

/// Runs a blocking catalog operation off the async executor.
pub(super) async fn run_catalog<T, F>(
    catalog: &SharedCatalog,
    op: F,
) -> Result<Result<T, CatalogError>, tokio::task::JoinError>
where
    T: Send + 'static,
    F: FnOnce(&Catalog<Arc<dyn KeyedStore<Product>>>) -> Result<T, CatalogError>
        + Send
        + 'static,
{
    let catalog = Arc::clone(catalog);
    tokio::task::spawn_blocking(move || op(&catalog)).await
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
}

/// Builds the router. Catalog routes answer both under `/api` and unprefixed.
/// When `public_dir` is set, unmatched paths are served from it.
pub fn build_app(state: AppState, public_dir: Option<&Path>) -> Router {
    let mut router = Router::new()
        .route("/api/health", get(health))
        .route("/api/products", get(products::list_products))
        .route("/api/purchase/{id}", post(products::purchase_product))
        .route("/products", get(products::list_products))
        .route("/purchase/{id}", post(products::purchase_product));

    if let Some(dir) = public_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    match run_catalog(&state.catalog, |c| c.list_products()).await {
        Ok(Ok(_)) => (
            StatusCode::OK,
            Json(HealthData {
                status: "ok",
                catalog: "ok",
            }),
        ),
        Ok(Err(e)) => {
            tracing::warn!(request_id = %req_id.0, error = %e, "health check: catalog unreadable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthData {
                    status: "degraded",
                    catalog: "unavailable",
                }),
            )
        }
        Err(e) => {
            tracing::error!(request_id = %req_id.0, error = %e, "health check task failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthData {
                    status: "degraded",
                    catalog: "unavailable",
                }),
            )
        }
    }
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
