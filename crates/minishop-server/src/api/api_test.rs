use std::fs;
use std::path::PathBuf;

use axum::body::{to_bytes, Body};
use axum::http::Request;
use minishop_store::JsonFileStore;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use super::*;

/// Temp dir holding a catalog document; dropped with the test.
struct Fixture {
    _dir: TempDir,
    path: PathBuf,
}

fn fixture(doc: &str) -> Fixture {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("products.json");
    fs::write(&path, doc).expect("write catalog");
    Fixture { _dir: dir, path }
}

fn sample_catalog() -> Fixture {
    let doc = json!([
        {"id": "a", "name": "Alpha", "description": "A thing", "image": "/a.png", "price": 10, "quantity": 5},
        {"id": "b", "name": "Beta", "description": "B thing", "image": "/b.png", "price": 4.5, "quantity": 0}
    ]);
    fixture(&serde_json::to_string_pretty(&doc).expect("encode"))
}

fn app_for(fixture: &Fixture) -> Router {
    let store: Arc<dyn KeyedStore<Product>> =
        Arc::new(JsonFileStore::<Product>::new(&fixture.path));
    build_app(
        AppState {
            catalog: Arc::new(Catalog::new(store)),
        },
        None,
    )
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.expect("response");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

fn purchase(id: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/api/purchase/{id}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

#[test]
fn api_error_codes_map_to_statuses() {
    let cases = [
        ("validation_error", StatusCode::BAD_REQUEST),
        ("insufficient_stock", StatusCode::BAD_REQUEST),
        ("not_found", StatusCode::NOT_FOUND),
        ("internal_error", StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (code, status) in cases {
        let response = ApiError::new("req-1", code, "msg").into_response();
        assert_eq!(response.status(), status, "code {code}");
    }
}

#[test]
fn storage_errors_hide_detail_behind_caller_message() {
    let err = CatalogError::Storage(minishop_store::StoreError::Contention {
        key: "a".to_string(),
        attempts: 16,
    });
    let api = map_catalog_error("req-9".to_string(), &err, "Purchase failed");
    assert_eq!(api.code, "internal_error");
    assert_eq!(api.error, "Purchase failed");
    assert_eq!(api.request_id, "req-9");
}

// ---------------------------------------------------------------------------
// GET /products
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_products_returns_catalog_verbatim() {
    let fx = sample_catalog();
    let (status, json) = send(app_for(&fx), get("/api/products")).await;

    assert_eq!(status, StatusCode::OK);
    let items = json.as_array().expect("array");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["id"], "a");
    assert_eq!(items[0]["name"], "Alpha");
    assert_eq!(items[0]["image"], "/a.png");
    assert_eq!(items[0]["price"].as_f64(), Some(10.0));
    assert_eq!(items[1]["price"].as_f64(), Some(4.5));
    assert_eq!(items[1]["quantity"], 0);
}

#[tokio::test]
async fn unprefixed_products_route_serves_same_catalog() {
    let fx = sample_catalog();
    let (status, json) = send(app_for(&fx), get("/products")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn malformed_catalog_yields_500_on_list() {
    let fx = fixture("{ not json");
    let (status, json) = send(app_for(&fx), get("/api/products")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "Failed to load products");
}

#[tokio::test]
async fn request_id_header_is_echoed() {
    let fx = sample_catalog();
    let request = Request::builder()
        .uri("/api/products")
        .header(REQUEST_ID_HEADER, "trace-me-123")
        .body(Body::empty())
        .expect("request");
    let response = app_for(&fx).oneshot(request).await.expect("response");
    assert_eq!(
        response
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok()),
        Some("trace-me-123")
    );
}

// ---------------------------------------------------------------------------
// POST /purchase/{id}
// ---------------------------------------------------------------------------

#[tokio::test]
async fn purchase_decrements_and_relisting_shows_new_stock() {
    let fx = sample_catalog();

    let (status, json) = send(app_for(&fx), purchase("a", &json!({"qty": 3}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], "a");
    assert_eq!(json["quantity"], 2);
    assert_eq!(json["name"], "Alpha");

    let (_, listed) = send(app_for(&fx), get("/api/products")).await;
    assert_eq!(listed[0]["quantity"], 2);
}

#[tokio::test]
async fn purchase_accepts_integer_string_qty() {
    let fx = sample_catalog();
    let (status, json) = send(app_for(&fx), purchase("a", &json!({"qty": "2"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["quantity"], 3);
}

#[tokio::test]
async fn unprefixed_purchase_route_decrements_stock() {
    let fx = sample_catalog();
    let request = Request::builder()
        .method("POST")
        .uri("/purchase/a")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"qty":1}"#))
        .expect("request");
    let (status, json) = send(app_for(&fx), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["quantity"], 4);
}

#[tokio::test]
async fn invalid_quantities_are_400_and_leave_document_unchanged() {
    let fx = sample_catalog();
    let before = fs::read_to_string(&fx.path).expect("read");

    for body in [
        json!({"qty": 0}),
        json!({"qty": -1}),
        json!({"qty": 2.5}),
        json!({"qty": "lots"}),
        json!({}),
    ] {
        let (status, json) = send(app_for(&fx), purchase("a", &body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body}");
        assert_eq!(json["error"], "Invalid quantity", "body {body}");
        assert_eq!(json["code"], "validation_error");
    }

    assert_eq!(fs::read_to_string(&fx.path).expect("read"), before);
}

#[tokio::test]
async fn malformed_purchase_body_is_invalid_quantity() {
    let fx = sample_catalog();
    let request = Request::builder()
        .method("POST")
        .uri("/api/purchase/a")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{qty:"))
        .expect("request");
    let (status, json) = send(app_for(&fx), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Invalid quantity");
}

#[tokio::test]
async fn unknown_product_is_404() {
    let fx = sample_catalog();
    let (status, json) = send(app_for(&fx), purchase("zzz", &json!({"qty": 1}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Product not found");
}

#[tokio::test]
async fn over_purchase_is_400_not_enough_stock() {
    let fx = sample_catalog();
    let (status, json) = send(app_for(&fx), purchase("a", &json!({"qty": 6}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Not enough stock");

    let (status, _) = send(app_for(&fx), purchase("b", &json!({"qty": 1}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_catalog_yields_500_on_purchase() {
    let fx = fixture("[oops");
    let (status, json) = send(app_for(&fx), purchase("a", &json!({"qty": 1}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "Purchase failed");
    assert!(json["request_id"].is_string());
}

// ---------------------------------------------------------------------------
// Health and static files
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_reports_ok_with_readable_catalog() {
    let fx = sample_catalog();
    let (status, json) = send(app_for(&fx), get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"status": "ok", "catalog": "ok"}));
}

#[tokio::test]
async fn health_reports_degraded_without_catalog() {
    let fx = sample_catalog();
    fs::remove_file(&fx.path).expect("remove catalog");
    let (status, json) = send(app_for(&fx), get("/api/health")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["status"], "degraded");
}

#[tokio::test]
async fn public_dir_serves_static_fallback() {
    let fx = sample_catalog();
    let public = TempDir::new().expect("tempdir");
    fs::write(public.path().join("index.html"), "<h1>shop</h1>").expect("write index");

    let store: Arc<dyn KeyedStore<Product>> =
        Arc::new(JsonFileStore::<Product>::new(&fx.path));
    let app = build_app(
        AppState {
            catalog: Arc::new(Catalog::new(store)),
        },
        Some(public.path()),
    );

    let response = app.oneshot(get("/index.html")).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(&body[..], b"<h1>shop</h1>");
}
