//! Catalog handlers.
//!
//! - `GET  /api/products`        full catalog in document order
//! - `POST /api/purchase/{id}`   decrement stock by `{ "qty": n }`

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use minishop_core::Product;
use serde::Deserialize;
use serde_json::Value;

use crate::middleware::RequestId;

use super::{map_catalog_error, run_catalog, ApiError, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct PurchaseRequest {
    #[serde(default)]
    qty: Option<Value>,
}

pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<Vec<Product>>, ApiError> {
    const FAILURE: &str = "Failed to load products";

    match run_catalog(&state.catalog, |c| c.list_products()).await {
        Ok(Ok(products)) => Ok(Json(products)),
        Ok(Err(e)) => Err(map_catalog_error(req_id.0, &e, FAILURE)),
        Err(e) => {
            tracing::error!(error = %e, "list products task failed");
            Err(ApiError::new(req_id.0, "internal_error", FAILURE))
        }
    }
}

/// POST /api/purchase/{id}: take `qty` units out of stock.
///
/// A missing, malformed or non-integer `qty` is a validation error, the same
/// as a non-positive one.
pub(super) async fn purchase_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
    body: Result<Json<PurchaseRequest>, JsonRejection>,
) -> Result<Json<Product>, ApiError> {
    const FAILURE: &str = "Purchase failed";

    let qty = match body {
        Ok(Json(request)) => request.qty.as_ref().and_then(parse_qty),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "rejected purchase body");
            None
        }
    };
    let Some(qty) = qty else {
        return Err(ApiError::new(req_id.0, "validation_error", "Invalid quantity"));
    };

    match run_catalog(&state.catalog, move |c| c.decrement_stock(&id, qty)).await {
        Ok(Ok(product)) => Ok(Json(product)),
        Ok(Err(e)) => Err(map_catalog_error(req_id.0, &e, FAILURE)),
        Err(e) => {
            tracing::error!(error = %e, "purchase task failed");
            Err(ApiError::new(req_id.0, "internal_error", FAILURE))
        }
    }
}

/// Reads `qty` as an integer. Accepts JSON integers, integral floats such as
/// `3.0`, and integer strings such as `"3"`. Sign is checked later.
#[allow(clippy::cast_possible_truncation)]
fn parse_qty(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::parse_qty;

    #[test]
    fn parse_qty_accepts_integers_and_integer_strings() {
        assert_eq!(parse_qty(&json!(3)), Some(3));
        assert_eq!(parse_qty(&json!(-1)), Some(-1));
        assert_eq!(parse_qty(&json!(4.0)), Some(4));
        assert_eq!(parse_qty(&json!(" 7 ")), Some(7));
    }

    #[test]
    fn parse_qty_rejects_fractions_and_non_numbers() {
        assert_eq!(parse_qty(&json!(2.5)), None);
        assert_eq!(parse_qty(&json!("two")), None);
        assert_eq!(parse_qty(&json!("2.5")), None);
        assert_eq!(parse_qty(&json!(null)), None);
        assert_eq!(parse_qty(&json!([1])), None);
        assert_eq!(parse_qty(&json!(true)), None);
    }
}
