use crate::agegate::{error::ApiError, AppState};
use axum::{
    extract::Extension,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, instrument};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RestrictedItemsRequest {
    pub cart_id: Option<String>,
    /// Bypass token asserting that authentication already occurred.
    pub code: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RestrictedItemsResponse {
    #[serde(rename = "restrictedSKUs")]
    pub restricted_skus: Vec<String>,
}

#[utoipa::path(
    post,
    path = "/restricted-items",
    request_body = RestrictedItemsRequest,
    responses(
        (status = 200, description = "Restricted SKUs found in the cart; empty list means allowed", body = RestrictedItemsResponse),
        (status = 400, description = "Missing or invalid cart id"),
        (status = 500, description = "Cart or SKU source unavailable"),
    ),
    tag = "gating"
)]
#[instrument(skip(state, payload))]
pub async fn restricted_items(
    state: Extension<Arc<AppState>>,
    payload: Option<Json<RestrictedItemsRequest>>,
) -> Response {
    let Some(Json(request)) = payload else {
        return ApiError::MissingParameter("cartId").into_response();
    };

    // A bypass code means the caller already completed authentication;
    // the cart and the SKU set are not consulted at all.
    if request.code.as_deref().is_some_and(|code| !code.is_empty()) {
        debug!("Bypass code provided, skipping restricted item checks");
        return Json(RestrictedItemsResponse {
            restricted_skus: Vec::new(),
        })
        .into_response();
    }

    let Some(cart_id) = request.cart_id.as_deref().filter(|id| !id.is_empty()) else {
        error!("cartId parameter is required");
        return ApiError::MissingParameter("cartId").into_response();
    };

    if let Err(err) = state.sku_cache.ensure_loaded().await {
        error!("Failed to load restricted SKUs: {err}");
        return ApiError::UpstreamUnavailable("failed to load restricted SKUs".to_string())
            .into_response();
    }

    let snapshot = match state.cart_gateway.validate(cart_id).await {
        Ok(snapshot) => snapshot,
        Err(err) => {
            error!("Error fetching cart {cart_id}: {err}");
            return ApiError::from(err).into_response();
        }
    };

    let restricted_skus = state
        .sku_cache
        .restricted_among(&snapshot.skus_upper())
        .await;

    Json(RestrictedItemsResponse { restricted_skus }).into_response()
}
