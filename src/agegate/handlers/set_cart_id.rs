use crate::agegate::{error::ApiError, AppState};
use crate::commerce::CartBindingStrategy;
use axum::{
    extract::Extension,
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};
use rand::{distributions::Alphanumeric, Rng};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, OnceLock};
use time::Duration;
use tracing::{error, info, instrument};
use utoipa::ToSchema;

pub const CART_BINDING_COOKIE: &str = "cartId";
pub const SESSION_ID_COOKIE: &str = "sessionId";

// A cart binding outlives any single flow
const BINDING_TTL: Duration = Duration::weeks(1);

fn cart_id_shape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9-]{2,63}$").unwrap())
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetCartIdRequest {
    pub cart_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SetCartIdResponse {
    pub message: String,
    #[schema(value_type = Object)]
    pub cart: Value,
}

#[utoipa::path(
    post,
    path = "/set-cart-id",
    request_body = SetCartIdRequest,
    responses(
        (status = 200, description = "Cart validated and bound to the session", body = SetCartIdResponse),
        (status = 400, description = "Missing or invalid cart id"),
        (status = 500, description = "Commerce platform unavailable"),
    ),
    tag = "gating"
)]
#[instrument(skip(state, headers, payload))]
pub async fn set_cart_id(
    state: Extension<Arc<AppState>>,
    headers: HeaderMap,
    payload: Option<Json<SetCartIdRequest>>,
) -> Response {
    let Some(Json(request)) = payload else {
        return ApiError::MissingParameter("cartId").into_response();
    };

    let Some(cart_id) = request.cart_id.as_deref().filter(|id| !id.is_empty()) else {
        error!("cartId parameter is required");
        return ApiError::MissingParameter("cartId").into_response();
    };

    // Reject malformed ids before spending a round trip on the platform
    if !cart_id_shape().is_match(cart_id) {
        error!("Malformed cartId: {cart_id}");
        return ApiError::InvalidCartId.into_response();
    }

    let snapshot = match state.cart_gateway.validate(cart_id).await {
        Ok(snapshot) => snapshot,
        Err(err) => {
            error!("Error validating cart {cart_id}: {err}");
            return match err {
                crate::commerce::CartError::InvalidCartId => {
                    ApiError::InvalidCartId.into_response()
                }
                crate::commerce::CartError::Upstream(message) => {
                    ApiError::UpstreamUnavailable(message).into_response()
                }
            };
        }
    };

    info!("Cart {cart_id} validated");

    let jar = SignedCookieJar::from_headers(&headers, state.cookie_key.clone());

    // Binding failure is reported but does not invalidate the validated
    // cart.
    let (jar, message) = match state.config.cart_binding {
        CartBindingStrategy::Cookie => {
            let jar = jar.add(binding_cookie(CART_BINDING_COOKIE, cart_id.to_string()));
            (jar, "Cart ID stored successfully".to_string())
        }
        CartBindingStrategy::Session => {
            let (jar, session_id) = session_id(jar);
            match state.session_carts.bind(&session_id, cart_id) {
                Ok(()) => (jar, "Cart ID stored successfully".to_string()),
                Err(err) => {
                    error!("Failed to bind cart {cart_id} to session: {err}");
                    (jar, "Cart ID validated, binding failed".to_string())
                }
            }
        }
    };

    (
        jar,
        Json(SetCartIdResponse {
            message,
            cart: snapshot.document,
        }),
    )
        .into_response()
}

/// Reuse the caller's session id or mint a new one.
fn session_id(jar: SignedCookieJar) -> (SignedCookieJar, String) {
    if let Some(cookie) = jar.get(SESSION_ID_COOKIE) {
        let id = cookie.value().to_string();
        return (jar, id);
    }

    let id: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();

    let jar = jar.add(binding_cookie(SESSION_ID_COOKIE, id.clone()));
    (jar, id)
}

fn binding_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .max_age(BINDING_TTL)
        .build()
}
