use crate::agegate::{error::ApiError, AppState};
use crate::rp::{id_token, RpError};
use axum::{
    extract::{Extension, Query},
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::SignedCookieJar;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenBody {
    pub raw: String,
    #[schema(value_type = Object)]
    pub decoded: Value,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RetrieveTokensResponse {
    #[schema(value_type = Object)]
    pub claims: Map<String, Value>,
    pub token: TokenBody,
    #[serde(rename = "xFapiInteractionId", skip_serializing_if = "Option::is_none")]
    pub x_fapi_interaction_id: Option<String>,
}

#[utoipa::path(
    get,
    path = "/retrieve-tokens",
    responses(
        (status = 200, description = "Tokens exchanged, claims returned", body = RetrieveTokensResponse),
        (status = 400, description = "Missing code or flow-state cookies"),
        (status = 500, description = "Exchange rejected or authorisation server unreachable"),
    ),
    tag = "flow"
)]
#[instrument(skip(state, headers, query))]
pub async fn retrieve_tokens(
    state: Extension<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if query.get("code").filter(|code| !code.is_empty()).is_none() {
        error!("No code parameter in query string");
        return ApiError::MissingCode.into_response();
    }

    let jar = SignedCookieJar::from_headers(&headers, state.cookie_key.clone());

    // Absent or expired cookies are terminal; the flow restarts at
    // /select-bank. No exchange is attempted.
    let Ok(flow_state) = state.flow_store.get(&jar) else {
        error!("Missing required cookies for token retrieval");
        return ApiError::MissingFlowState.into_response();
    };

    // State/nonce matching and token validation happen inside the SDK.
    let exchange = state
        .relying_party
        .retrieve_tokens(
            &flow_state.authorisation_server_id,
            &query,
            &flow_state.code_verifier,
            &flow_state.state,
            &flow_state.nonce,
        )
        .await;

    let exchange = match exchange {
        Ok(exchange) => exchange,
        Err(err) => {
            if let Some(correlation_id) = err.correlation_id() {
                error!("Error retrieving tokens: {err}, x-fapi-interaction-id={correlation_id}");
            } else {
                error!("Error retrieving tokens: {err}");
            }
            return match err {
                // The exchange itself was rejected; the stale flow state
                // must not be replayable, so the cookies go too.
                RpError::Protocol { .. } => {
                    let jar = state.flow_store.clear(jar);
                    (jar, ApiError::from(err)).into_response()
                }
                // Transport failure: keep the cookies so the caller can
                // retry the same step within the TTL.
                RpError::Upstream(_) => ApiError::from(err).into_response(),
            };
        }
    };

    let decoded = match id_token::decode_payload(&exchange.id_token) {
        Ok(decoded) => decoded,
        Err(err) => {
            error!("Failed to decode id_token: {err}");
            let jar = state.flow_store.clear(jar);
            return (
                jar,
                ApiError::ProtocolExchangeFailed {
                    message: "invalid id_token in exchange response".to_string(),
                    code: "invalid_token".to_string(),
                },
            )
                .into_response();
        }
    };

    if let Some(correlation_id) = &exchange.correlation_id {
        info!("Tokens retrieved, x-fapi-interaction-id={correlation_id}");
    }

    // Clearing only happens after a successful exchange
    let jar = state.flow_store.clear(jar);

    (
        jar,
        Json(RetrieveTokensResponse {
            claims: exchange.claims,
            token: TokenBody {
                raw: exchange.id_token,
                decoded,
            },
            x_fapi_interaction_id: exchange.correlation_id,
        }),
    )
        .into_response()
}
