use crate::agegate::{
    claims::{ClaimEntry, ClaimRequest, Over18Descriptor},
    error::ApiError,
    flow_state::FlowState,
    AppState,
};
use axum::{
    extract::Extension,
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::SignedCookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, instrument};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelectBankRequest {
    #[serde(default)]
    pub essential_claims: Vec<ClaimEntry>,
    #[serde(default)]
    pub voluntary_claims: Vec<ClaimEntry>,
    pub purpose: Option<String>,
    pub authorisation_server_id: Option<String>,
    pub cart_id: Option<String>,
    pub claims: Option<Over18Descriptor>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SelectBankResponse {
    #[serde(rename = "authUrl")]
    pub auth_url: String,
}

#[utoipa::path(
    post,
    path = "/select-bank",
    request_body = SelectBankRequest,
    responses(
        (status = 200, description = "PAR accepted, redirect URL returned", body = SelectBankResponse),
        (status = 400, description = "Missing required parameter"),
        (status = 500, description = "Authorisation server rejected or unreachable"),
    ),
    tag = "flow"
)]
#[instrument(skip(state, headers, payload))]
pub async fn select_bank(
    state: Extension<Arc<AppState>>,
    headers: HeaderMap,
    payload: Option<Json<SelectBankRequest>>,
) -> Response {
    let Some(Json(request)) = payload else {
        return ApiError::MissingParameter("authorisationServerId").into_response();
    };

    let Some(auth_server_id) = request
        .authorisation_server_id
        .as_deref()
        .filter(|id| !id.is_empty())
    else {
        error!("authorisationServerId parameter is required");
        return ApiError::MissingParameter("authorisationServerId").into_response();
    };

    // Restricted-item gating is wired to the same flow; a flow without a
    // cart cannot be completed at checkout.
    let Some(cart_id) = request.cart_id.as_deref().filter(|id| !id.is_empty()) else {
        error!("cartId parameter is required");
        return ApiError::MissingParameter("cartId").into_response();
    };

    let claim_request = ClaimRequest::build(
        request.essential_claims,
        request.voluntary_claims,
        request.purpose,
        &state.config.purpose,
        request.claims.as_ref(),
    );

    debug!(
        "Sending PAR to authorisationServerId='{auth_server_id}', essential={}, voluntary={}",
        claim_request.essential.len(),
        claim_request.voluntary.len()
    );

    let pushed = match state
        .relying_party
        .send_pushed_authorisation_request(
            auth_server_id,
            &claim_request.essential,
            &claim_request.voluntary,
            &claim_request.purpose,
        )
        .await
    {
        Ok(pushed) => pushed,
        Err(err) => {
            // No flow state is written on failure
            if let Some(correlation_id) = err.correlation_id() {
                error!("PAR request failed: {err}, x-fapi-interaction-id={correlation_id}");
            } else {
                error!("PAR request failed: {err}");
            }
            return ApiError::from(err).into_response();
        }
    };

    if let Some(correlation_id) = &pushed.correlation_id {
        info!(
            "PAR sent to authorisationServerId='{auth_server_id}', x-fapi-interaction-id={correlation_id}"
        );
    }

    let flow_state = FlowState {
        state: pushed.state,
        nonce: pushed.nonce,
        code_verifier: pushed.code_verifier,
        authorisation_server_id: auth_server_id.to_string(),
        cart_id: Some(cart_id.to_string()),
    };

    let jar = SignedCookieJar::from_headers(&headers, state.cookie_key.clone());
    let jar = state.flow_store.put(jar, &flow_state);

    (
        jar,
        Json(SelectBankResponse {
            auth_url: pushed.auth_url,
        }),
    )
        .into_response()
}
