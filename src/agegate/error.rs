use crate::commerce::CartError;
use crate::rp::RpError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Request-boundary error taxonomy. Every failure is rendered as
/// structured JSON; none is fatal to the process.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0} parameter is required")]
    MissingParameter(&'static str),
    #[error("No code parameter in query string")]
    MissingCode,
    #[error("Missing required cookies for token retrieval")]
    MissingFlowState,
    #[error("Invalid cartId or cart does not exist")]
    InvalidCartId,
    #[error("Failed to check restricted items")]
    CartFetchFailed(#[source] CartError),
    #[error("Upstream service unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("Token retrieval failed: {message}")]
    ProtocolExchangeFailed { message: String, code: String },
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingParameter(_)
            | Self::MissingCode
            | Self::MissingFlowState
            | Self::InvalidCartId
            | Self::CartFetchFailed(CartError::InvalidCartId) => StatusCode::BAD_REQUEST,
            Self::CartFetchFailed(CartError::Upstream(_))
            | Self::UpstreamUnavailable(_)
            | Self::ProtocolExchangeFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CartError> for ApiError {
    fn from(err: CartError) -> Self {
        Self::CartFetchFailed(err)
    }
}

impl From<RpError> for ApiError {
    fn from(err: RpError) -> Self {
        match err {
            RpError::Protocol { message, code, .. } => {
                Self::ProtocolExchangeFailed { message, code }
            }
            RpError::Upstream(message) => Self::UpstreamUnavailable(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::ProtocolExchangeFailed { message, code } => json!({
                "error": "Token Retrieval Failed",
                "errorMessage": message,
                "errorCode": code,
            }),
            other => json!({ "error": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::MissingParameter("cartId").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::MissingCode.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::MissingFlowState.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::CartFetchFailed(CartError::InvalidCartId).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::CartFetchFailed(CartError::Upstream("boom".to_string())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::ProtocolExchangeFailed {
                message: "nonce mismatch".to_string(),
                code: "invalid_grant".to_string(),
            }
            .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_from_rp_error() {
        let err = ApiError::from(RpError::Protocol {
            message: "state mismatch".to_string(),
            code: "invalid_request".to_string(),
            correlation_id: Some("abc".to_string()),
        });
        assert!(matches!(err, ApiError::ProtocolExchangeFailed { .. }));

        let err = ApiError::from(RpError::Upstream("timeout".to_string()));
        assert!(matches!(err, ApiError::UpstreamUnavailable(_)));
    }
}
