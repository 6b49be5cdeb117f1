//! Boundary to the external relying-party SDK.
//!
//! The SDK owns the OIDC/FAPI protocol work: request signing, PAR
//! submission, the token-endpoint call, and ID-token signature, state,
//! nonce and audience validation. This crate only orchestrates around it
//! and never duplicates those checks.

pub mod client;
pub mod id_token;

pub use self::client::HttpRelyingParty;

use crate::agegate::claims::ClaimEntry;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpError {
    /// The authorization server or the SDK rejected the exchange, for
    /// example on a state or nonce mismatch. The flow must restart.
    #[error("authorisation exchange rejected: {message}")]
    Protocol {
        message: String,
        code: String,
        correlation_id: Option<String>,
    },
    /// Transport-level failure; the same flow step is safe to retry.
    #[error("authorisation server unavailable: {0}")]
    Upstream(String),
}

impl RpError {
    #[must_use]
    pub fn correlation_id(&self) -> Option<&str> {
        match self {
            Self::Protocol { correlation_id, .. } => correlation_id.as_deref(),
            Self::Upstream(_) => None,
        }
    }
}

/// Result of a pushed authorisation request. All of `code_verifier`,
/// `state` and `nonce` must make it into the flow state for the later
/// token exchange to succeed.
#[derive(Debug, Clone, Deserialize)]
pub struct PushedAuthorisation {
    #[serde(rename = "authUrl")]
    pub auth_url: String,
    pub code_verifier: String,
    pub state: String,
    pub nonce: String,
    #[serde(rename = "xFapiInteractionId")]
    pub correlation_id: Option<String>,
}

/// Result of a completed token exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenExchange {
    #[serde(default)]
    pub claims: Map<String, Value>,
    pub id_token: String,
    #[serde(rename = "xFapiInteractionId")]
    pub correlation_id: Option<String>,
}

#[async_trait]
pub trait RelyingParty: Send + Sync {
    /// Push the authorisation parameters to the bank's authorization
    /// server ahead of the redirect.
    ///
    /// # Errors
    /// `RpError::Protocol` when the server rejects the request,
    /// `RpError::Upstream` on transport failure.
    async fn send_pushed_authorisation_request(
        &self,
        auth_server_id: &str,
        essential_claims: &[ClaimEntry],
        voluntary_claims: &[ClaimEntry],
        purpose: &str,
    ) -> Result<PushedAuthorisation, RpError>;

    /// Exchange the authorization code for tokens. The SDK matches
    /// `state`/`nonce` and validates the ID token; the full callback query
    /// is passed through untouched.
    ///
    /// # Errors
    /// `RpError::Protocol` when the exchange is rejected,
    /// `RpError::Upstream` on transport failure.
    async fn retrieve_tokens(
        &self,
        auth_server_id: &str,
        query: &HashMap<String, String>,
        code_verifier: &str,
        state: &str,
        nonce: &str,
    ) -> Result<TokenExchange, RpError>;
}
