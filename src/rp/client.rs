use super::{PushedAuthorisation, RelyingParty, RpError, TokenExchange};
use crate::{agegate::claims::ClaimEntry, cli::globals::GlobalArgs, APP_USER_AGENT};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{error, instrument};

/// HTTP client for the relying-party SDK service.
#[derive(Debug, Clone)]
pub struct HttpRelyingParty {
    client: Client,
    base_url: String,
}

impl HttpRelyingParty {
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(globals: &GlobalArgs) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: globals.rp_url.trim_end_matches('/').to_string(),
        })
    }

    async fn reject(response: Response) -> RpError {
        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        let message = body["error"]
            .as_str()
            .unwrap_or("authorisation exchange failed")
            .to_string();
        let correlation_id = body["xFapiInteractionId"]
            .as_str()
            .map(ToString::to_string);

        if status.is_client_error() {
            let code = body["errorCode"]
                .as_str()
                .unwrap_or(status.as_str())
                .to_string();
            RpError::Protocol {
                message,
                code,
                correlation_id,
            }
        } else {
            RpError::Upstream(format!("{status}, {message}"))
        }
    }
}

#[async_trait]
impl RelyingParty for HttpRelyingParty {
    #[instrument(skip(self, essential_claims, voluntary_claims))]
    async fn send_pushed_authorisation_request(
        &self,
        auth_server_id: &str,
        essential_claims: &[ClaimEntry],
        voluntary_claims: &[ClaimEntry],
        purpose: &str,
    ) -> Result<PushedAuthorisation, RpError> {
        let payload = json!({
            "authorisationServerId": auth_server_id,
            "essentialClaims": essential_claims,
            "voluntaryClaims": voluntary_claims,
            "purpose": purpose,
        });

        let response = self
            .client
            .post(format!("{}/par", self.base_url))
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!("Error sending PAR: {e}");
                RpError::Upstream(e.to_string())
            })?;

        if !response.status().is_success() {
            return Err(Self::reject(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| RpError::Upstream(format!("invalid PAR response: {e}")))
    }

    #[instrument(skip(self, query, code_verifier, state, nonce))]
    async fn retrieve_tokens(
        &self,
        auth_server_id: &str,
        query: &HashMap<String, String>,
        code_verifier: &str,
        state: &str,
        nonce: &str,
    ) -> Result<TokenExchange, RpError> {
        let payload = json!({
            "authorisationServerId": auth_server_id,
            "query": query,
            "codeVerifier": code_verifier,
            "state": state,
            "nonce": nonce,
        });

        let response = self
            .client
            .post(format!("{}/retrieve-tokens", self.base_url))
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!("Error retrieving tokens: {e}");
                RpError::Upstream(e.to_string())
            })?;

        if !response.status().is_success() {
            return Err(Self::reject(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| RpError::Upstream(format!("invalid token response: {e}")))
    }
}
