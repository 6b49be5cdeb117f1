//! Non-verifying decode of the ID-token payload.
//!
//! Signature and audience validation already happened inside the SDK; the
//! decoded payload is only returned for display and audit.

use base64ct::{Base64UrlUnpadded, Encoding};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid token format")]
    TokenFormat,
    #[error("invalid base64url encoding")]
    Base64,
    #[error("invalid json")]
    Json(#[from] serde_json::Error),
}

/// Decode the payload segment of a compact JWS into structured JSON.
///
/// # Errors
/// Fails when the token is not three dot-separated segments, the payload is
/// not base64url, or the payload is not a JSON object.
pub fn decode_payload(id_token: &str) -> Result<Value, Error> {
    let segments: Vec<&str> = id_token.split('.').collect();
    if segments.len() != 3 {
        return Err(Error::TokenFormat);
    }

    let payload = Base64UrlUnpadded::decode_vec(segments[1]).map_err(|_| Error::Base64)?;
    let value: Value = serde_json::from_slice(&payload)?;

    if !value.is_object() {
        return Err(Error::TokenFormat);
    }

    Ok(value)
}
