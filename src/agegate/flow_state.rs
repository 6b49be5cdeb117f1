//! Client-held flow state.
//!
//! One authorization attempt is correlated across the redirect round trip
//! by a set of signed cookies; the browser is the only holder of this
//! state. The codec here is the storage strategy — a server-side keyed
//! store could replace it behind the same put/get/clear contract.

use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};
use thiserror::Error;
use time::Duration;

pub const STATE_COOKIE: &str = "state";
pub const NONCE_COOKIE: &str = "nonce";
pub const CODE_VERIFIER_COOKIE: &str = "code_verifier";
pub const AUTH_SERVER_COOKIE: &str = "authorisation_server_id";
// Distinct from the long-lived cart-binding cookie, which must survive
// the flow being cleared.
pub const CART_ID_COOKIE: &str = "flow_cart_id";

const ALL_COOKIES: [&str; 5] = [
    STATE_COOKIE,
    NONCE_COOKIE,
    CODE_VERIFIER_COOKIE,
    AUTH_SERVER_COOKIE,
    CART_ID_COOKIE,
];

/// Recommended lifetime of an in-flight flow.
pub const DEFAULT_TTL: Duration = Duration::minutes(3);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("missing flow state")]
pub struct MissingFlowState;

/// The correlated values tying one authentication attempt together.
/// All four primary fields must be present before a token exchange may
/// proceed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowState {
    pub state: String,
    pub nonce: String,
    pub code_verifier: String,
    pub authorisation_server_id: String,
    pub cart_id: Option<String>,
}

/// Cookie-backed store for [`FlowState`]. Expiry is enforced by the cookie
/// `Max-Age`, not by application code re-checking timestamps.
#[derive(Debug, Clone, Copy)]
pub struct FlowStateStore {
    ttl: Duration,
}

impl Default for FlowStateStore {
    fn default() -> Self {
        Self { ttl: DEFAULT_TTL }
    }
}

impl FlowStateStore {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self { ttl }
    }

    /// Write the flow state as signed cookies. All entries are written or
    /// none — the caller only gets the returned jar on success.
    #[must_use]
    pub fn put(&self, jar: SignedCookieJar, flow_state: &FlowState) -> SignedCookieJar {
        let mut jar = jar
            .add(self.cookie(STATE_COOKIE, flow_state.state.clone()))
            .add(self.cookie(NONCE_COOKIE, flow_state.nonce.clone()))
            .add(self.cookie(CODE_VERIFIER_COOKIE, flow_state.code_verifier.clone()))
            .add(self.cookie(
                AUTH_SERVER_COOKIE,
                flow_state.authorisation_server_id.clone(),
            ));

        if let Some(cart_id) = &flow_state.cart_id {
            jar = jar.add(self.cookie(CART_ID_COOKIE, cart_id.clone()));
        }

        jar
    }

    /// Read the flow state back. A tampered signature reads as an absent
    /// cookie; any absent required field is a terminal precondition
    /// failure.
    ///
    /// # Errors
    /// `MissingFlowState` when any of the four required cookies is absent.
    pub fn get(&self, jar: &SignedCookieJar) -> Result<FlowState, MissingFlowState> {
        let required = |name: &str| -> Result<String, MissingFlowState> {
            jar.get(name)
                .map(|cookie| cookie.value().to_string())
                .filter(|value| !value.is_empty())
                .ok_or(MissingFlowState)
        };

        Ok(FlowState {
            state: required(STATE_COOKIE)?,
            nonce: required(NONCE_COOKIE)?,
            code_verifier: required(CODE_VERIFIER_COOKIE)?,
            authorisation_server_id: required(AUTH_SERVER_COOKIE)?,
            cart_id: jar
                .get(CART_ID_COOKIE)
                .map(|cookie| cookie.value().to_string()),
        })
    }

    /// Remove every flow-state cookie. Idempotent; absent entries are
    /// removed again without complaint.
    #[must_use]
    pub fn clear(&self, jar: SignedCookieJar) -> SignedCookieJar {
        ALL_COOKIES.iter().fold(jar, |jar, name| {
            jar.remove(Cookie::build((*name, "")).path("/").build())
        })
    }

    fn cookie(&self, name: &'static str, value: String) -> Cookie<'static> {
        Cookie::build((name, value))
            .path("/")
            .http_only(true)
            .secure(true)
            .same_site(SameSite::None)
            .max_age(self.ttl)
            .build()
    }
}
