//! # Agegate (Checkout Identity Verification)
//!
//! `agegate` orchestrates a bank-hosted identity-verification flow at
//! e-commerce checkout. It drives a Pushed-Authorization-Request (PAR) +
//! authorization-code exchange through an external relying-party SDK, binds
//! the in-flight flow to the browser with short-lived signed cookies, and
//! gates purchase of age-restricted items based on the claims that come back.
//!
//! ## Flow model
//!
//! - `POST /select-bank` shapes the claim request, pushes it to the
//!   authorization server via the relying-party boundary, and seeds the
//!   signed flow-state cookies (`state`, `nonce`, `code_verifier`,
//!   `authorisation_server_id`).
//! - The browser authenticates at the bank and returns with an
//!   authorization code.
//! - `GET /retrieve-tokens` exchanges the code using the cookie-held flow
//!   state and clears the cookies once the exchange succeeds.
//!
//! The browser is the sole holder of flow state; nothing is persisted
//! server-side beyond one redirect round trip. Two initiations from the same
//! browser before a completion overwrite each other (last-write-wins, one
//! active flow per client).
//!
//! ## Restricted-item gating
//!
//! `POST /restricted-items` intersects the cart contents with a lazily
//! loaded, process-lifetime set of restricted product codes. A caller that
//! already completed authentication passes a bypass code and skips the check.

pub mod agegate;
pub mod cli;
pub mod commerce;
pub mod rp;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
