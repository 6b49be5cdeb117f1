pub mod cart;
pub mod sku_cache;

pub use self::cart::{CartError, CartGateway, CartItem, CartSnapshot, CommerceClient};
pub use self::sku_cache::{HttpSkuSource, SkuCache, SkuSource};

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, RwLock};

/// Where a validated cart id is bound for the rest of the browsing session.
///
/// `Cookie` stores it in a long-lived signed cookie on the client; `Session`
/// keeps it in a process-local map keyed by a signed session-id cookie. Both
/// sit behind the same bind/lookup surface so the choice stays a
/// configuration flag rather than a code fork.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartBindingStrategy {
    Cookie,
    Session,
}

impl FromStr for CartBindingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cookie" => Ok(Self::Cookie),
            "session" => Ok(Self::Session),
            _ => Err(format!("invalid cart binding strategy: {s}")),
        }
    }
}

impl fmt::Display for CartBindingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cookie => write!(f, "cookie"),
            Self::Session => write!(f, "session"),
        }
    }
}

/// Process-local cart bindings for the `Session` strategy, keyed by the
/// session id carried in a signed cookie.
#[derive(Debug, Clone, Default)]
pub struct SessionCartStore {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl SessionCartStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a validated cart id for a session.
    ///
    /// # Errors
    /// Returns an error when the store lock is poisoned.
    pub fn bind(&self, session_id: &str, cart_id: &str) -> anyhow::Result<()> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| anyhow::anyhow!("session cart store lock poisoned"))?;
        map.insert(session_id.to_string(), cart_id.to_string());
        Ok(())
    }

    #[must_use]
    pub fn lookup(&self, session_id: &str) -> Option<String> {
        self.inner
            .read()
            .ok()
            .and_then(|map| map.get(session_id).cloned())
    }
}
