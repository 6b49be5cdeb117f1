use secrecy::SecretString;

use crate::commerce::CartBindingStrategy;

/// Process-wide configuration shared by the request handlers and the
/// outbound gateways. Secrets stay wrapped until the call site needs them.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub rp_url: String,
    pub commerce_url: String,
    pub commerce_token: SecretString,
    pub sku_source_url: String,
    pub store_origin: String,
    pub cookie_key: SecretString,
    pub purpose: String,
    pub cart_binding: CartBindingStrategy,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(rp_url: String) -> Self {
        Self {
            rp_url,
            commerce_url: String::new(),
            commerce_token: SecretString::default(),
            sku_source_url: String::new(),
            store_origin: String::new(),
            cookie_key: SecretString::default(),
            purpose: String::new(),
            cart_binding: CartBindingStrategy::Cookie,
        }
    }
}
