use crate::cli::{actions::Action, globals::GlobalArgs};
use crate::commerce::CartBindingStrategy;
use anyhow::{anyhow, Result};
use secrecy::SecretString;

pub fn handler(matches: &clap::ArgMatches) -> Result<(Action, GlobalArgs)> {
    let required = |name: &str| -> Result<String> {
        matches
            .get_one::<String>(name)
            .map(String::to_string)
            .ok_or_else(|| anyhow!("missing required argument: --{name}"))
    };

    let mut globals = GlobalArgs::new(required("rp-url")?);
    globals.commerce_url = required("commerce-url")?;
    globals.commerce_token = SecretString::from(required("commerce-token")?);
    globals.sku_source_url = required("sku-source-url")?;
    globals.store_origin = required("store-origin")?;
    globals.cookie_key = SecretString::from(required("cookie-key")?);
    globals.purpose = required("purpose")?;
    globals.cart_binding = matches
        .get_one::<CartBindingStrategy>("cart-binding")
        .copied()
        .unwrap_or(CartBindingStrategy::Cookie);

    let action = Action::Server {
        port: matches.get_one::<u16>("port").copied().unwrap_or(8080),
    };

    Ok((action, globals))
}
