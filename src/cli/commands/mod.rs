use crate::commerce::CartBindingStrategy;
use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ColorChoice, Command,
};

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

pub fn validator_cookie_key() -> ValueParser {
    ValueParser::from(
        move |key: &str| -> std::result::Result<String, String> {
            if key.len() < 32 {
                return Err("cookie key must be at least 32 bytes".to_string());
            }
            Ok(key.to_string())
        },
    )
}

pub fn validator_cart_binding() -> ValueParser {
    ValueParser::from(
        move |strategy: &str| -> std::result::Result<CartBindingStrategy, String> {
            strategy.parse()
        },
    )
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("agegate")
        .about("Identity verification for age-restricted checkout")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("AGEGATE_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("rp-url")
                .long("rp-url")
                .help("Base URL of the relying-party SDK service handling PAR and token exchange")
                .env("AGEGATE_RP_URL")
                .required(true),
        )
        .arg(
            Arg::new("commerce-url")
                .long("commerce-url")
                .help("Base URL of the commerce platform API, example: https://api.bigcommerce.com/stores/<hash>/v3")
                .env("AGEGATE_COMMERCE_URL")
                .required(true),
        )
        .arg(
            Arg::new("commerce-token")
                .long("commerce-token")
                .help("Access token for the commerce platform API")
                .env("AGEGATE_COMMERCE_TOKEN")
                .required(true),
        )
        .arg(
            Arg::new("sku-source-url")
                .long("sku-source-url")
                .help("URL returning the list of restricted product codes")
                .env("AGEGATE_SKU_SOURCE_URL")
                .required(true),
        )
        .arg(
            Arg::new("store-origin")
                .long("store-origin")
                .help("Storefront origin allowed by CORS, example: https://store.example.com")
                .env("AGEGATE_STORE_ORIGIN")
                .required(true),
        )
        .arg(
            Arg::new("cookie-key")
                .long("cookie-key")
                .help("Key material for signing flow-state cookies (at least 32 bytes)")
                .env("AGEGATE_COOKIE_KEY")
                .required(true)
                .value_parser(validator_cookie_key()),
        )
        .arg(
            Arg::new("purpose")
                .long("purpose")
                .help("Default purpose sent with a pushed authorisation request")
                .default_value("verify your identity")
                .env("AGEGATE_PURPOSE"),
        )
        .arg(
            Arg::new("cart-binding")
                .long("cart-binding")
                .help("Where a validated cart id is bound: cookie or session")
                .default_value("cookie")
                .env("AGEGATE_CART_BINDING")
                .value_parser(validator_cart_binding()),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("AGEGATE_LOG_LEVEL")
                .global(true)
                .action(clap::ArgAction::Count)
                .value_parser(validator_log_level()),
        )
}
