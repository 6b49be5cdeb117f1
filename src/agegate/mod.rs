use crate::cli::globals::GlobalArgs;
use crate::commerce::{
    CartBindingStrategy, CartGateway, CommerceClient, HttpSkuSource, SessionCartStore, SkuCache,
};
use crate::rp::{HttpRelyingParty, RelyingParty};
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method, Request,
    },
    routing::{get, post},
    Extension, Router,
};
use axum_extra::extract::cookie::Key;
use secrecy::ExposeSecret;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod claims;
pub mod error;
pub mod flow_state;
pub mod handlers;
mod openapi;

pub use openapi::ApiDoc;

use flow_state::FlowStateStore;

/// Behavior knobs resolved at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub purpose: String,
    pub cart_binding: CartBindingStrategy,
}

/// Shared, read-mostly dependencies handed to every request handler.
pub struct AppState {
    pub relying_party: Arc<dyn RelyingParty>,
    pub cart_gateway: Arc<dyn CartGateway>,
    pub sku_cache: SkuCache,
    pub session_carts: SessionCartStore,
    pub cookie_key: Key,
    pub flow_store: FlowStateStore,
    pub config: AppConfig,
}

/// Build the application router around the given state.
///
/// # Errors
/// Returns an error when the store origin is not a valid header value.
pub fn app(state: Arc<AppState>, store_origin: &str) -> Result<Router> {
    let origin = HeaderValue::from_str(store_origin)
        .with_context(|| format!("Invalid store origin: {store_origin}"))?;

    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(AllowOrigin::exact(origin))
        .allow_credentials(true);

    let router = Router::new()
        .route("/select-bank", post(handlers::select_bank))
        .route("/retrieve-tokens", get(handlers::retrieve_tokens))
        .route("/restricted-items", post(handlers::restricted_items))
        .route("/set-cart-id", post(handlers::set_cart_id))
        .route("/health", get(handlers::health))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &Request<Body>| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(state)),
        );

    Ok(router)
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, globals: &GlobalArgs) -> Result<()> {
    let relying_party = Arc::new(HttpRelyingParty::new(globals)?);
    let cart_gateway = Arc::new(CommerceClient::new(globals)?);
    let sku_source = Arc::new(HttpSkuSource::new(globals)?);

    let state = Arc::new(AppState {
        relying_party,
        cart_gateway,
        sku_cache: SkuCache::new(sku_source),
        session_carts: SessionCartStore::new(),
        cookie_key: Key::derive_from(globals.cookie_key.expose_secret().as_bytes()),
        flow_store: FlowStateStore::default(),
        config: AppConfig {
            purpose: globals.purpose.clone(),
            cart_binding: globals.cart_binding,
        },
    });

    let app = app(state, &globals.store_origin)?;

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
