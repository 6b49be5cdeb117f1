use utoipa::OpenApi;

use super::claims::{ClaimEntry, Over18Descriptor};
use super::handlers::restricted_items::{RestrictedItemsRequest, RestrictedItemsResponse};
use super::handlers::retrieve_tokens::{RetrieveTokensResponse, TokenBody};
use super::handlers::select_bank::{SelectBankRequest, SelectBankResponse};
use super::handlers::set_cart_id::{SetCartIdRequest, SetCartIdResponse};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "agegate",
        description = "Identity verification for age-restricted checkout"
    ),
    paths(
        super::handlers::health::health,
        super::handlers::select_bank::select_bank,
        super::handlers::retrieve_tokens::retrieve_tokens,
        super::handlers::restricted_items::restricted_items,
        super::handlers::set_cart_id::set_cart_id,
    ),
    components(schemas(
        ClaimEntry,
        Over18Descriptor,
        SelectBankRequest,
        SelectBankResponse,
        RetrieveTokensResponse,
        TokenBody,
        RestrictedItemsRequest,
        RestrictedItemsResponse,
        SetCartIdRequest,
        SetCartIdResponse,
    )),
    tags(
        (name = "flow", description = "PAR and authorization-code exchange"),
        (name = "gating", description = "Restricted-item checks and cart binding"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;
