//! OpenAPI configuration.

use crate::api::product::product_repository;
use crate::api::{info::info_api, product::product_api};
use utoipa::OpenApi;

/// OpenApi configuration.
#[derive(OpenApi)]
#[openapi(
    paths(
        info_api::info,
        product_api::create_product,
        product_api::list_products,
        product_api::get_product,
        product_api::update_product,
        product_api::delete_product,
    ),
    components(
        schemas(
            info_api::AppInfo,
            product_repository::NewProduct,
            product_repository::ProductPatch,
            product_repository::Product,
            product_repository::ProductPage,
            crate::infra::error::ErrorBody
        )
    )
)]
#[derive(Clone, Copy, Debug)]
pub struct ApiDoc;
