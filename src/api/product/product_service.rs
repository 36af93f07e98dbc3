//! A service for interacting with products.
//!
//! Both the REST API and the message API go through this module, so
//! business rules such as what counts as a missing product live here
//! rather than in the transport layers.

use crate::{
    api::product::product_repository::{self, NewProduct, Product, ProductPage, ProductPatch},
    infra::{
        database::Tx,
        error::{ApiError, ApiResult, ClientError},
        pagination::PaginationParams,
        validation::Valid,
    },
};
use tracing::instrument;

fn product_not_found() -> ApiError {
    ClientError::NotFound("Product not found".to_string()).into()
}

/// Creates a new product.
#[instrument(skip(tx))]
pub async fn create_product(tx: &mut Tx, new_product: Valid<NewProduct>) -> ApiResult<Product> {
    product_repository::create_product(tx, new_product).await
}

/// Lists one page of products along with pagination metadata.
#[instrument(skip(tx))]
pub async fn list_products(tx: &mut Tx, params: &PaginationParams) -> ApiResult<ProductPage> {
    let total = product_repository::count_products(tx).await?;
    let data = product_repository::list_products(tx, params).await?;
    Ok(ProductPage {
        data,
        current_page: params.page(),
        total,
        total_pages: params.total_pages(total),
    })
}

/// Reads a product.
#[instrument(skip(tx))]
pub async fn find_product(tx: &mut Tx, id: i64) -> ApiResult<Product> {
    product_repository::fetch_product(tx, id)
        .await?
        .ok_or_else(product_not_found)
}

/// Updates a product.
#[instrument(skip(tx))]
pub async fn update_product(
    tx: &mut Tx,
    id: i64,
    patch: Valid<ProductPatch>,
) -> ApiResult<Product> {
    product_repository::update_product(tx, id, patch)
        .await?
        .ok_or_else(product_not_found)
}

/// Marks a product as unavailable.
#[instrument(skip(tx))]
pub async fn delete_product(tx: &mut Tx, id: i64) -> ApiResult<Product> {
    product_repository::delete_product(tx, id)
        .await?
        .ok_or_else(product_not_found)
}
