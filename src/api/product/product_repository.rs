//! Types and functions for storing and loading products from the database.
//!
//! Products are never deleted, only marked as unavailable. Every query in
//! this module therefore filters on `available` so that soft deleted rows
//! stay invisible to the rest of the application.

use crate::infra::{
    database::Tx,
    error::ApiResult,
    pagination::PaginationParams,
    validation::Valid,
};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::{instrument, Instrument};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// A new product.
#[derive(Debug, PartialEq, Serialize, Deserialize, ToSchema, Validate)]
pub struct NewProduct {
    /// The product's name.
    #[schema(example = "Teclado")]
    #[validate(length(min = 1))]
    pub name: String,
    /// The product's price, with at most four decimals.
    #[schema(example = 174.99)]
    #[validate(range(min = 0.0), custom(function = "validate_price_scale"))]
    pub price: f64,
}

/// A partial update of an existing product.
/// Fields that are left out keep their current value.
#[derive(Debug, Default, PartialEq, Serialize, Deserialize, ToSchema, Validate)]
pub struct ProductPatch {
    /// The product's name.
    #[schema(example = "Teclado")]
    #[validate(length(min = 1))]
    pub name: Option<String>,
    /// The product's price, with at most four decimals.
    #[schema(example = 174.99)]
    #[validate(range(min = 0.0), custom(function = "validate_price_scale"))]
    pub price: Option<f64>,
}

/// An existing product.
#[derive(Debug, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Product {
    /// The product's id.
    pub id: i64,
    /// The product's name.
    #[schema(example = "Teclado")]
    pub name: String,
    /// The product's price.
    #[schema(example = 174.99)]
    pub price: f64,
    /// Whether the product can still be sold.
    pub available: bool,
}

/// One page of products.
#[derive(Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    /// The products on this page.
    pub data: Vec<Product>,
    /// The 1-indexed page number.
    pub current_page: i64,
    /// How many products exist in total.
    pub total: i64,
    /// How many pages exist in total.
    pub total_pages: i64,
}

/// Checks that a price has at most four decimals.
fn validate_price_scale(price: f64) -> Result<(), ValidationError> {
    let text = price.to_string();
    if let Some((_, decimals)) = text.split_once('.') {
        if decimals.len() > 4 {
            return Err(ValidationError::new("scale"));
        }
    }
    Ok(())
}

/// Creates a new product.
#[instrument(skip(tx))]
pub async fn create_product(tx: &mut Tx, new_product: Valid<NewProduct>) -> ApiResult<Product> {
    let new_product = new_product.into_inner();
    tracing::info!("Creating product {:?}", new_product);
    let product = sqlx::query_as::<_, Product>(
        r#"
        INSERT INTO products (name, price)
        VALUES ($1, $2)
        RETURNING *
        "#,
    )
    .bind(new_product.name)
    .bind(new_product.price)
    .fetch_one(tx.as_mut())
    .await?;
    tracing::info!("Created product {:?}", product);
    Ok(product)
}

/// Reads a product.
#[instrument(skip(tx))]
pub async fn fetch_product(tx: &mut Tx, id: i64) -> ApiResult<Option<Product>> {
    tracing::info!("Reading product");
    let product = sqlx::query_as::<_, Product>(
        r#"
        SELECT * FROM products
        WHERE id = $1 AND available = TRUE
        "#,
    )
    .bind(id)
    .fetch_optional(tx.as_mut())
    .instrument(tracing::info_span!("fetch_optional"))
    .await?;
    tracing::info!("Found product: {:?}", product);
    Ok(product)
}

/// Updates a product.
/// Returns [`None`] if the product does not exist or is unavailable.
#[instrument(skip(tx))]
pub async fn update_product(
    tx: &mut Tx,
    id: i64,
    patch: Valid<ProductPatch>,
) -> ApiResult<Option<Product>> {
    let patch = patch.into_inner();
    tracing::info!("Updating product {:?}", patch);
    let product = sqlx::query_as::<_, Product>(
        r#"
        UPDATE products
        SET name = COALESCE($2, name), price = COALESCE($3, price)
        WHERE id = $1 AND available = TRUE
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(patch.name)
    .bind(patch.price)
    .fetch_optional(tx.as_mut())
    .await?;
    tracing::info!("Updated product {:?}", product);
    Ok(product)
}

/// Marks a product as unavailable.
/// Returns [`None`] if the product does not exist or was already unavailable.
#[instrument(skip(tx))]
pub async fn delete_product(tx: &mut Tx, id: i64) -> ApiResult<Option<Product>> {
    tracing::info!("Deleting product {:?}", id);
    let product = sqlx::query_as::<_, Product>(
        r#"
        UPDATE products
        SET available = FALSE
        WHERE id = $1 AND available = TRUE
        RETURNING *
        "#,
    )
    .bind(id)
    .fetch_optional(tx.as_mut())
    .await?;
    tracing::info!("Deleted product {:?}", product);
    Ok(product)
}

/// Lists one page of available products.
#[instrument(skip(tx))]
pub async fn list_products(tx: &mut Tx, params: &PaginationParams) -> ApiResult<Vec<Product>> {
    tracing::info!("Listing products");
    let products = sqlx::query_as::<_, Product>(
        r#"
        SELECT * FROM products
        WHERE available = TRUE
        ORDER BY id
        LIMIT $1
        OFFSET $2
        "#,
    )
    .bind(params.limit())
    .bind(params.offset())
    .fetch_all(tx.as_mut())
    .instrument(tracing::info_span!("fetch_all"))
    .await?;
    tracing::info!("Listed {} products", products.len());
    Ok(products)
}

/// Counts the available products.
#[instrument(skip(tx))]
pub async fn count_products(tx: &mut Tx) -> ApiResult<i64> {
    let total = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM products
        WHERE available = TRUE
        "#,
    )
    .fetch_one(tx.as_mut())
    .await?;
    Ok(total)
}
