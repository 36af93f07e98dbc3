//! The product API implementation.

use crate::{
    api::product::{
        product_repository::{NewProduct, Product, ProductPage, ProductPatch},
        product_service,
    },
    infra::{
        database::DbPool,
        error::{ApiResult, ClientError},
        extract::{Json, Query},
        pagination::PaginationParams,
        state::AppState,
        validation::Valid,
    },
};
use axum::{extract::State, Router};
use axum_extra::routing::{RouterExt, TypedPath};
use http::StatusCode;
use serde::Deserialize;
use tracing::instrument;

/// The product API endpoints.
pub fn routes() -> Router<AppState> {
    Router::new()
        .typed_post(create_product)
        .typed_get(list_products)
        .typed_get(get_product)
        .typed_patch(update_product)
        .typed_delete(delete_product)
}

#[derive(Deserialize, TypedPath)]
#[typed_path("/products", rejection(ClientError))]
pub(crate) struct Products;

#[derive(Deserialize, TypedPath)]
#[typed_path("/products/:id", rejection(ClientError))]
pub(crate) struct ProductsId(i64);

/// Creates a new product.
#[utoipa::path(
    post,
    path = "/api/products",
    request_body = NewProduct,
    responses(
        (status = 201, description = "Created", body = Product),
        (status = 422, description = "Unprocessable Entity", body = ErrorBody),
        (status = 500, description = "Internal Server Error", body = ErrorBody),
    )
)]
#[instrument(skip_all, fields(new_product))]
pub(crate) async fn create_product(
    Products: Products,
    db: State<DbPool>,
    Json(new_product): Json<NewProduct>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let new_product = Valid::new(new_product)?;
    let mut tx = db.begin().await?;
    let product = product_service::create_product(&mut tx, new_product).await?;
    tx.commit().await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Lists one page of products.
#[utoipa::path(
    get,
    path = "/api/products",
    params(PaginationParams),
    responses(
        (status = 200, description = "Ok", body = ProductPage),
        (status = 422, description = "Unprocessable Entity", body = ErrorBody),
        (status = 500, description = "Internal Server Error", body = ErrorBody),
    )
)]
#[instrument(skip_all)]
pub(crate) async fn list_products(
    Products: Products,
    db: State<DbPool>,
    Query(params): Query<PaginationParams>,
) -> ApiResult<Json<ProductPage>> {
    let params = Valid::new(params)?.into_inner();
    let mut tx = db.begin().await?;
    let page = product_service::list_products(&mut tx, &params).await?;
    Ok(Json(page))
}

/// Gets a product.
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    responses(
        (status = 200, description = "Ok", body = Product),
        (status = 404, description = "Not Found", body = ErrorBody),
        (status = 500, description = "Internal Server Error", body = ErrorBody),
    )
)]
#[instrument(skip_all, fields(id))]
pub(crate) async fn get_product(
    ProductsId(id): ProductsId,
    db: State<DbPool>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let mut tx = db.begin().await?;
    let product = product_service::find_product(&mut tx, id).await?;
    tx.commit().await?;
    Ok((StatusCode::OK, Json(product)))
}

/// Updates a product.
#[utoipa::path(
    patch,
    path = "/api/products/{id}",
    request_body = ProductPatch,
    responses(
        (status = 200, description = "Ok", body = Product),
        (status = 404, description = "Not Found", body = ErrorBody),
        (status = 422, description = "Unprocessable Entity", body = ErrorBody),
        (status = 500, description = "Internal Server Error", body = ErrorBody),
    )
)]
#[instrument(skip(db))]
pub(crate) async fn update_product(
    ProductsId(id): ProductsId,
    db: State<DbPool>,
    Json(patch): Json<ProductPatch>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let patch = Valid::new(patch)?;
    let mut tx = db.begin().await?;
    let product = product_service::update_product(&mut tx, id, patch).await?;
    tx.commit().await?;
    Ok((StatusCode::OK, Json(product)))
}

/// Marks a product as unavailable and returns it.
#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    responses(
        (status = 200, description = "Ok", body = Product),
        (status = 404, description = "Not Found", body = ErrorBody),
        (status = 500, description = "Internal Server Error", body = ErrorBody),
    )
)]
#[instrument(skip_all, fields(id))]
pub(crate) async fn delete_product(
    ProductsId(id): ProductsId,
    db: State<DbPool>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let mut tx = db.begin().await?;
    let product = product_service::delete_product(&mut tx, id).await?;
    tx.commit().await?;
    Ok((StatusCode::OK, Json(product)))
}
