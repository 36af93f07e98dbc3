//! Product command handlers for the message API.
//!
//! Each command decodes its payload from the envelope's `data` field,
//! runs against the shared product service, and answers with the same
//! JSON the REST API would have produced.

use crate::{
    api::product::{
        product_repository::{NewProduct, ProductPatch},
        product_service,
    },
    infra::{
        database::DbPool,
        error::{ApiResult, ClientError, InternalError},
        pagination::PaginationParams,
        validation::Valid,
    },
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::MessageEnvelope;

/// Creates a new product.
pub const CREATE_PRODUCT: &str = "create_product";
/// Lists one page of products.
pub const FIND_ALL_PRODUCTS: &str = "find_all_products";
/// Reads a single product.
pub const FIND_ONE_PRODUCT: &str = "find_one_product";
/// Updates a product.
pub const UPDATE_PRODUCT: &str = "update_product";
/// Marks a product as unavailable.
pub const DELETE_PRODUCT: &str = "delete_product";

/// A payload carrying only a product id.
#[derive(Debug, Serialize, Deserialize)]
struct ProductId {
    id: i64,
}

/// The payload of an [`UPDATE_PRODUCT`] command.
#[derive(Debug, Serialize, Deserialize)]
struct UpdateProduct {
    id: i64,
    #[serde(flatten)]
    patch: ProductPatch,
}

/// Decodes a command payload, treating an absent `data` field as empty.
fn decode<T: DeserializeOwned>(data: serde_json::Value) -> ApiResult<T> {
    let data = if data.is_null() {
        serde_json::Value::Object(Default::default())
    } else {
        data
    };
    serde_json::from_value(data)
        .map_err(|e| ClientError::BadRequest(format!("invalid data: {e}")).into())
}

/// Encodes a command result.
fn encode<T: Serialize>(value: T) -> ApiResult<serde_json::Value> {
    Ok(serde_json::to_value(value).map_err(InternalError::from)?)
}

/// Executes a single product command.
pub async fn handle(db: &DbPool, msg: MessageEnvelope) -> ApiResult<serde_json::Value> {
    match msg.cmd.as_str() {
        CREATE_PRODUCT => {
            let new_product = Valid::new(decode::<NewProduct>(msg.data)?)?;
            let mut tx = db.begin().await?;
            let product = product_service::create_product(&mut tx, new_product).await?;
            tx.commit().await?;
            encode(product)
        }
        FIND_ALL_PRODUCTS => {
            let params = Valid::new(decode::<PaginationParams>(msg.data)?)?.into_inner();
            let mut tx = db.begin().await?;
            let page = product_service::list_products(&mut tx, &params).await?;
            encode(page)
        }
        FIND_ONE_PRODUCT => {
            let ProductId { id } = decode(msg.data)?;
            let mut tx = db.begin().await?;
            let product = product_service::find_product(&mut tx, id).await?;
            tx.commit().await?;
            encode(product)
        }
        UPDATE_PRODUCT => {
            let UpdateProduct { id, patch } = decode(msg.data)?;
            let patch = Valid::new(patch)?;
            let mut tx = db.begin().await?;
            let product = product_service::update_product(&mut tx, id, patch).await?;
            tx.commit().await?;
            encode(product)
        }
        DELETE_PRODUCT => {
            let ProductId { id } = decode(msg.data)?;
            let mut tx = db.begin().await?;
            let product = product_service::delete_product(&mut tx, id).await?;
            tx.commit().await?;
            encode(product)
        }
        cmd => Err(super::unknown_cmd(cmd)),
    }
}
