//! Types and functions for storing and loading requests from the database.

use crate::infra::{database::Tx, error::ApiResult};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use tracing::instrument;

/// A new request.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRequest {
    /// The receiver of the request. None if self.
    pub host: String,
    /// The request method.
    pub method: String,
    /// The request URI.
    pub uri: String,
    /// The request body.
    pub request_body: Option<String>,
    /// The response body.
    pub response_body: Option<String>,
    /// The response status.
    pub status: i32,
}

/// A request.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Request {
    /// A unique id for this request.
    pub id: i64,
    /// The receiver of the request.
    pub host: String,
    /// The request method.
    pub method: String,
    /// The request URI.
    pub uri: String,
    /// The request body.
    pub request_body: Option<String>,
    /// The response body.
    pub response_body: Option<String>,
    /// A timestamp of when the request was made.
    pub timestamp: OffsetDateTime,
    /// The response status.
    pub status: i32,
}

/// Stores one handled request.
#[instrument(skip(tx, new_req))]
pub async fn log_request(tx: &mut Tx, new_req: &NewRequest) -> ApiResult<Request> {
    tracing::trace!("Logging request");
    let req = sqlx::query_as::<_, Request>(
        r#"
        INSERT INTO requests (host, method, uri, request_body, response_body, status, timestamp)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(&new_req.host)
    .bind(&new_req.method)
    .bind(&new_req.uri)
    .bind(&new_req.request_body)
    .bind(&new_req.response_body)
    .bind(new_req.status)
    .bind(OffsetDateTime::now_utc())
    .fetch_one(tx.as_mut())
    .await?;
    tracing::trace!("Logged request");
    Ok(req)
}
