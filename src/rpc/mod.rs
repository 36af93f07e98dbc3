//! The message API implementation.
//!
//! A second transport in front of the same product service: clients post a
//! [`MessageEnvelope`] naming a command, and always get a `200 OK` back.
//! Failures travel inside the reply as an [`RpcError`] instead of as an
//! http status code.

use crate::infra::{
    config::Config,
    database::DbPool,
    error::{ApiError, ClientError},
    extract::Json,
    state::AppState,
};
use axum::{extract::State, routing::post, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

pub mod product;

/// A command with its payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageEnvelope {
    /// The command to execute.
    pub cmd: String,
    /// The command payload.
    #[serde(default)]
    pub data: serde_json::Value,
}

/// An error reply, carried inside a successful response.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcError {
    /// The status code the error would map to over http.
    pub status: u16,
    /// A description of the error.
    pub message: String,
}

impl From<ApiError> for RpcError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::ClientError(e) => RpcError {
                status: e.status().as_u16(),
                message: e.to_string(),
            },
            ApiError::InternalError(e) => {
                tracing::error!("internal error: {}", e);
                RpcError {
                    status: e.status().as_u16(),
                    message: "internal error".to_string(),
                }
            }
        }
    }
}

/// The reply to a [`MessageEnvelope`].
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RpcReply {
    /// The command's result.
    Payload(serde_json::Value),
    /// The command failed.
    Fault(RpcError),
}

/// Constructs the message API router.
pub fn rpc_app(state: AppState) -> Router {
    Router::new()
        .route("/", post(dispatch))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Executes a single command against the product service.
async fn dispatch(State(db): State<DbPool>, Json(msg): Json<MessageEnvelope>) -> Json<RpcReply> {
    tracing::debug!("Message in: {}", msg.cmd);
    let reply = match product::handle(&db, msg).await {
        Ok(value) => RpcReply::Payload(value),
        Err(e) => RpcReply::Fault(e.into()),
    };
    Json(reply)
}

/// Binds an unknown command to an error.
pub(crate) fn unknown_cmd(cmd: &str) -> ApiError {
    ClientError::BadRequest(format!("unknown cmd: {cmd}")).into()
}

/// Runs the message API on the given listener.
pub async fn run_rpc_app(addr: TcpListener, db: DbPool, config: Config) -> std::io::Result<()> {
    let state = AppState::new(db, config);
    let app = rpc_app(state).into_make_service();
    tracing::info!("Starting rpc on {}", addr.local_addr()?);
    axum::serve(addr, app)
        .with_graceful_shutdown(crate::shutdown("rpc"))
        .await
}

/// Spawns a message server with the given database, then returns its address.
pub async fn spawn_rpc_app_with_db(db: DbPool) -> String {
    let config = crate::infra::config::load_config().expect("failed to load config");
    let listener = TcpListener::bind(format!("{}:0", config.server.rpc_address))
        .await
        .expect("failed to bind rpc listener");
    let addr = listener.local_addr().expect("failed to get local addr");
    tokio::spawn(run_rpc_app(listener, db, config));
    format!("http://{addr}")
}
