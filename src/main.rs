//! A product catalog service with axum.

use product_catalog::{
    app,
    infra::{self, config::Config},
    rpc,
};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let _ = dotenvy::dotenv();
    let _guard = infra::logging::init_logging();

    let config: Config = infra::config::load_config()?;
    let db = infra::database::init_db(&config.database);
    infra::database::run_migrations(&db).await?;

    // Start servers
    let http_listener = TcpListener::bind(format!(
        "{}:{}",
        config.server.http_address, config.server.http_port
    ))
    .await?;
    let rpc_listener = TcpListener::bind(format!(
        "{}:{}",
        config.server.rpc_address, config.server.rpc_port
    ))
    .await?;
    let http_server = tokio::spawn(app::run_app(http_listener, db.clone(), config.clone()));
    let rpc_server = tokio::spawn(rpc::run_rpc_app(rpc_listener, db, config));
    let _ = tokio::join!(http_server, rpc_server);

    Ok(())
}
