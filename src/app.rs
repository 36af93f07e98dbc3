//! REST API implementation.
//!
//! # Examples
//!
//! Info API.
//!
//! ```rust
//! # tokio_test::block_on(async {
//! # let url = product_catalog::app::spawn_app().await;
//! let response = reqwest::get(format!("{}/info", url)).await.unwrap();
//! assert_eq!(200, response.status());
//! # });
//! ```
//!
//! Product API with an unknown id.
//!
//! ```rust
//! # use product_catalog::infra::error::ErrorBody;
//! # tokio_test::block_on(async {
//! # let url = product_catalog::app::spawn_app().await;
//! let response = reqwest::get(format!("{}/products/0", url)).await.unwrap();
//! assert_eq!(404, response.status());
//! let body = response.json::<ErrorBody>().await.unwrap();
//! assert_eq!("Product not found", body.message());
//! # });
//! ```

use std::iter;

use crate::infra::config::Config;
use crate::infra::database::DbPool;
use crate::infra::error::{InternalError, PanicHandler};
use crate::infra::middleware::MakeRequestIdSpan;
use crate::infra::openapi::ApiDoc;
use crate::infra::state::AppState;
use axum::error_handling::HandleErrorLayer;
use axum::response::{IntoResponse, Redirect};
use axum::routing::get;
use axum::Router;
use http::header::AUTHORIZATION;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;
use utoipa_redoc::{Redoc, Servable};
use utoipa_swagger_ui::SwaggerUi;

/// Constructs the full axum application.
pub fn app(state: AppState) -> Router {
    // Fallible middleware from tower, mapped to infallible response with [`HandleErrorLayer`].
    let tower_middleware = ServiceBuilder::new()
        .layer(HandleErrorLayer::new(|e| async move {
            InternalError::Other(format!("Tower middleware failed: {e}")).into_response()
        }))
        .concurrency_limit(500);

    let timeout = state.config().server.timeout;

    // The full application with documentation and a REST API.
    Router::new()
        .route("/", get(|| async { Redirect::permanent("/api/swagger-ui") }))
        .merge(SwaggerUi::new("/api/swagger-ui").url("/api/openapi.json", ApiDoc::openapi()))
        .merge(Redoc::with_url("/api/redoc", ApiDoc::openapi()))
        .merge(RapiDoc::new("/api/openapi.json").path("/api/rapidoc"))
        .nest("/api", crate::api::api(state.clone()))
        // Layers
        .layer(TimeoutLayer::new(timeout))
        .layer(axum::middleware::from_fn_with_state(
            state,
            crate::infra::middleware::log_request_response,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(MakeRequestIdSpan)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO))
                .on_failure(()),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(SetSensitiveRequestHeadersLayer::new(iter::once(
            AUTHORIZATION,
        )))
        .layer(tower_middleware)
        .layer(CatchPanicLayer::custom(PanicHandler))
}

/// Starts the axum server.
pub async fn run_app(addr: TcpListener, db: DbPool, config: Config) -> std::io::Result<()> {
    let state = AppState::new(db, config);
    let app = app(state).into_make_service();

    tracing::info!("Starting axum on {}", addr.local_addr()?);
    let exit_result = axum::serve(addr, app)
        .with_graceful_shutdown(crate::shutdown("axum"))
        .await;

    match exit_result {
        Ok(_) => tracing::info!("Successfully shut down"),
        Err(e) => tracing::error!("Shutdown failed: {}", e),
    }

    Ok(())
}

/// Spawn a server on a random port.
pub async fn spawn_app() -> String {
    let config = crate::infra::config::load_config().unwrap();
    let db = crate::infra::database::init_db(&config.database);
    crate::infra::database::run_migrations(&db).await.unwrap();
    spawn_app_with_db(db).await
}

/// Spawn a server on a random port with a custom database.
pub async fn spawn_app_with_db(db: DbPool) -> String {
    let address = "127.0.0.1";
    let listener = TcpListener::bind(format!("{address}:0")).await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let config = crate::infra::config::load_config().unwrap();
    tokio::spawn(run_app(listener, db, config));
    format!("http://{address}:{port}/api")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::product::product_repository::{Product, ProductPage},
        infra::{database::DbPool, error::ErrorBody, state::AppState},
    };
    use axum::{body::Body, Router};
    use http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::json;
    use tower::ServiceExt;

    fn test_app(db: DbPool) -> Router {
        let config = crate::infra::config::load_config().unwrap();
        let state = AppState::new(db, config);
        app(state)
    }

    async fn create_product(client: &reqwest::Client, url: &str, name: &str, price: f64) -> Product {
        let response = client
            .post(format!("{url}/products"))
            .json(&json!({ "name": name, "price": price }))
            .send()
            .await
            .unwrap();
        assert_eq!(StatusCode::CREATED, response.status());
        response.json().await.unwrap()
    }

    #[sqlx::test]
    fn root_redirects_to_swagger_ui(db: DbPool) {
        let app = test_app(db);
        let req = Request::get("/").body(Body::empty()).unwrap();
        let result = app.oneshot(req).await.unwrap();
        assert_eq!(StatusCode::PERMANENT_REDIRECT, result.status());
        assert_eq!("/api/swagger-ui", result.headers()["location"]);
    }

    #[sqlx::test]
    fn swagger_ui_oneshot(db: DbPool) {
        let app = test_app(db);
        let req = Request::get("/api/swagger-ui/index.html")
            .body(Body::empty())
            .unwrap();
        let result = app.oneshot(req).await.unwrap();
        assert_eq!(StatusCode::OK, result.status())
    }

    #[sqlx::test]
    fn redoc_oneshot(db: DbPool) {
        let app = test_app(db);
        let req = Request::get("/api/redoc").body(Body::empty()).unwrap();
        let result = app.oneshot(req).await.unwrap();
        assert_eq!(StatusCode::OK, result.status())
    }

    #[sqlx::test]
    fn rapidoc_oneshot(db: DbPool) {
        let app = test_app(db);
        let req = Request::get("/api/rapidoc").body(Body::empty()).unwrap();
        let result = app.oneshot(req).await.unwrap();
        assert_eq!(StatusCode::OK, result.status())
    }

    #[sqlx::test]
    fn info_oneshot(db: DbPool) {
        let app = test_app(db);
        let req = Request::get("/api/info").body(Body::empty()).unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(StatusCode::OK, res.status());
        let body = res.into_body().collect().await.unwrap().to_bytes();
        let info: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(env!("CARGO_PKG_NAME"), info["name"]);
    }

    #[sqlx::test]
    fn created_product_starts_available(db: DbPool) {
        let url = spawn_app_with_db(db).await;
        let client = reqwest::Client::new();

        let product = create_product(&client, &url, "Teclado", 174.99).await;
        assert_eq!("Teclado", product.name);
        assert_eq!(174.99, product.price);
        assert!(product.available);

        let found: Product = reqwest::get(format!("{url}/products/{}", product.id))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(product, found);
    }

    #[sqlx::test]
    fn invalid_products_are_unprocessable(db: DbPool) {
        let url = spawn_app_with_db(db).await;
        let client = reqwest::Client::new();

        for body in [
            json!({ "name": "", "price": 1.5 }),
            json!({ "name": "Pen", "price": -1.5 }),
            json!({ "name": "Pen", "price": 1.55555 }),
        ] {
            let response = client
                .post(format!("{url}/products"))
                .json(&body)
                .send()
                .await
                .unwrap();
            assert_eq!(StatusCode::UNPROCESSABLE_ENTITY, response.status());
        }
    }

    #[sqlx::test]
    fn patch_changes_only_given_fields(db: DbPool) {
        let url = spawn_app_with_db(db).await;
        let client = reqwest::Client::new();

        let product = create_product(&client, &url, "Monitor", 800.0).await;
        let updated: Product = client
            .patch(format!("{url}/products/{}", product.id))
            .json(&json!({ "price": 9.5 }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(product.id, updated.id);
        assert_eq!("Monitor", updated.name);
        assert_eq!(9.5, updated.price);
    }

    #[sqlx::test]
    fn patching_missing_product_gives_404(db: DbPool) {
        let url = spawn_app_with_db(db).await;
        let client = reqwest::Client::new();

        let response = client
            .patch(format!("{url}/products/1"))
            .json(&json!({ "name": "Pantalla" }))
            .send()
            .await
            .unwrap();
        assert_eq!(StatusCode::NOT_FOUND, response.status());
        let body: ErrorBody = response.json().await.unwrap();
        assert_eq!("Product not found", body.message());
    }

    #[sqlx::test]
    fn deleting_twice_gives_404(db: DbPool) {
        let url = spawn_app_with_db(db).await;
        let client = reqwest::Client::new();

        let product = create_product(&client, &url, "Mouse", 39.9).await;
        let deleted = client
            .delete(format!("{url}/products/{}", product.id))
            .send()
            .await
            .unwrap();
        assert_eq!(StatusCode::OK, deleted.status());
        let deleted: Product = deleted.json().await.unwrap();
        assert!(!deleted.available);

        let again = client
            .delete(format!("{url}/products/{}", product.id))
            .send()
            .await
            .unwrap();
        assert_eq!(StatusCode::NOT_FOUND, again.status());
    }

    #[sqlx::test]
    fn pages_beyond_the_end_are_empty(db: DbPool) {
        let url = spawn_app_with_db(db).await;
        let client = reqwest::Client::new();

        create_product(&client, &url, "Pen", 1.5).await;
        let page: ProductPage = reqwest::get(format!("{url}/products?page=5&limit=10"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert!(page.data.is_empty());
        assert_eq!(5, page.current_page);
        assert_eq!(1, page.total);
        assert_eq!(1, page.total_pages);
    }

    #[sqlx::test]
    fn zeroth_page_is_unprocessable(db: DbPool) {
        let url = spawn_app_with_db(db).await;
        let response = reqwest::get(format!("{url}/products?page=0&limit=10"))
            .await
            .unwrap();
        assert_eq!(StatusCode::UNPROCESSABLE_ENTITY, response.status());
    }

    #[sqlx::test]
    fn pages_hold_at_most_limit_products(db: DbPool) {
        let url = spawn_app_with_db(db).await;
        let client = reqwest::Client::new();

        for i in 1..=3 {
            create_product(&client, &url, &format!("Product {i}"), i as f64).await;
        }
        let page: ProductPage = reqwest::get(format!("{url}/products?page=1&limit=2"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(2, page.data.len());
        assert_eq!(3, page.total);
        assert_eq!(2, page.total_pages);
    }

    #[sqlx::test]
    fn deleted_products_disappear_from_the_catalog(db: DbPool) {
        let url = spawn_app_with_db(db).await;
        let client = reqwest::Client::new();

        let pen = create_product(&client, &url, "Pen", 1.5).await;

        let page: ProductPage = reqwest::get(format!("{url}/products?page=1&limit=10"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(1, page.data.len());
        assert_eq!(pen.id, page.data[0].id);
        assert_eq!(1, page.total);
        assert_eq!(1, page.total_pages);

        let deleted: Product = client
            .delete(format!("{url}/products/{}", pen.id))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(!deleted.available);

        let response = reqwest::get(format!("{url}/products/{}", pen.id))
            .await
            .unwrap();
        assert_eq!(StatusCode::NOT_FOUND, response.status());
        let body: ErrorBody = response.json().await.unwrap();
        assert_eq!("Product not found", body.message());

        let page: ProductPage = reqwest::get(format!("{url}/products?page=1&limit=10"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(page.data.is_empty());
        assert_eq!(0, page.total);
        assert_eq!(0, page.total_pages);
    }
}
