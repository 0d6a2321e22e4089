use crate::docs::ApiDoc;
use crate::logging::logging_middleware;
use crate::metrics::metrics_middleware;
use crate::middleware::role::{require_admin, require_system_admin};
use crate::modules::auth::router::init_auth_router;
use crate::modules::imports::router::init_import_router;
use crate::modules::schools::router::init_schools_router;
use crate::modules::students::router::init_students_router;
use crate::state::AppState;
use axum::http::{HeaderValue, Method};
use axum::{Json, Router, middleware, routing::get};
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as _};
use utoipa_swagger_ui::SwaggerUi;

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub fn init_router(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .route("/health", get(health))
        .nest(
            "/api",
            Router::new()
                .nest("/auth", init_auth_router())
                .nest(
                    "/schools",
                    init_schools_router().route_layer(middleware::from_fn_with_state(
                        state.clone(),
                        require_system_admin,
                    )),
                )
                .nest(
                    "/students",
                    init_students_router()
                        .merge(init_import_router(state.import_config.max_upload_bytes))
                        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin)),
                ),
        )
        .with_state(state.clone())
        .layer({
            let allowed_origins: Vec<HeaderValue> = state
                .cors_config
                .allowed_origins
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(allowed_origins)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::AUTHORIZATION,
                    axum::http::header::CONTENT_TYPE,
                    axum::http::header::ACCEPT,
                ])
                .allow_credentials(true)
        })
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(metrics_middleware))
}
