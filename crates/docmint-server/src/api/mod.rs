pub mod response;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower_http::compression::CompressionLayer;

use crate::config::Config;
use crate::features::{self, FeatureState};
use crate::middleware;
use response::MessageResponse;

/// Build the application router with all routes and middleware
pub fn create_router(state: FeatureState, config: &Config) -> Router {
    let feature_routes = features::router(state.clone());

    Router::new()
        .route("/", get(root).fallback(no_route))
        .route("/health", get(health_check).fallback(no_route))
        .with_state(state)
        .merge(feature_routes)
        .fallback(no_route)
        // Applied innermost to outermost
        .layer(DefaultBodyLimit::max(config.server.max_upload_bytes))
        .layer(CompressionLayer::new())
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(&config.cors))
}

async fn root() -> MessageResponse {
    MessageResponse::new("Hi")
}

/// Unmatched paths and methods answer 200 with a fixed message.
///
/// Also set on each method router: a known path with an unknown method
/// never reaches the router fallback.
pub(crate) async fn no_route() -> MessageResponse {
    MessageResponse::new("No route")
}

async fn health_check(State(state): State<FeatureState>) -> Response {
    match state.store.ping().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "healthy" }))).into_response(),
        Err(e) => {
            tracing::error!("Store health check failed: {:?}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unhealthy" })),
            )
                .into_response()
        },
    }
}
