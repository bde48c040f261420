// src/presentation/http/routes.rs
use crate::presentation::http::state::HttpState;
use crate::presentation::http::{
    controllers::{oauth, resource},
    middleware::rate_limit::token_rate_limit_layer,
    openapi::{self, StatusResponse},
};
use axum::{
    Extension, Router,
    http::{HeaderValue, Method, header},
    routing::{MethodRouter, get, post},
};
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub fn build_router(state: HttpState) -> Router {
    build_router_with_rate_limiter(state, true)
}

pub fn build_router_with_rate_limiter(state: HttpState, rate_limited: bool) -> Router {
    let cors = cors_layer(&state.settings.allowed_origins);

    Router::new()
        .merge(openapi::docs_router())
        .route("/health", get(health))
        .route("/oauth/authorize", get(oauth::authorize))
        .route("/oauth/token", token_route(rate_limited))
        .route("/auth", get(oauth::resume))
        .route("/validate", get(resource::validate))
        .route("/user-info", get(resource::user_info))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(Extension(state))
}

fn token_route(rate_limited: bool) -> MethodRouter {
    match token_rate_limit_layer() {
        Some(layer) if rate_limited => post(oauth::token).layer(layer),
        _ => post(oauth::token),
    }
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    if allowed_origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service health check.", body = crate::presentation::http::openapi::StatusResponse)
    ),
    security([]),
    tag = "System"
)]
pub async fn health() -> axum::Json<StatusResponse> {
    axum::Json(StatusResponse {
        status: "ok".into(),
    })
}
