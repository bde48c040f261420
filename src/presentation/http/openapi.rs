// src/presentation/http/openapi.rs
use axum::Router;
use serde::{Deserialize, Serialize};
use std::{env, fs::File, io::BufWriter, path::Path};
use utoipa::openapi::{
    Components,
    security::{Http, HttpAuthScheme, SecurityScheme},
    server::Server,
};
use utoipa::{Modify, OpenApi, ToSchema};
use utoipa_redoc::{Redoc, Servable};
use utoipa_swagger_ui::SwaggerUi;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::presentation::http::controllers::oauth::authorize,
        crate::presentation::http::controllers::oauth::token,
        crate::presentation::http::controllers::oauth::resume,
        crate::presentation::http::controllers::resource::validate,
        crate::presentation::http::controllers::resource::user_info,
        super::routes::health
    ),
    components(
        schemas(
            StatusResponse,
            crate::presentation::http::error::ErrorResponse,
            crate::presentation::http::controllers::oauth::TokenRequest,
            crate::presentation::http::controllers::resource::ValidateResponse,
            crate::application::dto::TokenResponseDto,
            crate::application::dto::UserInfoDto
        )
    ),
    tags(
        (name = "OAuth", description = "Authorization code and token endpoints"),
        (name = "Resource", description = "Bearer-protected endpoints for resource servers"),
        (name = "System", description = "System level endpoints")
    ),
    modifiers(&ApiDocCustomizer),
    info(
        title = "hpt_auth",
        description = "OAuth2 authorization-code server with PKCE",
        version = "0.1.0"
    )
)]
pub struct ApiDoc;

struct ApiDocCustomizer;

impl Modify for ApiDocCustomizer {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Components::default);
        let mut http = Http::new(HttpAuthScheme::Bearer);
        http.bearer_format = Some("biscuit".into());
        components.add_security_scheme("bearerAuth", SecurityScheme::Http(http));

        let url = env::var("PUBLIC_API_URL")
            .ok()
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| "http://localhost:9096".to_string());
        openapi.servers = Some(vec![Server::new(url)]);
    }
}

/// Swagger UI at `/docs` (which also serves `/openapi.json`) and Redoc at `/redoc`.
pub fn docs_router() -> Router {
    let openapi = ApiDoc::openapi();
    let swagger = SwaggerUi::new("/docs").url("/openapi.json", openapi.clone());
    let redoc = Redoc::with_url("/redoc", openapi);
    Router::new().merge(swagger).merge(redoc)
}

pub fn write_openapi_snapshot() -> std::io::Result<()> {
    let spec = ApiDoc::openapi();
    let output_path =
        env::var("OPENAPI_SNAPSHOT_PATH").unwrap_or_else(|_| "spec/openapi.json".to_string());
    let path = Path::new(&output_path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &spec)?;
    Ok(())
}
