// src/presentation/http/controllers/resource.rs
use crate::application::dto::UserInfoDto;
use crate::presentation::http::error::{HttpResult, IntoHttpResult};
use crate::presentation::http::extractors::AuthorizationHeader;
use crate::presentation::http::state::HttpState;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ValidateResponse {
    pub expires_in: i64,
    pub client_id: String,
    pub user_id: String,
}

#[utoipa::path(
    get,
    path = "/validate",
    responses(
        (status = 200, description = "Token is valid", body = ValidateResponse),
        (status = 400, description = "Missing or malformed Authorization header", body = crate::presentation::http::error::ErrorResponse),
        (status = 401, description = "Token invalid or expired", body = crate::presentation::http::error::ErrorResponse),
    ),
    security(("bearerAuth" = [])),
    tag = "Resource"
)]
pub async fn validate(
    Extension(state): Extension<HttpState>,
    AuthorizationHeader(header): AuthorizationHeader,
) -> HttpResult<Json<ValidateResponse>> {
    let info = state
        .within_deadline(state.services.bearer_validator.validate(header.as_deref()))
        .await
        .into_http()?;

    Ok(Json(ValidateResponse {
        expires_in: info.expires_in,
        client_id: info.client_id,
        user_id: info.user_id,
    }))
}

#[utoipa::path(
    get,
    path = "/user-info",
    responses(
        (status = 200, description = "Identity behind the token", body = UserInfoDto),
        (status = 400, description = "Missing or malformed Authorization header", body = crate::presentation::http::error::ErrorResponse),
        (status = 401, description = "Token invalid, expired or its user is unknown", body = crate::presentation::http::error::ErrorResponse),
    ),
    security(("bearerAuth" = [])),
    tag = "Resource"
)]
pub async fn user_info(
    Extension(state): Extension<HttpState>,
    AuthorizationHeader(header): AuthorizationHeader,
) -> HttpResult<Json<UserInfoDto>> {
    let info = state
        .within_deadline(state.services.bearer_validator.user_info(header.as_deref()))
        .await
        .into_http()?;
    Ok(Json(info))
}
