// src/presentation/http/controllers/oauth.rs
use crate::application::{
    commands::oauth::TokenExchangeCommand, dto::FormFields, dto::TokenResponseDto,
    error::ApplicationError,
};
use crate::presentation::http::error::{HttpError, HttpResult, IntoHttpResult};
use crate::presentation::http::extractors::{BasicClientCredentials, BrowserSession, session_cookie};
use crate::presentation::http::state::HttpState;
use axum::{
    Extension, Form, Json,
    body::Body,
    extract::{RawQuery, rejection::FormRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

/// Query accepted by the authorization endpoint.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AuthorizeParams {
    /// Must be `code`.
    pub response_type: String,
    pub client_id: String,
    /// Absolute URL on the client's registered origin.
    pub redirect_uri: String,
    pub scope: Option<String>,
    /// Echoed back unchanged on the redirect.
    pub state: Option<String>,
    pub code_challenge: Option<String>,
    /// `S256` or `plain` (default when a challenge is given).
    pub code_challenge_method: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TokenRequest {
    /// Must be `authorization_code`.
    pub grant_type: Option<String>,
    pub code: Option<String>,
    pub redirect_uri: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub code_verifier: Option<String>,
}

/// A 302 with an optional session cookie. `Redirect` from axum answers 303, which
/// OAuth clients do not expect here.
fn found(location: &str, set_cookie: Option<String>) -> HttpResult<Response> {
    let mut builder = Response::builder()
        .status(StatusCode::FOUND)
        .header(header::LOCATION, location);
    if let Some(cookie) = set_cookie {
        builder = builder.header(header::SET_COOKIE, cookie);
    }
    builder
        .body(Body::empty())
        .map_err(|err| HttpError::from_error(ApplicationError::internal(err.to_string())))
}

#[utoipa::path(
    get,
    path = "/oauth/authorize",
    params(AuthorizeParams),
    responses(
        (status = 302, description = "Redirect to the client with `code` and `state`, or to `/login` when the browser is not logged in"),
        (status = 400, description = "Invalid request or client", body = crate::presentation::http::error::ErrorResponse),
    ),
    security([]),
    tag = "OAuth"
)]
pub async fn authorize(
    Extension(state): Extension<HttpState>,
    BrowserSession(mut session): BrowserSession,
    RawQuery(query): RawQuery,
) -> HttpResult<Response> {
    let params = FormFields::parse(query.as_deref().unwrap_or_default()).into_http()?;
    let outcome = state
        .within_deadline(state.services.oauth_commands.authorize(&mut session, params))
        .await
        .into_http()?;

    found(outcome.location(), session_cookie(&state, &session))
}

#[utoipa::path(
    post,
    path = "/oauth/token",
    request_body(content = TokenRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Access token issued", body = TokenResponseDto),
        (status = 400, description = "Invalid request, client or grant", body = crate::presentation::http::error::ErrorResponse),
    ),
    security([]),
    tag = "OAuth"
)]
pub async fn token(
    Extension(state): Extension<HttpState>,
    BasicClientCredentials(basic): BasicClientCredentials,
    form: Result<Form<TokenRequest>, FormRejection>,
) -> HttpResult<Response> {
    let Form(payload) = form.map_err(|rejection| {
        HttpError::from_error(ApplicationError::invalid_request(rejection.body_text()))
    })?;
    let (basic_id, basic_secret) = basic.unzip();

    let command = TokenExchangeCommand {
        grant_type: payload.grant_type,
        code: payload.code,
        redirect_uri: payload.redirect_uri,
        client_id: payload.client_id.or(basic_id),
        client_secret: payload.client_secret.or(basic_secret),
        code_verifier: payload.code_verifier,
    };

    let response = state
        .within_deadline(state.services.oauth_commands.exchange(command))
        .await
        .into_http()?;

    Ok((
        [(header::CACHE_CONTROL, "no-store"), (header::PRAGMA, "no-cache")],
        Json(response),
    )
        .into_response())
}

#[utoipa::path(
    get,
    path = "/auth",
    responses(
        (status = 302, description = "Back to `/oauth/authorize` when logged in, otherwise to `/login`"),
    ),
    security([]),
    tag = "OAuth"
)]
pub async fn resume(
    Extension(state): Extension<HttpState>,
    BrowserSession(session): BrowserSession,
) -> HttpResult<Response> {
    let location = if session.logged_in_user().into_http()?.is_some() {
        "/oauth/authorize"
    } else {
        crate::application::commands::oauth::LOGIN_PATH
    };
    found(location, session_cookie(&state, &session))
}
