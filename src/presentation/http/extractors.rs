// src/presentation/http/extractors.rs
use crate::{
    application::{error::ApplicationError, services::session::Session},
    presentation::http::state::{HttpSettings, HttpState},
};
use axum::{
    Extension,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use headers::{Authorization, Cookie, HeaderMapExt, authorization::Basic};

use super::error::HttpError;

async fn app_state<S: Send + Sync>(parts: &mut Parts, state: &S) -> Result<HttpState, HttpError> {
    let Extension(app_state) = Extension::<HttpState>::from_request_parts(parts, state)
        .await
        .map_err(|_| HttpError::from_error(ApplicationError::internal("application state missing")))?;
    Ok(app_state)
}

/// The browser session bound from the request's session cookie. Holds the session's
/// lock for the rest of the request.
#[derive(Debug)]
pub struct BrowserSession(pub Session);

impl<S> FromRequestParts<S> for BrowserSession
where
    S: Send + Sync,
{
    type Rejection = HttpError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = app_state(parts, state).await?;
        let cookie = parts.headers.typed_get::<Cookie>();
        let value = cookie
            .as_ref()
            .and_then(|cookie| cookie.get(&app_state.settings.session_cookie_name));

        let session = app_state
            .within_deadline(app_state.services.sessions.start(value))
            .await
            .map_err(HttpError::from_error)?;
        Ok(Self(session))
    }
}

/// `Set-Cookie` value for a session stored during this request, if any.
pub fn session_cookie(state: &HttpState, session: &Session) -> Option<String> {
    if !session.needs_cookie() {
        return None;
    }
    Some(format_session_cookie(
        &state.settings,
        session.cookie_value(),
        state.services.sessions.ttl().as_secs(),
    ))
}

fn format_session_cookie(settings: &HttpSettings, value: &str, max_age: u64) -> String {
    let secure = if settings.session_cookie_secure { "; Secure" } else { "" };
    format!(
        "{}={value}; Path=/; Max-Age={max_age}; HttpOnly; SameSite=Lax{secure}",
        settings.session_cookie_name
    )
}

/// Raw `Authorization` header; the bearer validator does the parsing.
#[derive(Debug, Clone)]
pub struct AuthorizationHeader(pub Option<String>);

impl<S> FromRequestParts<S> for AuthorizationHeader
where
    S: Send + Sync,
{
    type Rejection = HttpError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = match parts.headers.get(header::AUTHORIZATION) {
            None => None,
            Some(raw) => Some(
                raw.to_str()
                    .map_err(|_| {
                        HttpError::from_error(ApplicationError::invalid_request(
                            "Authorization header is not valid ASCII",
                        ))
                    })?
                    .to_string(),
            ),
        };
        Ok(Self(value))
    }
}

/// Client credentials presented with HTTP Basic authentication, if any.
#[derive(Debug, Clone, Default)]
pub struct BasicClientCredentials(pub Option<(String, String)>);

impl<S> FromRequestParts<S> for BasicClientCredentials
where
    S: Send + Sync,
{
    type Rejection = HttpError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let credentials = parts
            .headers
            .typed_get::<Authorization<Basic>>()
            .map(|auth| (auth.username().to_string(), auth.password().to_string()));
        Ok(Self(credentials))
    }
}
