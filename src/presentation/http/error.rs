// src/presentation/http/error.rs
use crate::application::{ApplicationResult, error::ApplicationError};
use crate::domain::errors::DomainError;
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// An error in the OAuth2 wire format.
#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    code: &'static str,
    description: String,
}

impl HttpError {
    pub fn from_error(err: ApplicationError) -> Self {
        match err {
            ApplicationError::InvalidRequest(msg)
            | ApplicationError::Domain(DomainError::Validation(msg)) => {
                Self::new(StatusCode::BAD_REQUEST, "invalid_request", msg)
            }
            ApplicationError::InvalidClient(msg) => {
                Self::new(StatusCode::BAD_REQUEST, "invalid_client", msg)
            }
            ApplicationError::InvalidGrant(msg) => {
                Self::new(StatusCode::BAD_REQUEST, "invalid_grant", msg)
            }
            ApplicationError::InvalidToken(msg) => {
                Self::new(StatusCode::UNAUTHORIZED, "invalid_token", msg)
            }
            ApplicationError::Internal(msg) => Self::internal(msg),
            ApplicationError::Domain(domain_err) => Self::internal(domain_err.to_string()),
        }
    }

    fn internal(cause: String) -> Self {
        tracing::error!(error = %cause, "request failed with an internal error");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "server_error",
            "internal server error".to_string(),
        )
    }

    fn new(status: StatusCode, code: &'static str, description: String) -> Self {
        Self {
            status,
            code,
            description,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let payload = ErrorResponse {
            error: self.code.to_string(),
            error_description: self.description,
        };
        let mut response = (self.status, Json(payload)).into_response();
        if self.status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static(r#"Bearer error="invalid_token""#),
            );
        }
        response
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// `invalid_request`, `invalid_client`, `invalid_grant`, `invalid_token` or `server_error`.
    pub error: String,
    pub error_description: String,
}

pub type HttpResult<T> = Result<T, HttpError>;

pub trait IntoHttpResult<T> {
    fn into_http(self) -> HttpResult<T>;
}

impl<T> IntoHttpResult<T> for ApplicationResult<T> {
    fn into_http(self) -> HttpResult<T> {
        self.map_err(HttpError::from_error)
    }
}
