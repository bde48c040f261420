// src/application/error.rs
use crate::domain::errors::DomainError;
use thiserror::Error;

pub type ApplicationResult<T> = Result<T, ApplicationError>;

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid client: {0}")]
    InvalidClient(String),

    #[error("invalid grant: {0}")]
    InvalidGrant(String),

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("internal failure: {0}")]
    Internal(String),
}

impl ApplicationError {
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub fn invalid_client(msg: impl Into<String>) -> Self {
        Self::InvalidClient(msg.into())
    }

    pub fn invalid_grant(msg: impl Into<String>) -> Self {
        Self::InvalidGrant(msg.into())
    }

    pub fn invalid_token(msg: impl Into<String>) -> Self {
        Self::InvalidToken(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
