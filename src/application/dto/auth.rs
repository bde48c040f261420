// src/application/dto/auth.rs
use crate::application::error::{ApplicationError, ApplicationResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Claims carried by a signed access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessClaims {
    pub token_id: String,
    pub subject: String,
    pub audience: String,
    pub scope: Option<String>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AccessClaims {
    pub fn new(
        token_id: impl Into<String>,
        subject: impl Into<String>,
        audience: impl Into<String>,
        scope: Option<String>,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> ApplicationResult<Self> {
        let token_id = token_id.into();
        let subject = subject.into();
        let audience = audience.into();
        if token_id.is_empty() || subject.is_empty() || audience.is_empty() {
            return Err(ApplicationError::internal(
                "access claims need a token id, subject and audience",
            ));
        }
        if expires_at <= issued_at {
            return Err(ApplicationError::internal("access claims expire before issue"));
        }
        Ok(Self {
            token_id,
            subject,
            audience,
            scope,
            issued_at,
            expires_at,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenResponseDto {
    pub access_token: String,
    /// Always `bearer`.
    pub token_type: String,
    pub expires_in: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// Result of validating a bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfoDto {
    pub user_id: String,
    pub client_id: String,
    pub scope: Option<String>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub expires_in: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserInfoDto {
    pub expires_in: i64,
    pub client_id: String,
    pub user_id: String,
    pub id: String,
    pub name: String,
    pub email: String,
}
