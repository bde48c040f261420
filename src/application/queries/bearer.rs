// src/application/queries/bearer.rs
use std::sync::Arc;

use crate::{
    application::{
        dto::{TokenInfoDto, UserInfoDto},
        error::{ApplicationError, ApplicationResult},
        ports::{security::TokenManager, time::Clock},
    },
    domain::{oauth::TokenStore, user::UserDirectory},
};

/// Resolves `Authorization: Bearer` headers on protected endpoints.
pub struct BearerValidator {
    tokens: Arc<dyn TokenStore>,
    token_manager: Arc<dyn TokenManager>,
    users: Arc<dyn UserDirectory>,
    clock: Arc<dyn Clock>,
}

impl BearerValidator {
    pub fn new(
        tokens: Arc<dyn TokenStore>,
        token_manager: Arc<dyn TokenManager>,
        users: Arc<dyn UserDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            tokens,
            token_manager,
            users,
            clock,
        }
    }

    pub async fn validate(&self, authorization: Option<&str>) -> ApplicationResult<TokenInfoDto> {
        let token = parse_bearer(authorization)?;
        let claims = self.token_manager.authenticate(token).await?;

        let record = self
            .tokens
            .find_token(token)
            .await?
            .ok_or_else(|| ApplicationError::invalid_token("token is not recognised"))?;

        let now = self.clock.now();
        if record.is_expired(now) {
            return Err(ApplicationError::invalid_token("token expired"));
        }
        if record.user_id != claims.subject || record.client_id != claims.audience {
            tracing::warn!(token_id = %claims.token_id, "stored token disagrees with its claims");
            return Err(ApplicationError::invalid_token("token does not match its record"));
        }

        Ok(TokenInfoDto {
            user_id: record.user_id,
            client_id: record.client_id,
            scope: record.scope,
            issued_at: claims.issued_at,
            expires_at: record.expires_at,
            expires_in: (record.expires_at - now).num_seconds().max(0),
        })
    }

    pub async fn user_info(&self, authorization: Option<&str>) -> ApplicationResult<UserInfoDto> {
        let info = self.validate(authorization).await?;
        let identity = self
            .users
            .get_user(&info.user_id)
            .await?
            .ok_or_else(|| ApplicationError::invalid_token("token subject is unknown"))?;

        Ok(UserInfoDto {
            expires_in: info.expires_in,
            client_id: info.client_id,
            user_id: info.user_id.clone(),
            id: info.user_id,
            name: identity.name,
            email: identity.email,
        })
    }
}

/// Extracts the token from `Bearer <token>`. The scheme is case-insensitive.
pub fn parse_bearer(header: Option<&str>) -> ApplicationResult<&str> {
    let header = header.ok_or_else(|| ApplicationError::invalid_request("missing Authorization header"))?;
    let (scheme, token) = header
        .trim()
        .split_once(' ')
        .ok_or_else(|| ApplicationError::invalid_request("malformed Authorization header"))?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(ApplicationError::invalid_request(
            "Authorization header must use the Bearer scheme",
        ));
    }
    if token.is_empty() || token.contains(char::is_whitespace) {
        return Err(ApplicationError::invalid_request("malformed bearer token"));
    }
    Ok(token)
}
