// src/domain/oauth/repository.rs
use crate::domain::errors::DomainResult;
use crate::domain::oauth::{access_token::AccessToken, authorization_code::AuthorizationCode};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeStats {
    pub codes: u64,
    pub tokens: u64,
}

#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Inserts a freshly issued code. An existing code yields `DomainError::Conflict`.
    async fn insert_code(&self, code: AuthorizationCode) -> DomainResult<()>;

    async fn find_code(&self, code: &str) -> DomainResult<Option<AuthorizationCode>>;

    /// Flips `used` from false to true if the code is unused and `expires_at > now`.
    /// Returns `true` only for the caller that performed the transition.
    async fn consume_code(&self, code: &str, now: DateTime<Utc>) -> DomainResult<bool>;

    async fn delete_code(&self, code: &str) -> DomainResult<()>;

    async fn insert_token(&self, token: AccessToken) -> DomainResult<()>;

    async fn find_token(&self, access_token: &str) -> DomainResult<Option<AccessToken>>;

    /// Deletes codes and tokens with `expires_at < now`, at most `batch_size` rows per
    /// statement.
    async fn purge_expired(&self, now: DateTime<Utc>, batch_size: u32) -> DomainResult<PurgeStats>;
}
