use crate::application::{ApplicationResult, dto::AccessClaims};
use async_trait::async_trait;

#[async_trait]
pub trait TokenManager: Send + Sync {
    /// Signs the claims into an opaque bearer string.
    async fn issue(&self, claims: &AccessClaims) -> ApplicationResult<String>;
    /// Verifies signature and expiry. Failures are `ApplicationError::InvalidToken`.
    async fn authenticate(&self, token: &str) -> ApplicationResult<AccessClaims>;
}
