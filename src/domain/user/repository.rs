use crate::domain::errors::DomainResult;
use crate::domain::user::entity::UserIdentity;
use async_trait::async_trait;

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn get_user(&self, email: &str) -> DomainResult<Option<UserIdentity>>;
}
