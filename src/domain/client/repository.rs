use crate::domain::client::entity::Client;
use crate::domain::errors::DomainResult;
use async_trait::async_trait;

#[async_trait]
pub trait ClientRegistry: Send + Sync {
    /// Registers a new client. An id that is already taken yields `DomainError::Conflict`.
    async fn register(&self, client: Client) -> DomainResult<()>;

    async fn find_by_id(&self, client_id: &str) -> DomainResult<Option<Client>>;
}
