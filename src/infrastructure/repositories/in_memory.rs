// src/infrastructure/repositories/in_memory.rs
use crate::domain::client::{Client, ClientRegistry};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::user::{UserDirectory, UserIdentity};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Default)]
pub struct InMemoryClientRegistry {
    clients: RwLock<HashMap<String, Client>>,
}

impl InMemoryClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClientRegistry for InMemoryClientRegistry {
    async fn register(&self, client: Client) -> DomainResult<()> {
        let mut clients = self
            .clients
            .write()
            .map_err(|_| DomainError::persistence("client registry poisoned"))?;
        if clients.contains_key(client.id()) {
            return Err(DomainError::Conflict(format!(
                "client '{}' already registered",
                client.id()
            )));
        }
        clients.insert(client.id().to_string(), client);
        Ok(())
    }

    async fn find_by_id(&self, client_id: &str) -> DomainResult<Option<Client>> {
        let clients = self
            .clients
            .read()
            .map_err(|_| DomainError::persistence("client registry poisoned"))?;
        Ok(clients.get(client_id).cloned())
    }
}

/// Directory backed by a map, keyed by email.
#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<String, UserIdentity>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: impl IntoIterator<Item = UserIdentity>) -> Self {
        let users = users
            .into_iter()
            .map(|user| (user.email.clone(), user))
            .collect();
        Self {
            users: RwLock::new(users),
        }
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn get_user(&self, email: &str) -> DomainResult<Option<UserIdentity>> {
        let users = self
            .users
            .read()
            .map_err(|_| DomainError::persistence("user directory poisoned"))?;
        Ok(users.get(email).cloned())
    }
}
