// src/infrastructure/repositories/mod.rs
mod error;
mod in_memory;
mod postgres_client;
mod postgres_token_store;
mod postgres_user_directory;

pub use error::map_sqlx;
pub use in_memory::{InMemoryClientRegistry, InMemoryUserDirectory};
pub use postgres_client::PostgresClientRegistry;
pub use postgres_token_store::PostgresTokenStore;
pub use postgres_user_directory::PostgresUserDirectory;
