// src/domain/client/mod.rs
pub mod entity;
pub mod repository;

pub use entity::Client;
pub use repository::ClientRegistry;
