// src/domain/user/mod.rs
pub mod entity;
pub mod repository;

pub use entity::UserIdentity;
pub use repository::UserDirectory;
