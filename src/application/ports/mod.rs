// src/application/ports/mod.rs
pub mod security;
pub mod session;
pub mod time;
pub mod util;
