// src/domain/oauth/mod.rs
pub mod access_token;
pub mod authorization_code;
pub mod pkce;
pub mod repository;

pub use access_token::AccessToken;
pub use authorization_code::AuthorizationCode;
pub use pkce::{CodeChallengeMethod, PkceChallenge};
pub use repository::{PurgeStats, TokenStore};
