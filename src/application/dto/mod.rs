pub mod auth;
pub mod form;

pub use auth::{AccessClaims, TokenInfoDto, TokenResponseDto, UserInfoDto};
pub use form::FormFields;
