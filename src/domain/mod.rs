pub mod client;
pub mod errors;
pub mod oauth;
pub mod secret;
pub mod user;
