mod authorize;
mod exchange;
mod service;

pub use authorize::{AuthorizeOutcome, LOGIN_PATH};
pub use exchange::{AUTHORIZATION_CODE_GRANT, TokenExchangeCommand};
pub use service::{GrantLifetimes, OAuthCommandService};
