use std::sync::Arc;

use chrono::Duration;

use crate::application::ports::{security::TokenManager, time::Clock, util::SecretGenerator};
use crate::domain::{client::ClientRegistry, oauth::TokenStore};

#[derive(Debug, Clone, Copy)]
pub struct GrantLifetimes {
    pub code_ttl: Duration,
    pub token_ttl: Duration,
}

impl Default for GrantLifetimes {
    fn default() -> Self {
        Self {
            code_ttl: Duration::minutes(10),
            token_ttl: Duration::hours(1),
        }
    }
}

/// Authorization endpoint and token endpoint logic.
pub struct OAuthCommandService {
    pub(super) clients: Arc<dyn ClientRegistry>,
    pub(super) tokens: Arc<dyn TokenStore>,
    pub(super) token_manager: Arc<dyn TokenManager>,
    pub(super) secrets: Arc<dyn SecretGenerator>,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) lifetimes: GrantLifetimes,
}

impl OAuthCommandService {
    pub fn new(
        clients: Arc<dyn ClientRegistry>,
        tokens: Arc<dyn TokenStore>,
        token_manager: Arc<dyn TokenManager>,
        secrets: Arc<dyn SecretGenerator>,
        clock: Arc<dyn Clock>,
        lifetimes: GrantLifetimes,
    ) -> Self {
        Self {
            clients,
            tokens,
            token_manager,
            secrets,
            clock,
            lifetimes,
        }
    }
}
