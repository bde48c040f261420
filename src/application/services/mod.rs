// src/application/services/mod.rs
pub mod session;

use std::{sync::Arc, time::Duration};

use crate::{
    application::{
        commands::oauth::{GrantLifetimes, OAuthCommandService},
        ports::{
            security::TokenManager, session::SessionRepository, time::Clock,
            util::SecretGenerator,
        },
        queries::bearer::BearerValidator,
    },
    domain::{client::ClientRegistry, oauth::TokenStore, user::UserDirectory},
};

use self::session::SessionStore;

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub lifetimes: GrantLifetimes,
    pub session_ttl: Duration,
    pub session_signing_key: Vec<u8>,
}

pub struct ApplicationServices {
    pub oauth_commands: Arc<OAuthCommandService>,
    pub bearer_validator: Arc<BearerValidator>,
    pub sessions: Arc<SessionStore>,
    clients: Arc<dyn ClientRegistry>,
    token_store: Arc<dyn TokenStore>,
    session_repository: Arc<dyn SessionRepository>,
}

impl ApplicationServices {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        clients: Arc<dyn ClientRegistry>,
        token_store: Arc<dyn TokenStore>,
        users: Arc<dyn UserDirectory>,
        session_repository: Arc<dyn SessionRepository>,
        token_manager: Arc<dyn TokenManager>,
        secrets: Arc<dyn SecretGenerator>,
        clock: Arc<dyn Clock>,
        settings: ServiceSettings,
    ) -> Self {
        let oauth_commands = Arc::new(OAuthCommandService::new(
            Arc::clone(&clients),
            Arc::clone(&token_store),
            Arc::clone(&token_manager),
            Arc::clone(&secrets),
            Arc::clone(&clock),
            settings.lifetimes,
        ));

        let bearer_validator = Arc::new(BearerValidator::new(
            Arc::clone(&token_store),
            Arc::clone(&token_manager),
            users,
            Arc::clone(&clock),
        ));

        let sessions = Arc::new(SessionStore::new(
            Arc::clone(&session_repository),
            clock,
            secrets,
            settings.session_signing_key,
            settings.session_ttl,
        ));

        Self {
            oauth_commands,
            bearer_validator,
            sessions,
            clients,
            token_store,
            session_repository,
        }
    }

    pub fn clients(&self) -> Arc<dyn ClientRegistry> {
        Arc::clone(&self.clients)
    }

    pub fn token_store(&self) -> Arc<dyn TokenStore> {
        Arc::clone(&self.token_store)
    }

    pub fn session_repository(&self) -> Arc<dyn SessionRepository> {
        Arc::clone(&self.session_repository)
    }
}
