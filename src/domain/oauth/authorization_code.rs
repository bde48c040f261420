// src/domain/oauth/authorization_code.rs
use crate::domain::oauth::pkce::PkceChallenge;
use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationCode {
    pub code: String,
    pub client_id: String,
    pub user_id: String,
    pub redirect_uri: String,
    pub challenge: Option<PkceChallenge>,
    pub scope: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
}

/// Everything an authorize request binds into a code.
#[derive(Debug, Clone)]
pub struct CodeGrant {
    pub client_id: String,
    pub user_id: String,
    pub redirect_uri: String,
    pub challenge: Option<PkceChallenge>,
    pub scope: Option<String>,
}

impl AuthorizationCode {
    pub fn issue(code: String, grant: CodeGrant, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            code,
            client_id: grant.client_id,
            user_id: grant.user_id,
            redirect_uri: grant.redirect_uri,
            challenge: grant.challenge,
            scope: grant.scope,
            created_at: now,
            expires_at: now + ttl,
            used: false,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
