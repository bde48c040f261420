// src/infrastructure/security/token_store.rs
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::oauth::{AccessToken, AuthorizationCode, PurgeStats, TokenStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Tables {
    codes: HashMap<String, AuthorizationCode>,
    tokens: HashMap<String, AccessToken>,
}

/// Process-local token store. Every operation runs inside one critical section, which
/// is what makes `consume_code` atomic.
#[derive(Default)]
pub struct InMemoryTokenStore {
    inner: Mutex<Tables>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn code_count(&self) -> usize {
        self.inner.lock().map(|t| t.codes.len()).unwrap_or(0)
    }

    pub fn token_count(&self) -> usize {
        self.inner.lock().map(|t| t.tokens.len()).unwrap_or(0)
    }

    fn tables(&self) -> DomainResult<MutexGuard<'_, Tables>> {
        self.inner
            .lock()
            .map_err(|_| DomainError::persistence("token store poisoned"))
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn insert_code(&self, code: AuthorizationCode) -> DomainResult<()> {
        let mut tables = self.tables()?;
        if tables.codes.contains_key(&code.code) {
            return Err(DomainError::Conflict("authorization code already exists".into()));
        }
        tables.codes.insert(code.code.clone(), code);
        Ok(())
    }

    async fn find_code(&self, code: &str) -> DomainResult<Option<AuthorizationCode>> {
        Ok(self.tables()?.codes.get(code).cloned())
    }

    async fn consume_code(&self, code: &str, now: DateTime<Utc>) -> DomainResult<bool> {
        let mut tables = self.tables()?;
        match tables.codes.get_mut(code) {
            Some(entry) if !entry.used && entry.expires_at > now => {
                entry.used = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_code(&self, code: &str) -> DomainResult<()> {
        self.tables()?.codes.remove(code);
        Ok(())
    }

    async fn insert_token(&self, token: AccessToken) -> DomainResult<()> {
        let mut tables = self.tables()?;
        if tables.tokens.contains_key(&token.access_token) {
            return Err(DomainError::Conflict("access token already exists".into()));
        }
        tables.tokens.insert(token.access_token.clone(), token);
        Ok(())
    }

    async fn find_token(&self, access_token: &str) -> DomainResult<Option<AccessToken>> {
        Ok(self.tables()?.tokens.get(access_token).cloned())
    }

    async fn purge_expired(&self, now: DateTime<Utc>, _batch_size: u32) -> DomainResult<PurgeStats> {
        let mut tables = self.tables()?;
        let (codes_before, tokens_before) = (tables.codes.len(), tables.tokens.len());
        tables.codes.retain(|_, code| code.expires_at >= now);
        tables.tokens.retain(|_, token| token.expires_at >= now);
        Ok(PurgeStats {
            codes: (codes_before - tables.codes.len()) as u64,
            tokens: (tokens_before - tables.tokens.len()) as u64,
        })
    }
}
