// src/infrastructure/repositories/postgres_token_store.rs
use super::map_sqlx;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::oauth::{
    AccessToken, AuthorizationCode, CodeChallengeMethod, PkceChallenge, PurgeStats, TokenStore,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

#[derive(Clone)]
pub struct PostgresTokenStore {
    pool: PgPool,
}

impl PostgresTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs a batched `DELETE` until a batch comes back short.
    async fn purge_in_batches(
        &self,
        statement: &'static str,
        now: DateTime<Utc>,
        batch_size: u32,
    ) -> DomainResult<u64> {
        let mut total = 0;
        loop {
            let deleted = sqlx::query(statement)
                .bind(now)
                .bind(i64::from(batch_size))
                .execute(&self.pool)
                .await
                .map_err(map_sqlx)?
                .rows_affected();
            total += deleted;
            if deleted < u64::from(batch_size) {
                return Ok(total);
            }
        }
    }
}

const PURGE_CODES: &str = "DELETE FROM authorization_codes WHERE code IN \
     (SELECT code FROM authorization_codes WHERE expires_at < $1 LIMIT $2)";
const PURGE_TOKENS: &str = "DELETE FROM tokens WHERE access_token IN \
     (SELECT access_token FROM tokens WHERE expires_at < $1 LIMIT $2)";

#[derive(Debug, FromRow)]
struct AuthorizationCodeRow {
    code: String,
    client_id: String,
    user_id: String,
    redirect_uri: String,
    code_challenge: Option<String>,
    code_challenge_method: Option<String>,
    scope: Option<String>,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    used: bool,
}

impl TryFrom<AuthorizationCodeRow> for AuthorizationCode {
    type Error = DomainError;

    fn try_from(row: AuthorizationCodeRow) -> Result<Self, Self::Error> {
        let challenge = match (row.code_challenge, row.code_challenge_method) {
            (Some(challenge), Some(method)) => Some(
                method
                    .parse::<CodeChallengeMethod>()
                    .and_then(|method| PkceChallenge::new(challenge, method))
                    .map_err(|err| {
                        DomainError::persistence(format!("stored authorization code: {err}"))
                    })?,
            ),
            (None, None) => None,
            _ => {
                return Err(DomainError::persistence(
                    "authorization code has half a PKCE challenge",
                ));
            }
        };
        Ok(AuthorizationCode {
            code: row.code,
            client_id: row.client_id,
            user_id: row.user_id,
            redirect_uri: row.redirect_uri,
            challenge,
            scope: row.scope,
            created_at: row.created_at,
            expires_at: row.expires_at,
            used: row.used,
        })
    }
}

#[derive(Debug, FromRow)]
struct TokenRow {
    access_token: String,
    client_id: String,
    user_id: String,
    scope: Option<String>,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl From<TokenRow> for AccessToken {
    fn from(row: TokenRow) -> Self {
        AccessToken {
            access_token: row.access_token,
            client_id: row.client_id,
            user_id: row.user_id,
            scope: row.scope,
            created_at: row.created_at,
            expires_at: row.expires_at,
        }
    }
}

#[async_trait]
impl TokenStore for PostgresTokenStore {
    async fn insert_code(&self, code: AuthorizationCode) -> DomainResult<()> {
        let (challenge, method) = match &code.challenge {
            Some(c) => (Some(c.challenge()), Some(c.method().as_str())),
            None => (None, None),
        };
        sqlx::query(
            "INSERT INTO authorization_codes \
             (code, client_id, user_id, redirect_uri, code_challenge, code_challenge_method, \
              scope, created_at, expires_at, used) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(&code.code)
        .bind(&code.client_id)
        .bind(&code.user_id)
        .bind(&code.redirect_uri)
        .bind(challenge)
        .bind(method)
        .bind(&code.scope)
        .bind(code.created_at)
        .bind(code.expires_at)
        .bind(code.used)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn find_code(&self, code: &str) -> DomainResult<Option<AuthorizationCode>> {
        let row = sqlx::query_as::<_, AuthorizationCodeRow>(
            "SELECT code, client_id, user_id, redirect_uri, code_challenge, \
             code_challenge_method, scope, created_at, expires_at, used \
             FROM authorization_codes WHERE code = $1",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        row.map(AuthorizationCode::try_from).transpose()
    }

    async fn consume_code(&self, code: &str, now: DateTime<Utc>) -> DomainResult<bool> {
        let result = sqlx::query(
            "UPDATE authorization_codes SET used = TRUE \
             WHERE code = $1 AND used = FALSE AND expires_at > $2",
        )
        .bind(code)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete_code(&self, code: &str) -> DomainResult<()> {
        sqlx::query("DELETE FROM authorization_codes WHERE code = $1")
            .bind(code)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }

    async fn insert_token(&self, token: AccessToken) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO tokens (access_token, client_id, user_id, scope, created_at, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&token.access_token)
        .bind(&token.client_id)
        .bind(&token.user_id)
        .bind(&token.scope)
        .bind(token.created_at)
        .bind(token.expires_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn find_token(&self, access_token: &str) -> DomainResult<Option<AccessToken>> {
        let row = sqlx::query_as::<_, TokenRow>(
            "SELECT access_token, client_id, user_id, scope, created_at, expires_at \
             FROM tokens WHERE access_token = $1",
        )
        .bind(access_token)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(row.map(AccessToken::from))
    }

    async fn purge_expired(&self, now: DateTime<Utc>, batch_size: u32) -> DomainResult<PurgeStats> {
        let batch_size = batch_size.max(1);
        let codes = self.purge_in_batches(PURGE_CODES, now, batch_size).await?;
        let tokens = self.purge_in_batches(PURGE_TOKENS, now, batch_size).await?;
        Ok(PurgeStats { codes, tokens })
    }
}
