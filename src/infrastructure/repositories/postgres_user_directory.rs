use super::map_sqlx;
use crate::domain::errors::DomainResult;
use crate::domain::user::{UserDirectory, UserIdentity};
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

/// Read-only view over the `users` table maintained by the account service.
#[derive(Clone)]
pub struct PostgresUserDirectory {
    pool: PgPool,
}

impl PostgresUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    email: String,
    name: String,
}

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    async fn get_user(&self, email: &str) -> DomainResult<Option<UserIdentity>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT email, name FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;

        row.map(|row| UserIdentity::new(row.email, row.name)).transpose()
    }
}
