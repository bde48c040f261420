use super::map_sqlx;
use crate::domain::client::{Client, ClientRegistry};
use crate::domain::errors::{DomainError, DomainResult};
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

#[derive(Clone)]
pub struct PostgresClientRegistry {
    pool: PgPool,
}

impl PostgresClientRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ClientRow {
    id: String,
    secret: String,
    redirect_domain: String,
}

impl TryFrom<ClientRow> for Client {
    type Error = DomainError;

    fn try_from(row: ClientRow) -> Result<Self, Self::Error> {
        Client::new(row.id, row.secret, row.redirect_domain)
    }
}

#[async_trait]
impl ClientRegistry for PostgresClientRegistry {
    async fn register(&self, client: Client) -> DomainResult<()> {
        sqlx::query("INSERT INTO clients (id, secret, redirect_domain) VALUES ($1, $2, $3)")
            .bind(client.id())
            .bind(client.secret())
            .bind(client.redirect_domain())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }

    async fn find_by_id(&self, client_id: &str) -> DomainResult<Option<Client>> {
        let row = sqlx::query_as::<_, ClientRow>(
            "SELECT id, secret, redirect_domain FROM clients WHERE id = $1",
        )
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        row.map(Client::try_from).transpose()
    }
}
