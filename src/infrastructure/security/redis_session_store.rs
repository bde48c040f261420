// src/infrastructure/security/redis_session_store.rs
use crate::application::ApplicationResult;
use crate::application::error::ApplicationError;
use crate::application::ports::session::{SessionRecord, SessionRepository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_redis::{Config as DeadpoolConfig, Connection, Pool, Runtime};
use redis::AsyncCommands;

const KEY_PREFIX: &str = "hpt:session:";

/// Sessions as JSON strings whose Redis expiry tracks `expires_at`, so no sweep is needed.
#[derive(Clone)]
pub struct RedisSessionRepository {
    pool: Pool,
}

impl RedisSessionRepository {
    /// Create a new Redis backed session store from a redis URL (e.g. redis://:password@host:6379/0)
    pub fn from_url(url: &str) -> Result<Self, ApplicationError> {
        let cfg = DeadpoolConfig::from_url(url);
        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|err| ApplicationError::internal(err.to_string()))?;

        Ok(Self { pool })
    }

    async fn connection(&self) -> ApplicationResult<Connection> {
        self.pool
            .get()
            .await
            .map_err(|err| ApplicationError::internal(err.to_string()))
    }
}

fn key(id: &str) -> String {
    format!("{KEY_PREFIX}{id}")
}

#[async_trait]
impl SessionRepository for RedisSessionRepository {
    async fn load(&self, id: &str) -> ApplicationResult<Option<SessionRecord>> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn
            .get(key(id))
            .await
            .map_err(|err| ApplicationError::internal(err.to_string()))?;

        raw.map(|json| {
            serde_json::from_str(&json)
                .map_err(|err| ApplicationError::internal(format!("corrupt session record: {err}")))
        })
        .transpose()
    }

    async fn store(&self, record: &SessionRecord) -> ApplicationResult<()> {
        let json = serde_json::to_string(record)
            .map_err(|err| ApplicationError::internal(err.to_string()))?;
        let mut conn = self.connection().await?;

        // EXAT keeps the Redis expiry identical to the record's own deadline
        let _: () = redis::cmd("SET")
            .arg(key(&record.id))
            .arg(json)
            .arg("EXAT")
            .arg(record.expires_at.timestamp().max(1))
            .query_async(&mut conn)
            .await
            .map_err(|err| ApplicationError::internal(err.to_string()))?;
        Ok(())
    }

    async fn purge_expired(&self, _now: DateTime<Utc>) -> ApplicationResult<u64> {
        Ok(0)
    }
}
