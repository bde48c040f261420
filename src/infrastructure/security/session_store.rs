// src/infrastructure/security/session_store.rs
use crate::application::ApplicationResult;
use crate::application::error::ApplicationError;
use crate::application::ports::session::{SessionRecord, SessionRepository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
pub struct InMemorySessionRepository {
    records: Mutex<HashMap<String, SessionRecord>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn records(&self) -> ApplicationResult<MutexGuard<'_, HashMap<String, SessionRecord>>> {
        self.records
            .lock()
            .map_err(|_| ApplicationError::internal("session map poisoned"))
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn load(&self, id: &str) -> ApplicationResult<Option<SessionRecord>> {
        Ok(self.records()?.get(id).cloned())
    }

    async fn store(&self, record: &SessionRecord) -> ApplicationResult<()> {
        self.records()?.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> ApplicationResult<u64> {
        let mut records = self.records()?;
        let before = records.len();
        records.retain(|_, record| record.expires_at > now);
        Ok((before - records.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::collections::BTreeMap;

    fn record(id: &str, expires_at: DateTime<Utc>) -> SessionRecord {
        SessionRecord {
            id: id.to_string(),
            values: BTreeMap::new(),
            expires_at,
        }
    }

    #[tokio::test]
    async fn purge_drops_only_expired_records() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let repo = InMemorySessionRepository::new();
        repo.store(&record("old", now - Duration::seconds(1))).await.unwrap();
        repo.store(&record("live", now + Duration::hours(1))).await.unwrap();

        assert_eq!(repo.purge_expired(now).await.unwrap(), 1);
        assert!(repo.load("old").await.unwrap().is_none());
        assert!(repo.load("live").await.unwrap().is_some());
        assert_eq!(repo.len(), 1);
    }
}
